//! Triage training binary.

use anyhow::Context;

use triage::cli::args::*;
use triage::cli::commands::*;
use triage::cli::init_logging;

fn main() -> anyhow::Result<()> {
    let args = match parse_train_args(std::env::args_os()) {
        TrainInvocation::Run(args) => args,
        TrainInvocation::Usage => {
            println!("{TRAIN_USAGE}");
            return Ok(());
        }
        TrainInvocation::Exit(e) => e.exit(),
    };

    init_logging(args.verbosity());

    execute_train(&args).with_context(|| {
        format!(
            "failed to train a model from {}",
            args.database.display()
        )
    })?;
    Ok(())
}
