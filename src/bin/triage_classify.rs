//! Classify messages with a model written by `triage`.

use anyhow::Context;
use clap::Parser;
use triage::cli::args::ClassifyArgs;
use triage::cli::commands::execute_classify;
use triage::cli::init_logging;

fn main() -> anyhow::Result<()> {
    let args = ClassifyArgs::parse();

    init_logging(args.verbosity());

    execute_classify(&args)
        .with_context(|| format!("failed to classify with {}", args.model.display()))?;
    Ok(())
}
