//! Command line argument parsing for the Triage binaries using clap.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;
use crate::error::Result;

/// Guidance printed when the positional arguments are missing or extra.
pub const TRAIN_USAGE: &str = "Please provide the filepath of the disaster messages database \
as the first argument and the filepath of the model file to save the model to as the second \
argument. \n\nExample: triage ../data/DisasterResponse.db classifier.model";

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Stage lines and plain-text reports
    #[default]
    Human,
    /// A single JSON document
    Json,
}

/// Triage - train a multi-label disaster message classifier
#[derive(Parser, Debug, Clone)]
#[command(name = "triage")]
#[command(about = "Train a multi-label disaster message classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct TrainArgs {
    /// SQLite database (or .csv file) with the labeled messages
    #[arg(value_name = "DATABASE")]
    pub database: PathBuf,

    /// Where to write the trained model
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Training configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Seed for the split and the forests
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fraction of messages held out for evaluation
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Cross-validation folds per grid point
    #[arg(long)]
    pub cv_folds: Option<usize>,

    /// Trees per forest
    #[arg(long)]
    pub n_estimators: Option<usize>,

    /// Worker threads (defaults to one per CPU)
    #[arg(short, long, env = "TRIAGE_JOBS")]
    pub jobs: Option<usize>,

    /// SQLite table holding the messages
    #[arg(long)]
    pub table: Option<String>,

    /// Name of the message text column
    #[arg(long)]
    pub text_column: Option<String>,

    /// Index of the first label column
    #[arg(long)]
    pub label_offset: Option<usize>,
}

impl TrainArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        verbosity(self.verbose, self.quiet)
    }

    /// The configuration file (or defaults) with flag overrides applied.
    pub fn training_config(&self) -> Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::from_file(path)?,
            None => TrainingConfig::default(),
        };

        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(test_size) = self.test_size {
            config.test_size = test_size;
        }
        if let Some(cv_folds) = self.cv_folds {
            config.cv_folds = cv_folds;
        }
        if let Some(n_estimators) = self.n_estimators {
            config.forest.n_estimators = n_estimators;
        }
        if self.jobs.is_some() {
            config.jobs = self.jobs;
        }
        if let Some(table) = &self.table {
            config.corpus.table = table.clone();
        }
        if let Some(text_column) = &self.text_column {
            config.corpus.text_column = text_column.clone();
        }
        if let Some(label_offset) = self.label_offset {
            config.corpus.label_offset = label_offset;
        }
        Ok(config)
    }
}

/// Triage classify - label messages with a trained model
#[derive(Parser, Debug, Clone)]
#[command(name = "triage-classify")]
#[command(about = "Predict the categories of messages with a trained model")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct ClassifyArgs {
    /// Model file written by `triage`
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Messages to classify
    #[arg(value_name = "MESSAGE", required = true)]
    pub messages: Vec<String>,

    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,
}

impl ClassifyArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        verbosity(self.verbose, self.quiet)
    }
}

fn verbosity(verbose: u8, quiet: bool) -> u8 {
    if quiet {
        0
    } else {
        match verbose {
            0 => 1, // Default to normal
            n => n,
        }
    }
}

/// What the training binary should do with its command line.
#[derive(Debug)]
pub enum TrainInvocation {
    /// Arguments are well formed.
    Run(Box<TrainArgs>),
    /// Positional arguments are missing or extra: print [`TRAIN_USAGE`].
    Usage,
    /// Help, version, or a malformed flag: let clap report it.
    Exit(clap::Error),
}

/// Parse the training command line.
pub fn parse_train_args<I, T>(args: I) -> TrainInvocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match TrainArgs::try_parse_from(args) {
        Ok(args) => TrainInvocation::Run(Box::new(args)),
        Err(e) => match e.kind() {
            ErrorKind::MissingRequiredArgument | ErrorKind::UnknownArgument => {
                TrainInvocation::Usage
            }
            _ => TrainInvocation::Exit(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> TrainArgs {
        match parse_train_args(args.iter().copied()) {
            TrainInvocation::Run(args) => *args,
            other => panic!("expected a run, got {other:?}"),
        }
    }

    #[test]
    fn test_positional_arguments() {
        let args = run(&["triage", "data/DisasterResponse.db", "classifier.model"]);
        assert_eq!(args.database, PathBuf::from("data/DisasterResponse.db"));
        assert_eq!(args.model, PathBuf::from("classifier.model"));
        assert_eq!(args.output_format, OutputFormat::Human);
        assert_eq!(args.verbosity(), 1);
    }

    #[test]
    fn test_missing_or_extra_positionals_print_usage() {
        assert!(matches!(parse_train_args(["triage"]), TrainInvocation::Usage));
        assert!(matches!(
            parse_train_args(["triage", "db.sqlite"]),
            TrainInvocation::Usage
        ));
        assert!(matches!(
            parse_train_args(["triage", "a.db", "b.model", "c"]),
            TrainInvocation::Usage
        ));
    }

    #[test]
    fn test_help_is_left_to_clap() {
        assert!(matches!(
            parse_train_args(["triage", "--help"]),
            TrainInvocation::Exit(_)
        ));
        assert!(matches!(
            parse_train_args(["triage", "a.db", "b.model", "--seed", "abc"]),
            TrainInvocation::Exit(_)
        ));
    }

    #[test]
    fn test_flag_overrides() {
        let args = run(&[
            "triage",
            "a.csv",
            "b.model",
            "--seed",
            "7",
            "--test-size",
            "0.3",
            "--cv-folds",
            "3",
            "--n-estimators",
            "20",
            "--table",
            "messages",
            "--label-offset",
            "2",
            "--format",
            "json",
            "-vv",
        ]);
        assert_eq!(args.verbosity(), 2);
        assert_eq!(args.output_format, OutputFormat::Json);

        let config = args.training_config().unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.test_size, 0.3);
        assert_eq!(config.cv_folds, 3);
        assert_eq!(config.forest.n_estimators, 20);
        assert_eq!(config.corpus.table, "messages");
        assert_eq!(config.corpus.label_offset, 2);
        assert_eq!(config.corpus.text_column, "message");
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let args = run(&["triage", "a.db", "b.model", "-q", "-vvv"]);
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_classify_args() {
        let args = ClassifyArgs::try_parse_from(["triage-classify", "m.model", "we need water", "help"])
            .unwrap();
        assert_eq!(args.messages.len(), 2);
        assert!(ClassifyArgs::try_parse_from(["triage-classify", "m.model"]).is_err());
    }
}
