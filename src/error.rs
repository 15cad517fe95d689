//! Error types for the Triage library.
//!
//! Every failure in Triage is represented by the [`TriageError`] enum. None of
//! them are recoverable at the point they occur: the caller is expected to fix
//! its input and rerun. The command line wraps failures in
//! [`TriageError::Stage`] so the message names the step that failed.
//!
//! # Examples
//!
//! ```
//! use triage::error::{Result, TriageError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TriageError::configuration("the search grid is empty"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::fmt;
use std::io;

use thiserror::Error;

/// Pipeline stage in which an error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the training corpus.
    Load,
    /// Assembling the search over the pipeline.
    Build,
    /// Hyperparameter search and final refit.
    Train,
    /// Scoring the held-out split.
    Evaluate,
    /// Writing the model artifact.
    Save,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Build => "build",
            Stage::Train => "train",
            Stage::Evaluate => "evaluate",
            Stage::Save => "save",
        };
        f.write_str(name)
    }
}

/// The main error type for Triage operations.
#[derive(Error, Debug)]
pub enum TriageError {
    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Corpus is missing expected columns or carries invalid label values
    #[error("Data error: {0}")]
    Data(String),

    /// Feature encoding errors (transform before fit, empty vocabulary)
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Invalid configuration (empty search grid, bad parameter values)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No grid point could be fitted
    #[error("Search exhausted: {0}")]
    SearchExhausted(String),

    /// Model artifact cannot be written or read
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV corpus errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// SQLite corpus errors
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An error annotated with the stage it aborted
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<TriageError>,
    },
}

/// Result type alias for operations that may fail with TriageError.
pub type Result<T> = std::result::Result<T, TriageError>;

impl TriageError {
    /// Create a new data error.
    pub fn data<S: Into<String>>(msg: S) -> Self {
        TriageError::Data(msg.into())
    }

    /// Create a new encoding error.
    pub fn encoding<S: Into<String>>(msg: S) -> Self {
        TriageError::Encoding(msg.into())
    }

    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        TriageError::Configuration(msg.into())
    }

    /// Create a new search exhausted error.
    pub fn search_exhausted<S: Into<String>>(msg: S) -> Self {
        TriageError::SearchExhausted(msg.into())
    }

    /// Create a new persistence error.
    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        TriageError::Persistence(msg.into())
    }

    /// Tag this error with the stage it aborted.
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            already @ TriageError::Stage { .. } => already,
            other => TriageError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage this error was tagged with, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            TriageError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = TriageError::data("missing column 'message'");
        assert_eq!(error.to_string(), "Data error: missing column 'message'");

        let error = TriageError::encoding("transform called before fit");
        assert_eq!(
            error.to_string(),
            "Encoding error: transform called before fit"
        );

        let error = TriageError::configuration("empty grid");
        assert_eq!(error.to_string(), "Configuration error: empty grid");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let triage_error = TriageError::from(io_error);

        match triage_error {
            TriageError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_stage_wrapping() {
        let error = TriageError::persistence("disk full").at_stage(Stage::Save);
        assert_eq!(error.stage(), Some(Stage::Save));
        assert_eq!(
            error.to_string(),
            "save stage failed: Persistence error: disk full"
        );

        // The innermost stage wins.
        let error = error.at_stage(Stage::Train);
        assert_eq!(error.stage(), Some(Stage::Save));
    }

    #[test]
    fn test_context_keeps_stage_and_causes() {
        use anyhow::Context;

        let result: Result<()> = Err(TriageError::data("bad label").at_stage(Stage::Load));
        let error = result.context("failed to train a model").unwrap_err();

        assert_eq!(error.to_string(), "failed to train a model");
        let inner = error.downcast_ref::<TriageError>().unwrap();
        assert_eq!(inner.stage(), Some(Stage::Load));

        let causes: Vec<String> = error.chain().map(|e| e.to_string()).collect();
        assert_eq!(causes.len(), 3);
        assert_eq!(causes[2], "Data error: bad label");
    }
}
