//! # Triage
//!
//! Multi-label classification of disaster-response messages.
//!
//! ## Features
//!
//! - Message normalization: lowercasing, punctuation stripping, stop-word
//!   removal and verb lemmatization
//! - Sparse count + TF-IDF feature encoding
//! - One random forest per category
//! - Grid search with k-fold cross-validation
//! - Per-category precision, recall and accuracy reports
//! - Corpora from SQLite tables or CSV files
//! - Checksummed model files

pub mod analysis;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod ml;
pub mod pipeline;

pub mod prelude {
    pub use crate::config::TrainingConfig;
    pub use crate::corpus::{Corpus, CorpusLayout, load_corpus};
    pub use crate::error::{Result, TriageError};
    pub use crate::pipeline::TrainedModel;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
