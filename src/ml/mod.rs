//! Machine learning for message categorization.
//!
//! - [`encoder`]: token sequences to TF-IDF weighted sparse rows
//! - [`forest`]: random forest binary classifiers
//! - [`multi_output`]: one forest per category
//! - [`search`]: grid search with k-fold cross-validation
//! - [`metrics`]: per-category evaluation

pub mod encoder;
pub mod forest;
pub mod matrix;
pub mod metrics;
pub mod multi_output;
pub mod search;
pub mod text_classifier;
pub mod tfidf;
pub mod vectorizer;

pub use encoder::FeatureEncoder;
pub use forest::{ForestConfig, MaxFeatures, RandomForestClassifier};
pub use matrix::{FeatureMatrix, LabelMatrix, SparseVector};
pub use metrics::{CategoryReport, ClassificationReport, evaluate};
pub use multi_output::MultiOutputClassifier;
pub use search::{GridSearch, ParamGrid, SearchOutcome, SearchReport};
pub use text_classifier::TextClassifier;
