//! Training configuration.
//!
//! Every field has a default, so a JSON file only needs the keys it changes:
//! ```json
//! { "seed": 7, "forest": { "n_estimators": 50 }, "grid": { "max_depth": [null, 20] } }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::corpus::CorpusLayout;
use crate::error::{Result, TriageError};
use crate::ml::forest::ForestConfig;
use crate::ml::search::{DEFAULT_CV_FOLDS, ParamGrid};

/// Default random seed.
pub const DEFAULT_SEED: u64 = 42;

/// Default held-out fraction.
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Settings for one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Seed of the train/test split and of every forest.
    pub seed: u64,
    /// Fraction of the corpus held out for evaluation.
    pub test_size: f64,
    /// Cross-validation folds per grid point.
    pub cv_folds: usize,
    /// Worker threads; `None` uses one per CPU.
    pub jobs: Option<usize>,
    /// Where text and labels live in the corpus table.
    pub corpus: CorpusLayout,
    /// Base forest settings. Its `seed` is replaced by [`seed`](Self::seed).
    pub forest: ForestConfig,
    /// Values tried by the hyperparameter search.
    pub grid: ParamGrid,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            seed: DEFAULT_SEED,
            test_size: DEFAULT_TEST_SIZE,
            cv_folds: DEFAULT_CV_FOLDS,
            jobs: None,
            corpus: CorpusLayout::default(),
            forest: ForestConfig::default(),
            grid: ParamGrid::default(),
        }
    }
}

impl TrainingConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The forest configuration the search starts from.
    pub fn base_forest(&self) -> ForestConfig {
        ForestConfig {
            seed: self.seed,
            ..self.forest.clone()
        }
    }

    /// Check every setting before any work starts.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(TriageError::configuration(format!(
                "test_size must be between 0 and 1 (exclusive), got {}",
                self.test_size
            )));
        }
        if self.cv_folds < 2 {
            return Err(TriageError::configuration(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.jobs == Some(0) {
            return Err(TriageError::configuration("jobs must be at least 1"));
        }
        self.base_forest().validate()?;
        self.grid.points()?;
        Ok(())
    }
}
