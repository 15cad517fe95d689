//! Random Forest implementation

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::derive_seed;
use super::tree::{DecisionTreeClassifier, TreeConfig};
use crate::error::{Result, TriageError};
use crate::ml::matrix::{FeatureMatrix, SparseVector};

/// Number of features drawn at each split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `ceil(sqrt(n_features))`
    #[default]
    Sqrt,
    /// `ceil(log2(n_features))`
    Log2,
    /// Every feature.
    All,
    /// A fixed count, capped at `n_features`.
    Count(usize),
}

impl MaxFeatures {
    /// Resolve to a concrete count in `1..=n_features`.
    pub fn resolve(self, n_features: usize) -> usize {
        let n = n_features.max(1);
        let count = match self {
            MaxFeatures::Sqrt => (n as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n as f64).log2().ceil() as usize,
            MaxFeatures::All => n,
            MaxFeatures::Count(count) => count,
        };
        count.clamp(1, n)
    }
}

/// Random Forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_estimators: usize,
    /// Maximum depth of each tree (None = unlimited)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn per split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Out-of-bag score calculation
    pub oob_score: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            oob_score: false,
            seed: 42,
        }
    }
}

impl ForestConfig {
    /// Reject settings no forest can be grown with.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(TriageError::configuration("n_estimators must be at least 1"));
        }
        if self.min_samples_split < 2 {
            return Err(TriageError::configuration(
                "min_samples_split must be at least 2",
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(TriageError::configuration(
                "min_samples_leaf must be at least 1",
            ));
        }
        if self.max_features == MaxFeatures::Count(0) {
            return Err(TriageError::configuration("max_features must be at least 1"));
        }
        if self.oob_score && !self.bootstrap {
            return Err(TriageError::configuration(
                "oob_score requires bootstrap sampling",
            ));
        }
        Ok(())
    }
}

/// Random Forest model for one binary target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    config: ForestConfig,
    trees: Vec<DecisionTreeClassifier>,
    n_features: usize,
    oob_score_value: Option<f64>,
}

impl RandomForestClassifier {
    /// Create a new random forest
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
            oob_score_value: None,
        }
    }

    /// Train the random forest on binary labels.
    pub fn fit(&mut self, features: &FeatureMatrix, labels: &[u8]) -> Result<()> {
        self.config.validate()?;

        let n_samples = features.n_rows();
        if n_samples == 0 {
            return Err(TriageError::data("cannot fit a forest on zero rows"));
        }
        if labels.len() != n_samples {
            return Err(TriageError::data(format!(
                "{} label values for {} feature rows",
                labels.len(),
                n_samples
            )));
        }
        if let Some(&value) = labels.iter().find(|&&v| v > 1) {
            return Err(TriageError::data(format!(
                "label value {value} is not binary"
            )));
        }

        let max_features = self.config.max_features.resolve(features.n_features());
        let config = &self.config;

        // Build trees in parallel, remembering each tree's in-bag rows
        let fitted: Vec<(DecisionTreeClassifier, Vec<bool>)> = (0..config.n_estimators)
            .into_par_iter()
            .map(|i| {
                let tree_seed = derive_seed(config.seed, i as u64);
                let mut rng = StdRng::seed_from_u64(tree_seed);

                let samples: Vec<usize> = if config.bootstrap {
                    (0..n_samples)
                        .map(|_| rng.random_range(0..n_samples))
                        .collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut in_bag = vec![false; n_samples];
                for &s in &samples {
                    in_bag[s] = true;
                }

                let mut tree = DecisionTreeClassifier::new(TreeConfig {
                    max_depth: config.max_depth,
                    min_samples_split: config.min_samples_split,
                    min_samples_leaf: config.min_samples_leaf,
                    max_features,
                    seed: rng.random(),
                });
                tree.fit(features, labels, &samples)?;

                Ok((tree, in_bag))
            })
            .collect::<Result<_>>()?;

        self.oob_score_value = if self.config.oob_score {
            Self::oob_score_of(&fitted, features, labels)
        } else {
            None
        };
        self.trees = fitted.into_iter().map(|(tree, _)| tree).collect();
        self.n_features = features.n_features();

        Ok(())
    }

    /// Accuracy of the majority vote of out-of-bag trees, over rows that
    /// were out of bag for at least one tree.
    fn oob_score_of(
        fitted: &[(DecisionTreeClassifier, Vec<bool>)],
        features: &FeatureMatrix,
        labels: &[u8],
    ) -> Option<f64> {
        let mut correct = 0usize;
        let mut total = 0usize;

        for (i, &label) in labels.iter().enumerate() {
            let votes: Vec<u8> = fitted
                .iter()
                .filter(|(_, in_bag)| !in_bag[i])
                .map(|(tree, _)| tree.predict_row(features.row(i)))
                .collect();
            if votes.is_empty() {
                continue;
            }
            let positive = votes.iter().filter(|&&v| v == 1).count();
            let predicted = u8::from(2 * positive > votes.len());
            if predicted == label {
                correct += 1;
            }
            total += 1;
        }

        if total == 0 {
            log::warn!("No out-of-bag rows; oob score is undefined");
            None
        } else {
            Some(correct as f64 / total as f64)
        }
    }

    /// Majority vote of the trees for one row; ties go to the negative class.
    pub fn predict_row(&self, row: &SparseVector) -> u8 {
        if self.trees.is_empty() {
            return 0;
        }
        let positive = self
            .trees
            .iter()
            .filter(|tree| tree.predict_row(row) == 1)
            .count();
        u8::from(2 * positive > self.trees.len())
    }

    /// Fraction of trees voting for the positive class.
    pub fn predict_proba_row(&self, row: &SparseVector) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let positive = self
            .trees
            .iter()
            .filter(|tree| tree.predict_row(row) == 1)
            .count();
        positive as f64 / self.trees.len() as f64
    }

    /// Predict every row of a feature matrix.
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u8>> {
        if !self.is_fitted() {
            return Err(TriageError::data("random forest used before fit"));
        }
        if features.n_features() != self.n_features {
            return Err(TriageError::data(format!(
                "feature matrix has {} columns, forest was fitted on {}",
                features.n_features(),
                self.n_features
            )));
        }
        Ok(features
            .rows()
            .par_iter()
            .map(|row| self.predict_row(row))
            .collect())
    }

    /// Check whether the forest has been fitted.
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Out-of-bag accuracy, when requested and defined.
    pub fn oob_score(&self) -> Option<f64> {
        self.oob_score_value
    }

    /// The fitted trees.
    pub fn trees(&self) -> &[DecisionTreeClassifier] {
        &self.trees
    }

    /// The configuration this forest was built with.
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}
