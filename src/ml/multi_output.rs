//! Binary-relevance multi-label classification.
//!
//! One [`RandomForestClassifier`] is fitted per label column, each reading
//! only its own column. Predictions of the per-category forests are
//! concatenated in column order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::ml::forest::{ForestConfig, RandomForestClassifier, derive_seed};
use crate::ml::matrix::{FeatureMatrix, LabelMatrix};

/// One independent forest per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiOutputClassifier {
    config: ForestConfig,
    estimators: Vec<RandomForestClassifier>,
}

impl MultiOutputClassifier {
    /// Create an unfitted classifier; every category uses `config`.
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            estimators: Vec::new(),
        }
    }

    /// Fit one forest per label column.
    ///
    /// A column with no positive rows still gets a forest, which then always
    /// predicts 0.
    pub fn fit(&mut self, features: &FeatureMatrix, labels: &LabelMatrix) -> Result<()> {
        self.config.validate()?;

        if features.n_rows() != labels.n_rows() {
            return Err(TriageError::data(format!(
                "{} feature rows but {} label rows",
                features.n_rows(),
                labels.n_rows()
            )));
        }
        if labels.n_labels() == 0 {
            return Err(TriageError::data("label matrix has no categories"));
        }

        let config = &self.config;
        let estimators = (0..labels.n_labels())
            .into_par_iter()
            .map(|category| {
                let column = labels.column(category);
                if column.iter().all(|&v| v == 0) {
                    log::debug!("Category {category} has no positive rows");
                }
                let mut forest = RandomForestClassifier::new(ForestConfig {
                    seed: derive_seed(config.seed, category as u64),
                    ..config.clone()
                });
                forest.fit(features, &column)?;
                Ok(forest)
            })
            .collect::<Result<Vec<_>>>()?;

        self.estimators = estimators;
        Ok(())
    }

    /// Predict a `rows × categories` label matrix.
    pub fn predict(&self, features: &FeatureMatrix) -> Result<LabelMatrix> {
        if !self.is_fitted() {
            return Err(TriageError::data("multi-output classifier used before fit"));
        }
        let columns = self
            .estimators
            .iter()
            .map(|forest| forest.predict(features))
            .collect::<Result<Vec<_>>>()?;

        LabelMatrix::from_columns(features.n_rows(), &columns)
    }

    /// Check whether the classifier has been fitted.
    pub fn is_fitted(&self) -> bool {
        !self.estimators.is_empty()
    }

    /// Number of categories the classifier predicts.
    pub fn n_outputs(&self) -> usize {
        self.estimators.len()
    }

    /// Per-category forests in column order.
    pub fn estimators(&self) -> &[RandomForestClassifier] {
        &self.estimators
    }

    /// The shared forest configuration.
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Out-of-bag score per category, where one was computed.
    pub fn oob_scores(&self) -> Vec<Option<f64>> {
        self.estimators.iter().map(|f| f.oob_score()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> (FeatureMatrix, LabelMatrix) {
        let rows: Vec<Vec<f64>> = (0..12)
            .map(|i| match i % 3 {
                0 => vec![1.0, 0.0, 0.0],
                1 => vec![0.0, 1.0, 0.0],
                _ => vec![0.0, 0.0, 1.0],
            })
            .collect();
        // Category 0: rows of kind 0; category 1: never positive; category 2: kinds 1 and 2.
        let labels = (0..12)
            .map(|i| match i % 3 {
                0 => vec![1, 0, 0],
                _ => vec![0, 0, 1],
            })
            .collect();
        (
            FeatureMatrix::from_dense(3, &rows).unwrap(),
            LabelMatrix::new(3, labels).unwrap(),
        )
    }

    fn config() -> ForestConfig {
        ForestConfig {
            n_estimators: 11,
            ..Default::default()
        }
    }

    #[test]
    fn test_fit_predict_shape() {
        let (features, labels) = dataset();
        let mut classifier = MultiOutputClassifier::new(config());
        classifier.fit(&features, &labels).unwrap();

        let predicted = classifier.predict(&features).unwrap();
        assert_eq!(predicted.shape(), (12, 3));
        assert_eq!(classifier.n_outputs(), 3);
        assert_eq!(predicted, labels);
    }

    #[test]
    fn test_degenerate_category_predicts_zero() {
        let (features, labels) = dataset();
        let mut classifier = MultiOutputClassifier::new(config());
        classifier.fit(&features, &labels).unwrap();

        let predicted = classifier.predict(&features).unwrap();
        assert!(predicted.column(1).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_categories_get_distinct_seeds() {
        let (features, labels) = dataset();
        let mut classifier = MultiOutputClassifier::new(config());
        classifier.fit(&features, &labels).unwrap();

        let seeds: Vec<u64> = classifier
            .estimators()
            .iter()
            .map(|f| f.config().seed)
            .collect();
        assert_ne!(seeds[0], seeds[1]);
        assert_ne!(seeds[1], seeds[2]);
    }

    #[test]
    fn test_row_mismatch() {
        let (features, labels) = dataset();
        let mut classifier = MultiOutputClassifier::new(config());
        let result = classifier.fit(&features.select_rows(&[0, 1]), &labels);
        assert!(matches!(result, Err(TriageError::Data(_))));
    }

    #[test]
    fn test_predict_before_fit() {
        let (features, _) = dataset();
        let classifier = MultiOutputClassifier::new(config());
        assert!(classifier.predict(&features).is_err());
    }
}
