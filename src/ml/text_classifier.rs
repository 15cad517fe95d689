//! The fitted feature encoder and multi-label classifier, as one unit.

use serde::{Deserialize, Serialize};

use crate::analysis::token::TokenSequence;
use crate::error::{Result, TriageError};
use crate::ml::encoder::FeatureEncoder;
use crate::ml::forest::ForestConfig;
use crate::ml::matrix::LabelMatrix;
use crate::ml::multi_output::MultiOutputClassifier;

/// Feature encoder followed by one forest per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextClassifier {
    encoder: FeatureEncoder,
    classifier: MultiOutputClassifier,
}

impl TextClassifier {
    /// Fit the encoder on `documents`, then the classifier on the encoded rows.
    pub fn fit(
        config: &ForestConfig,
        documents: &[TokenSequence],
        labels: &LabelMatrix,
    ) -> Result<Self> {
        if documents.len() != labels.n_rows() {
            return Err(TriageError::data(format!(
                "{} documents but {} label rows",
                documents.len(),
                labels.n_rows()
            )));
        }

        let mut encoder = FeatureEncoder::new();
        let features = encoder.fit_transform(documents)?;

        let mut classifier = MultiOutputClassifier::new(config.clone());
        classifier.fit(&features, labels)?;

        Ok(TextClassifier {
            encoder,
            classifier,
        })
    }

    /// Predict labels for normalized documents.
    pub fn predict(&self, documents: &[TokenSequence]) -> Result<LabelMatrix> {
        let features = self.encoder.transform(documents)?;
        self.classifier.predict(&features)
    }

    /// Normalize raw messages and predict their labels.
    pub fn predict_messages<S: AsRef<str> + Sync>(&self, messages: &[S]) -> Result<LabelMatrix> {
        let features = self.encoder.transform_messages(messages)?;
        self.classifier.predict(&features)
    }

    /// The fitted feature encoder.
    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// The fitted multi-label classifier.
    pub fn classifier(&self) -> &MultiOutputClassifier {
        &self.classifier
    }
}

/// Fraction of rows whose whole label vector is predicted exactly.
pub fn subset_accuracy(predicted: &LabelMatrix, actual: &LabelMatrix) -> Result<f64> {
    if predicted.shape() != actual.shape() {
        return Err(TriageError::data(format!(
            "predicted shape {:?} does not match actual shape {:?}",
            predicted.shape(),
            actual.shape()
        )));
    }
    if actual.n_rows() == 0 {
        return Err(TriageError::data("cannot score zero rows"));
    }
    let exact = predicted
        .iter_rows()
        .zip(actual.iter_rows())
        .filter(|(p, a)| p == a)
        .count();
    Ok(exact as f64 / actual.n_rows() as f64)
}
