//! Feature encoder: token sequences to TF-IDF weighted sparse rows.
//!
//! The encoder chains a [`CountVectorizer`] and a [`TfIdfTransformer`]. Both
//! stages learn their state once, in [`FeatureEncoder::fit_transform`], and
//! that state is frozen for every later [`FeatureEncoder::transform`].
//!
//! # Examples
//!
//! ```
//! use triage::ml::encoder::FeatureEncoder;
//!
//! let mut encoder = FeatureEncoder::new();
//! let train = encoder
//!     .fit_transform_messages(&["Send food and water", "The road is flooded"])
//!     .unwrap();
//! assert_eq!(train.n_rows(), 2);
//!
//! // Unknown words encode to an all-zero row.
//! let test = encoder.transform_messages(&["hello there"]).unwrap();
//! assert!(test.row(0).is_zero());
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, MessageAnalyzer};
use crate::analysis::token::TokenSequence;
use crate::error::{Result, TriageError};
use crate::ml::matrix::FeatureMatrix;
use crate::ml::tfidf::TfIdfTransformer;
use crate::ml::vectorizer::CountVectorizer;

/// Term counting followed by TF-IDF weighting.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FeatureEncoder {
    vectorizer: CountVectorizer,
    tfidf: TfIdfTransformer,
    #[serde(skip)]
    analyzer: MessageAnalyzer,
}

impl FeatureEncoder {
    /// Create an unfitted encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the vocabulary and IDF weights, then encode the fit corpus.
    pub fn fit_transform(&mut self, documents: &[TokenSequence]) -> Result<FeatureMatrix> {
        let counts = self.vectorizer.fit_transform(documents)?;
        let features = self.tfidf.fit_transform(&counts)?;
        log::debug!(
            "Fitted feature encoder: {} documents, {} terms",
            documents.len(),
            self.vectorizer.vocabulary_size()
        );
        Ok(features)
    }

    /// Encode token sequences with the frozen vocabulary and weights.
    pub fn transform(&self, documents: &[TokenSequence]) -> Result<FeatureMatrix> {
        if !self.is_fitted() {
            return Err(TriageError::encoding(
                "feature encoder used before fit_transform",
            ));
        }
        let counts = self.vectorizer.transform(documents)?;
        self.tfidf.transform(&counts)
    }

    /// Normalize raw messages, then [`fit_transform`](Self::fit_transform).
    pub fn fit_transform_messages<S: AsRef<str> + Sync>(
        &mut self,
        messages: &[S],
    ) -> Result<FeatureMatrix> {
        let documents = self.normalize_all(messages)?;
        self.fit_transform(&documents)
    }

    /// Normalize raw messages, then [`transform`](Self::transform).
    pub fn transform_messages<S: AsRef<str> + Sync>(&self, messages: &[S]) -> Result<FeatureMatrix> {
        let documents = self.normalize_all(messages)?;
        self.transform(&documents)
    }

    /// Run every message through the message analyzer.
    pub fn normalize_all<S: AsRef<str> + Sync>(&self, messages: &[S]) -> Result<Vec<TokenSequence>> {
        messages
            .par_iter()
            .map(|message| self.analyzer.normalize(message.as_ref()))
            .collect()
    }

    /// Check whether the encoder has been fitted.
    pub fn is_fitted(&self) -> bool {
        self.vectorizer.is_fitted() && self.tfidf.is_fitted()
    }

    /// Width of every encoded row.
    pub fn n_features(&self) -> usize {
        self.vectorizer.vocabulary_size()
    }

    /// Vocabulary terms in column order.
    pub fn terms(&self) -> &[String] {
        self.vectorizer.terms()
    }

    /// IDF weight per column.
    pub fn idf(&self) -> &[f64] {
        self.tfidf.idf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: [&str; 3] = [
        "Send food and water",
        "We need tents and water",
        "The bridge collapsed",
    ];

    #[test]
    fn test_transform_matches_fit_transform() {
        let mut encoder = FeatureEncoder::new();
        let fitted = encoder.fit_transform_messages(&CORPUS).unwrap();
        let transformed = encoder.transform_messages(&CORPUS).unwrap();
        assert_eq!(fitted, transformed);
    }

    #[test]
    fn test_frozen_vocabulary() {
        let mut encoder = FeatureEncoder::new();
        encoder.fit_transform_messages(&CORPUS).unwrap();
        let width = encoder.n_features();

        let matrix = encoder
            .transform_messages(&["water for the camp", "!!!"])
            .unwrap();
        assert_eq!(matrix.n_features(), width);
        assert_eq!(matrix.row(0).nnz(), 1);
        assert!(matrix.row(1).is_zero());
        assert!(encoder.terms().contains(&"water".to_string()));
    }

    #[test]
    fn test_transform_before_fit() {
        let encoder = FeatureEncoder::new();
        let result = encoder.transform_messages(&["water"]);
        assert!(matches!(result, Err(TriageError::Encoding(_))));
    }

    #[test]
    fn test_stop_words_only_corpus() {
        let mut encoder = FeatureEncoder::new();
        let result = encoder.fit_transform_messages(&["the and of", "???"]);
        assert!(matches!(result, Err(TriageError::Encoding(_))));
    }

    #[test]
    fn test_serde_keeps_fitted_state() {
        let mut encoder = FeatureEncoder::new();
        let expected = encoder.fit_transform_messages(&CORPUS).unwrap();

        let bytes = bincode::serialize(&encoder).unwrap();
        let restored: FeatureEncoder = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.transform_messages(&CORPUS).unwrap(), expected);
    }
}
