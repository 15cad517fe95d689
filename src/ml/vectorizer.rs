//! Term counting over normalized token sequences.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::analysis::token::TokenSequence;
use crate::error::{Result, TriageError};
use crate::ml::matrix::{FeatureMatrix, SparseVector};

/// Maps each distinct training token to a column and counts occurrences.
///
/// Columns are assigned in lexicographic token order, so the same corpus
/// always yields the same vocabulary regardless of message order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CountVectorizer {
    vocabulary: HashMap<String, usize>,
    terms: Vec<String>,
    fitted: bool,
}

impl CountVectorizer {
    /// Create an unfitted vectorizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the vocabulary from the fit corpus.
    pub fn fit(&mut self, documents: &[TokenSequence]) -> Result<()> {
        let terms: BTreeSet<&str> = documents
            .iter()
            .flat_map(|doc| doc.iter().map(String::as_str))
            .collect();

        if terms.is_empty() {
            return Err(TriageError::encoding(
                "empty vocabulary: the fit corpus contains no tokens",
            ));
        }

        self.terms = terms.into_iter().map(str::to_string).collect();
        self.vocabulary = self
            .terms
            .iter()
            .enumerate()
            .map(|(index, term)| (term.clone(), index))
            .collect();
        self.fitted = true;

        Ok(())
    }

    /// Count vocabulary tokens per document. Unknown tokens are ignored.
    pub fn transform(&self, documents: &[TokenSequence]) -> Result<FeatureMatrix> {
        if !self.fitted {
            return Err(TriageError::encoding(
                "count vectorizer used before fit_transform",
            ));
        }

        let rows = documents
            .iter()
            .map(|doc| {
                SparseVector::from_pairs(
                    doc.iter()
                        .filter_map(|token| self.vocabulary.get(token))
                        .map(|&column| (column, 1.0)),
                )
            })
            .collect();

        FeatureMatrix::new(self.terms.len(), rows)
    }

    /// Fit, then transform the same corpus.
    pub fn fit_transform(&mut self, documents: &[TokenSequence]) -> Result<FeatureMatrix> {
        self.fit(documents)?;
        self.transform(documents)
    }

    /// Column of `term`, if it is in the vocabulary.
    pub fn column(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Vocabulary terms in column order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Get the size of the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    /// Check whether the vocabulary has been learned.
    pub fn is_fitted(&self) -> bool {
        self.fitted
    }
}
