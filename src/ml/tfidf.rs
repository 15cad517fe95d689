//! TF-IDF weighting of term-count rows.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::ml::matrix::{FeatureMatrix, SparseVector};

/// Reweights term counts by smoothed inverse document frequency.
///
/// `idf(t) = ln((1 + n) / (1 + df(t))) + 1`, where `n` is the number of fit
/// rows and `df(t)` the number of rows containing `t`. Each transformed row
/// is scaled to unit L2 norm; all-zero rows stay zero.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TfIdfTransformer {
    idf: Vec<f64>,
    n_documents: usize,
    fitted: bool,
}

impl TfIdfTransformer {
    /// Create an unfitted transformer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute IDF weights from a count matrix.
    pub fn fit(&mut self, counts: &FeatureMatrix) -> Result<()> {
        let n_features = counts.n_features();
        if n_features == 0 {
            return Err(TriageError::encoding(
                "cannot fit tf-idf weights on zero feature columns",
            ));
        }

        let mut document_frequency = vec![0usize; n_features];
        for row in counts.rows() {
            for (column, _) in row.iter() {
                document_frequency[column] += 1;
            }
        }

        let n = counts.n_rows() as f64;
        self.idf = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        self.n_documents = counts.n_rows();
        self.fitted = true;

        Ok(())
    }

    /// Weight and normalize every row of a count matrix.
    pub fn transform(&self, counts: &FeatureMatrix) -> Result<FeatureMatrix> {
        if !self.fitted {
            return Err(TriageError::encoding(
                "tf-idf transformer used before fit_transform",
            ));
        }
        if counts.n_features() != self.idf.len() {
            return Err(TriageError::encoding(format!(
                "count matrix has {} columns, tf-idf weights cover {}",
                counts.n_features(),
                self.idf.len()
            )));
        }

        let rows = counts
            .rows()
            .iter()
            .map(|row| self.weight_row(row))
            .collect();

        FeatureMatrix::new(self.idf.len(), rows)
    }

    /// Fit, then transform the same counts.
    pub fn fit_transform(&mut self, counts: &FeatureMatrix) -> Result<FeatureMatrix> {
        self.fit(counts)?;
        self.transform(counts)
    }

    fn weight_row(&self, row: &SparseVector) -> SparseVector {
        let mut weighted = row.clone();
        weighted.scale_columns(&self.idf);
        let norm = weighted.l2_norm();
        if norm > 0.0 {
            weighted.scale(1.0 / norm);
        }
        weighted
    }

    /// IDF weight per column.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Number of rows seen at fit time.
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// Check whether weights have been computed.
    pub fn is_fitted(&self) -> bool {
        self.fitted
    }
}
