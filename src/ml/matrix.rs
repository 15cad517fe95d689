//! Sparse feature rows and binary label matrices.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};

/// A sparse row of feature values.
///
/// Column indices are strictly increasing; absent columns are zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Create an all-zero row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs.
    ///
    /// Pairs are sorted by column, values for a repeated column are summed
    /// and explicit zeros are dropped.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let mut pairs: Vec<(usize, f64)> = pairs.into_iter().collect();
        pairs.sort_by_key(|&(column, _)| column);

        let mut row = SparseVector::new();
        for (column, value) in pairs {
            match row.indices.last() {
                Some(&last) if last == column => {
                    if let Some(slot) = row.values.last_mut() {
                        *slot += value;
                    }
                }
                _ => {
                    row.indices.push(column);
                    row.values.push(value);
                }
            }
        }
        row.retain_nonzero();
        row
    }

    fn retain_nonzero(&mut self) {
        if self.values.iter().all(|&v| v != 0.0) {
            return;
        }
        let (indices, values) = self
            .indices
            .iter()
            .zip(&self.values)
            .filter(|&(_, &v)| v != 0.0)
            .map(|(&i, &v)| (i, v))
            .unzip();
        self.indices = indices;
        self.values = values;
    }

    /// Value at `column`, zero when absent.
    pub fn get(&self, column: usize) -> f64 {
        match self.indices.binary_search(&column) {
            Ok(position) => self.values[position],
            Err(_) => 0.0,
        }
    }

    /// Iterate over the stored `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if every value is zero.
    pub fn is_zero(&self) -> bool {
        self.indices.is_empty()
    }

    /// Euclidean norm.
    pub fn l2_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Multiply every stored value in place.
    pub fn scale(&mut self, factor: f64) {
        for value in &mut self.values {
            *value *= factor;
        }
    }

    /// Multiply each stored value by the weight of its column.
    pub fn scale_columns(&mut self, weights: &[f64]) {
        for (column, value) in self.indices.iter().zip(self.values.iter_mut()) {
            *value *= weights.get(*column).copied().unwrap_or(0.0);
        }
        self.retain_nonzero();
    }

    /// Expand into a dense vector of `width` columns.
    pub fn to_dense(&self, width: usize) -> Vec<f64> {
        let mut dense = vec![0.0; width];
        for (column, value) in self.iter() {
            if column < width {
                dense[column] = value;
            }
        }
        dense
    }
}

/// Sparse rows over a fixed number of feature columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    n_features: usize,
    rows: Vec<SparseVector>,
}

impl FeatureMatrix {
    /// Create a matrix from rows; every stored column must be below `n_features`.
    pub fn new(n_features: usize, rows: Vec<SparseVector>) -> Result<Self> {
        if let Some(column) = rows
            .iter()
            .filter_map(|row| row.indices.last().copied())
            .find(|&column| column >= n_features)
        {
            return Err(TriageError::data(format!(
                "feature column {column} out of range for width {n_features}"
            )));
        }
        Ok(FeatureMatrix { n_features, rows })
    }

    /// Build a matrix from dense rows.
    pub fn from_dense(n_features: usize, rows: &[Vec<f64>]) -> Result<Self> {
        let sparse = rows
            .iter()
            .map(|row| {
                if row.len() != n_features {
                    return Err(TriageError::data(format!(
                        "dense row has {} values, expected {n_features}",
                        row.len()
                    )));
                }
                Ok(SparseVector::from_pairs(row.iter().copied().enumerate()))
            })
            .collect::<Result<Vec<_>>>()?;
        FeatureMatrix::new(n_features, sparse)
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of feature columns.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Row `index`.
    pub fn row(&self, index: usize) -> &SparseVector {
        &self.rows[index]
    }

    /// All rows in order.
    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    /// Value at `(row, column)`.
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.rows[row].get(column)
    }

    /// New matrix made of the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            n_features: self.n_features,
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

/// Binary indicators, one row per message and one column per category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMatrix {
    n_labels: usize,
    data: Vec<u8>,
}

impl LabelMatrix {
    /// Create a label matrix from rows.
    ///
    /// Every row must have `n_labels` entries and every entry must be 0 or 1.
    pub fn new(n_labels: usize, rows: Vec<Vec<u8>>) -> Result<Self> {
        let mut data = Vec::with_capacity(rows.len() * n_labels);
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != n_labels {
                return Err(TriageError::data(format!(
                    "label row {index} has {} entries, expected {n_labels}",
                    row.len()
                )));
            }
            if let Some(&value) = row.iter().find(|&&v| v > 1) {
                return Err(TriageError::data(format!(
                    "label row {index} contains {value}, labels must be 0 or 1"
                )));
            }
            data.extend(row);
        }
        Ok(LabelMatrix { n_labels, data })
    }

    /// An all-zero matrix.
    pub fn zeros(n_rows: usize, n_labels: usize) -> Self {
        LabelMatrix {
            n_labels,
            data: vec![0; n_rows * n_labels],
        }
    }

    /// Assemble a matrix from per-category columns of equal length.
    pub fn from_columns(n_rows: usize, columns: &[Vec<u8>]) -> Result<Self> {
        let mut matrix = LabelMatrix::zeros(n_rows, columns.len());
        for (label, column) in columns.iter().enumerate() {
            if column.len() != n_rows {
                return Err(TriageError::data(format!(
                    "label column {label} has {} rows, expected {n_rows}",
                    column.len()
                )));
            }
            for (row, &value) in column.iter().enumerate() {
                if value > 1 {
                    return Err(TriageError::data(format!(
                        "label column {label} contains {value}, labels must be 0 or 1"
                    )));
                }
                matrix.data[row * matrix.n_labels + label] = value;
            }
        }
        Ok(matrix)
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        if self.n_labels == 0 {
            0
        } else {
            self.data.len() / self.n_labels
        }
    }

    /// Number of label columns.
    pub fn n_labels(&self) -> usize {
        self.n_labels
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_labels)
    }

    /// Row `index` as a slice.
    pub fn row(&self, index: usize) -> &[u8] {
        let start = index * self.n_labels;
        &self.data[start..start + self.n_labels]
    }

    /// Iterate over rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.data.chunks(self.n_labels.max(1))
    }

    /// Entry at `(row, label)`.
    pub fn get(&self, row: usize, label: usize) -> u8 {
        self.data[row * self.n_labels + label]
    }

    /// Copy of column `label`.
    pub fn column(&self, label: usize) -> Vec<u8> {
        (0..self.n_rows()).map(|row| self.get(row, label)).collect()
    }

    /// New matrix made of the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> LabelMatrix {
        let mut data = Vec::with_capacity(indices.len() * self.n_labels);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        LabelMatrix {
            n_labels: self.n_labels,
            data,
        }
    }

    /// Rows as owned vectors.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.iter_rows().map(|row| row.to_vec()).collect()
    }
}
