//! Labeled message corpora and the readers that load them.
//!
//! A corpus is a table with one text column and a contiguous block of binary
//! label columns. The label block starts at a fixed column offset and runs to
//! the last column; its column names, in table order, are the categories.
//!
//! Two storage formats are supported:
//! - [`sqlite::SqliteCorpusReader`]: a table in a SQLite database
//! - [`csv::CsvCorpusReader`]: a CSV file with a header row

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::ml::matrix::LabelMatrix;

pub mod csv;
pub mod sqlite;

pub use self::csv::CsvCorpusReader;
pub use self::sqlite::SqliteCorpusReader;

/// Default SQLite table name.
pub const DEFAULT_TABLE: &str = "DisasterResponse";

/// Default name of the message text column.
pub const DEFAULT_TEXT_COLUMN: &str = "message";

/// Default index of the first label column (after id, message, original, genre).
pub const DEFAULT_LABEL_OFFSET: usize = 4;

/// Where the text and labels live in a corpus table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusLayout {
    /// Table to read (SQLite only).
    pub table: String,
    /// Name of the column holding the message text.
    pub text_column: String,
    /// Index of the first label column.
    pub label_offset: usize,
}

impl Default for CorpusLayout {
    fn default() -> Self {
        CorpusLayout {
            table: DEFAULT_TABLE.to_string(),
            text_column: DEFAULT_TEXT_COLUMN.to_string(),
            label_offset: DEFAULT_LABEL_OFFSET,
        }
    }
}

impl CorpusLayout {
    /// Locate the text column and the categories in a header row.
    ///
    /// Returns the text column index and the category names.
    pub fn resolve(&self, columns: &[String]) -> Result<(usize, Vec<String>)> {
        let text_index = columns
            .iter()
            .position(|c| c == &self.text_column)
            .ok_or_else(|| {
                TriageError::data(format!("missing text column '{}'", self.text_column))
            })?;

        if self.label_offset >= columns.len() {
            return Err(TriageError::data(format!(
                "label offset {} leaves no label columns in {} columns",
                self.label_offset,
                columns.len()
            )));
        }
        if text_index >= self.label_offset {
            return Err(TriageError::data(format!(
                "text column '{}' lies inside the label block starting at column {}",
                self.text_column, self.label_offset
            )));
        }

        Ok((text_index, columns[self.label_offset..].to_vec()))
    }
}

/// Parse one label cell.
///
/// Accepts 0 and 1 written as integers, reals or their text forms.
pub fn parse_label(raw: &str, row: usize, column: &str) -> Result<u8> {
    let trimmed = raw.trim();
    let value = trimmed.parse::<f64>().map_err(|_| {
        TriageError::data(format!(
            "row {row}, column '{column}': label '{trimmed}' is not numeric"
        ))
    })?;
    label_from_f64(value, row, column)
}

fn label_from_f64(value: f64, row: usize, column: &str) -> Result<u8> {
    if value == 0.0 {
        Ok(0)
    } else if value == 1.0 {
        Ok(1)
    } else {
        Err(TriageError::data(format!(
            "row {row}, column '{column}': label {value} is not 0 or 1"
        )))
    }
}

/// Messages with their label vectors and the ordered category names.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    messages: Vec<String>,
    labels: LabelMatrix,
    categories: Vec<String>,
}

impl Corpus {
    /// Create a corpus; row counts and category count must agree.
    pub fn new(messages: Vec<String>, labels: LabelMatrix, categories: Vec<String>) -> Result<Self> {
        if categories.is_empty() {
            return Err(TriageError::data("corpus has no categories"));
        }
        if labels.n_labels() != categories.len() {
            return Err(TriageError::data(format!(
                "{} label columns but {} categories",
                labels.n_labels(),
                categories.len()
            )));
        }
        if labels.n_rows() != messages.len() {
            return Err(TriageError::data(format!(
                "{} messages but {} label rows",
                messages.len(),
                labels.n_rows()
            )));
        }
        Ok(Corpus {
            messages,
            labels,
            categories,
        })
    }

    /// Message texts in row order.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Label matrix aligned with [`messages`](Self::messages).
    pub fn labels(&self) -> &LabelMatrix {
        &self.labels
    }

    /// Category names in column order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if the corpus has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// A new corpus made of the given rows, in the given order.
    pub fn select(&self, indices: &[usize]) -> Corpus {
        Corpus {
            messages: indices.iter().map(|&i| self.messages[i].clone()).collect(),
            labels: self.labels.select_rows(indices),
            categories: self.categories.clone(),
        }
    }

    /// Randomly split into `(train, test)`.
    ///
    /// The test split holds `ceil(test_size * len)` rows. The row order is a
    /// permutation drawn from `seed`, so the same seed gives the same split.
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> Result<(Corpus, Corpus)> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(TriageError::configuration(format!(
                "test_size must be between 0 and 1 (exclusive), got {test_size}"
            )));
        }

        let n = self.len();
        let n_test = (test_size * n as f64).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(TriageError::data(format!(
                "cannot split {n} rows with test_size {test_size}"
            )));
        }

        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let (test, train) = order.split_at(n_test);
        Ok((self.select(train), self.select(test)))
    }
}

/// Trait for corpus readers.
pub trait CorpusReader {
    /// Read the whole corpus at `path`.
    fn read(&self, path: &Path) -> Result<Corpus>;

    /// Get the name of this reader (for logging).
    fn name(&self) -> &'static str;
}

/// Pick a reader by file extension: `.csv` reads CSV, anything else SQLite.
pub fn reader_for(path: &Path, layout: &CorpusLayout) -> Box<dyn CorpusReader> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        Box::new(CsvCorpusReader::new(layout.clone()))
    } else {
        Box::new(SqliteCorpusReader::new(layout.clone()))
    }
}

/// Read a corpus with the reader chosen by [`reader_for`].
pub fn load_corpus(path: &Path, layout: &CorpusLayout) -> Result<Corpus> {
    let reader = reader_for(path, layout);
    log::debug!("Reading corpus {} with the {} reader", path.display(), reader.name());
    let corpus = reader.read(path)?;
    log::info!(
        "Loaded {} messages with {} categories",
        corpus.len(),
        corpus.categories().len()
    );
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn corpus(n: usize) -> Corpus {
        let messages = (0..n).map(|i| format!("message {i}")).collect();
        let labels = LabelMatrix::new(1, (0..n).map(|i| vec![(i % 2) as u8]).collect()).unwrap();
        Corpus::new(messages, labels, vec!["water".to_string()]).unwrap()
    }

    #[test]
    fn test_layout_resolve() {
        let layout = CorpusLayout::default();
        let (text, categories) = layout
            .resolve(&columns(&["id", "message", "original", "genre", "related", "water"]))
            .unwrap();
        assert_eq!(text, 1);
        assert_eq!(categories, vec!["related", "water"]);
    }

    #[test]
    fn test_layout_errors() {
        let layout = CorpusLayout::default();
        assert!(layout.resolve(&columns(&["id", "text", "a", "b", "c"])).is_err());
        assert!(layout.resolve(&columns(&["id", "message", "a", "b"])).is_err());

        let inside = CorpusLayout {
            label_offset: 1,
            ..Default::default()
        };
        assert!(inside.resolve(&columns(&["id", "message", "water"])).is_err());
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(parse_label("1", 0, "water").unwrap(), 1);
        assert_eq!(parse_label(" 0 ", 0, "water").unwrap(), 0);
        assert_eq!(parse_label("1.0", 0, "water").unwrap(), 1);
        assert!(matches!(parse_label("2", 3, "related"), Err(TriageError::Data(_))));
        assert!(matches!(parse_label("yes", 3, "related"), Err(TriageError::Data(_))));
        assert!(parse_label("", 3, "related").is_err());
    }

    #[test]
    fn test_corpus_validation() {
        let labels = LabelMatrix::new(1, vec![vec![1]]).unwrap();
        assert!(Corpus::new(vec![], labels.clone(), vec!["water".to_string()]).is_err());
        assert!(Corpus::new(vec!["a".to_string()], labels, vec![]).is_err());
    }

    #[test]
    fn test_train_test_split_sizes() {
        let (train, test) = corpus(10).train_test_split(0.2, 42).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);

        let (train, test) = corpus(4).train_test_split(0.2, 42).unwrap();
        assert_eq!((train.len(), test.len()), (3, 1));
    }

    #[test]
    fn test_train_test_split_is_a_partition() {
        let full = corpus(25);
        let (train, test) = full.train_test_split(0.2, 7).unwrap();
        let mut all: Vec<String> = train
            .messages()
            .iter()
            .chain(test.messages())
            .cloned()
            .collect();
        all.sort();
        let mut expected = full.messages().to_vec();
        expected.sort();
        assert_eq!(all, expected);

        // Same seed, same split.
        let (again, _) = full.train_test_split(0.2, 7).unwrap();
        assert_eq!(again, train);
    }

    #[test]
    fn test_train_test_split_errors() {
        assert!(matches!(
            corpus(10).train_test_split(1.5, 0),
            Err(TriageError::Configuration(_))
        ));
        assert!(matches!(
            corpus(1).train_test_split(0.2, 0),
            Err(TriageError::Data(_))
        ));
    }

    #[test]
    fn test_reader_for_extension() {
        let layout = CorpusLayout::default();
        assert_eq!(reader_for(Path::new("data/messages.CSV"), &layout).name(), "csv");
        assert_eq!(reader_for(Path::new("data/DisasterResponse.db"), &layout).name(), "sqlite");
    }
}
