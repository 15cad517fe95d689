//! CSV corpus reader.
//!
//! The first row is the header. Columns are laid out as for the SQLite table:
//! ```csv
//! id,message,original,genre,related,water
//! 2,We need water,,direct,1,1
//! ```

use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;

use crate::corpus::{Corpus, CorpusLayout, CorpusReader, parse_label};
use crate::error::{Result, TriageError};
use crate::ml::matrix::LabelMatrix;

/// Reads a corpus from a CSV file.
#[derive(Debug, Clone)]
pub struct CsvCorpusReader {
    layout: CorpusLayout,
    /// CSV delimiter character (default: ',')
    delimiter: u8,
}

impl Default for CsvCorpusReader {
    fn default() -> Self {
        Self::new(CorpusLayout::default())
    }
}

impl CsvCorpusReader {
    /// Create a comma-delimited reader for `layout`.
    pub fn new(layout: CorpusLayout) -> Self {
        CsvCorpusReader {
            layout,
            delimiter: b',',
        }
    }

    /// Set a custom delimiter character. Only ASCII delimiters are accepted.
    pub fn with_delimiter(mut self, delimiter: char) -> Result<Self> {
        if !delimiter.is_ascii() {
            return Err(TriageError::configuration(format!(
                "CSV delimiter must be an ASCII character, got {delimiter:?}"
            )));
        }
        self.delimiter = delimiter as u8;
        Ok(self)
    }

    /// Read a corpus from any byte source.
    pub fn read_from<R: std::io::Read>(&self, input: R) -> Result<Corpus> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .flexible(false)
            .from_reader(input);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let (text_index, categories) = self.layout.resolve(&columns)?;
        let offset = self.layout.label_offset;

        let mut messages = Vec::new();
        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            messages.push(record[text_index].to_string());
            let labels = categories
                .iter()
                .enumerate()
                .map(|(j, category)| parse_label(&record[offset + j], i, category))
                .collect::<Result<Vec<u8>>>()?;
            rows.push(labels);
        }

        if messages.is_empty() {
            return Err(TriageError::data("CSV corpus has no data rows"));
        }

        let labels = LabelMatrix::new(categories.len(), rows)?;
        Corpus::new(messages, labels, categories)
    }
}

impl CorpusReader for CsvCorpusReader {
    fn read(&self, path: &Path) -> Result<Corpus> {
        let file = File::open(path)?;
        self.read_from(file)
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "id,message,original,genre,related,water\n\
                          1,We need water,,direct,1,1\n\
                          2,Road is blocked,,news,1.0,0\n\
                          3,Thanks for the update,,social,0,0\n";

    #[test]
    fn test_read_sample() {
        let corpus = CsvCorpusReader::default().read_from(SAMPLE.as_bytes()).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.categories(), &["related", "water"]);
        assert_eq!(corpus.messages()[1], "Road is blocked");
        assert_eq!(corpus.labels().row(0), &[1, 1]);
        assert_eq!(corpus.labels().row(1), &[1, 0]);
    }

    #[test]
    fn test_read_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let corpus = CsvCorpusReader::default().read(&path).unwrap();
        assert_eq!(corpus.len(), 3);
    }

    #[test]
    fn test_custom_delimiter() {
        let input = "id;message;original;genre;water\n1;hello;;direct;0\n";
        let corpus = CsvCorpusReader::default()
            .with_delimiter(';')
            .unwrap()
            .read_from(input.as_bytes())
            .unwrap();
        assert_eq!(corpus.messages(), &["hello"]);
    }

    #[test]
    fn test_non_ascii_delimiter_is_rejected() {
        for delimiter in ['é', '\u{2028}', '；'] {
            let result = CsvCorpusReader::default().with_delimiter(delimiter);
            assert!(matches!(result, Err(TriageError::Configuration(_))));
        }
        assert!(CsvCorpusReader::default().with_delimiter('\t').is_ok());
    }

    #[test]
    fn test_invalid_label() {
        let input = "id,message,original,genre,related\n1,hello,,direct,2\n";
        let result = CsvCorpusReader::default().read_from(input.as_bytes());
        assert!(matches!(result, Err(TriageError::Data(_))));
    }

    #[test]
    fn test_header_only() {
        let input = "id,message,original,genre,related\n";
        let result = CsvCorpusReader::default().read_from(input.as_bytes());
        assert!(matches!(result, Err(TriageError::Data(_))));
    }

    #[test]
    fn test_ragged_row() {
        let input = "id,message,original,genre,related\n1,hello,,direct\n";
        let result = CsvCorpusReader::default().read_from(input.as_bytes());
        assert!(matches!(result, Err(TriageError::Csv(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = CsvCorpusReader::default().read(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(TriageError::Io(_))));
    }
}
