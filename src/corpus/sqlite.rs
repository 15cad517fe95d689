//! SQLite corpus reader.

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use crate::corpus::{Corpus, CorpusLayout, CorpusReader, parse_label};
use crate::error::{Result, TriageError};
use crate::ml::matrix::LabelMatrix;

/// Reads every row of one table of a SQLite database.
#[derive(Debug, Clone, Default)]
pub struct SqliteCorpusReader {
    layout: CorpusLayout,
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn label_value(value: ValueRef<'_>, row: usize, column: &str) -> Result<u8> {
    match value {
        ValueRef::Integer(0) => Ok(0),
        ValueRef::Integer(1) => Ok(1),
        ValueRef::Real(v) if v == 0.0 => Ok(0),
        ValueRef::Real(v) if v == 1.0 => Ok(1),
        ValueRef::Text(bytes) => parse_label(&String::from_utf8_lossy(bytes), row, column),
        other => Err(TriageError::data(format!(
            "row {row}, column '{column}': label {other:?} is not 0 or 1"
        ))),
    }
}

fn message_value(value: ValueRef<'_>, row: usize) -> Result<String> {
    match value {
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| TriageError::data(format!("row {row}: message is not UTF-8: {e}"))),
        ValueRef::Integer(v) => Ok(v.to_string()),
        ValueRef::Real(v) => Ok(v.to_string()),
        ValueRef::Null => Err(TriageError::data(format!("row {row}: message is NULL"))),
        ValueRef::Blob(_) => Err(TriageError::data(format!("row {row}: message is a blob"))),
    }
}

impl SqliteCorpusReader {
    pub fn new(layout: CorpusLayout) -> Self {
        SqliteCorpusReader { layout }
    }

    /// Read the configured table from an open connection.
    pub fn read_connection(&self, conn: &Connection) -> Result<Corpus> {
        let sql = format!("SELECT * FROM {}", quote_identifier(&self.layout.table));
        let mut stmt = conn.prepare(&sql)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let (text_index, categories) = self.layout.resolve(&columns)?;
        let offset = self.layout.label_offset;

        let mut messages = Vec::new();
        let mut label_rows = Vec::new();
        let mut rows = stmt.query([])?;
        let mut i = 0;
        while let Some(row) = rows.next()? {
            messages.push(message_value(row.get_ref(text_index)?, i)?);
            let labels = categories
                .iter()
                .enumerate()
                .map(|(j, category)| -> Result<u8> {
                    label_value(row.get_ref(offset + j)?, i, category)
                })
                .collect::<Result<Vec<u8>>>()?;
            label_rows.push(labels);
            i += 1;
        }

        if messages.is_empty() {
            return Err(TriageError::data(format!(
                "table '{}' has no rows",
                self.layout.table
            )));
        }

        let labels = LabelMatrix::new(categories.len(), label_rows)?;
        Corpus::new(messages, labels, categories)
    }
}

impl CorpusReader for SqliteCorpusReader {
    fn read(&self, path: &Path) -> Result<Corpus> {
        // A missing file is an error, not a new empty database.
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        self.read_connection(&conn)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
