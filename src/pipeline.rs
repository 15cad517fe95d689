//! The trained model artifact and its persistence.
//!
//! A [`TrainedModel`] bundles the fitted encoder and classifier with the
//! category names it predicts and a record of how it was chosen. On disk it is
//! a single blob:
//!
//! ```text
//! magic (8 bytes) | payload length (u64 LE) | bincode payload | CRC32 of payload (u32 LE)
//! ```
//!
//! Loading checks every part and fails with a persistence error on any
//! mismatch.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;
use crate::corpus::Corpus;
use crate::error::{Result, TriageError};
use crate::ml::encoder::FeatureEncoder;
use crate::ml::forest::ForestConfig;
use crate::ml::matrix::LabelMatrix;
use crate::ml::metrics::{CategoryReport, evaluate};
use crate::ml::search::{GridSearch, SearchReport};
use crate::ml::text_classifier::TextClassifier;

/// Leading bytes of every model file.
pub const MODEL_MAGIC: &[u8; 8] = b"TRIAGEM1";

const HEADER_LEN: usize = MODEL_MAGIC.len() + 8;
const CHECKSUM_LEN: usize = 4;

/// A fitted message classifier ready to predict and persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    categories: Vec<String>,
    classifier: TextClassifier,
    best_config: ForestConfig,
    search: SearchReport,
    training_rows: usize,
    trained_at: DateTime<Utc>,
    version: String,
}

impl TrainedModel {
    /// Normalize the training messages, search the grid, and keep the winner.
    pub fn train(corpus: &Corpus, config: &TrainingConfig) -> Result<Self> {
        config.validate()?;

        let documents = FeatureEncoder::new().normalize_all(corpus.messages())?;
        let outcome = GridSearch::new(config.base_forest(), config.grid.clone())
            .with_cv_folds(config.cv_folds)
            .fit(&documents, corpus.labels())?;

        Ok(TrainedModel {
            categories: corpus.categories().to_vec(),
            classifier: outcome.model,
            best_config: outcome.best_config,
            search: outcome.report,
            training_rows: corpus.len(),
            trained_at: Utc::now(),
            version: crate::VERSION.to_string(),
        })
    }

    /// Predict a `messages × categories` label matrix.
    pub fn predict_messages<S: AsRef<str> + Sync>(&self, messages: &[S]) -> Result<LabelMatrix> {
        self.classifier.predict_messages(messages)
    }

    /// Names of the categories predicted for each message.
    pub fn classify<S: AsRef<str> + Sync>(&self, messages: &[S]) -> Result<Vec<Vec<&str>>> {
        let predicted = self.predict_messages(messages)?;
        Ok(predicted
            .iter_rows()
            .map(|row| {
                row.iter()
                    .zip(&self.categories)
                    .filter(|(value, _)| **value == 1)
                    .map(|(_, category)| category.as_str())
                    .collect()
            })
            .collect())
    }

    /// Predict the held-out corpus and score every category.
    pub fn evaluate(&self, test: &Corpus) -> Result<Vec<CategoryReport>> {
        if test.categories() != self.categories.as_slice() {
            return Err(TriageError::data(
                "evaluation corpus categories differ from the model's",
            ));
        }
        let predicted = self.predict_messages(test.messages())?;
        evaluate(&predicted, test.labels(), &self.categories)
    }

    /// Category names in label column order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn classifier(&self) -> &TextClassifier {
        &self.classifier
    }

    /// The forest settings chosen by the search.
    pub fn best_config(&self) -> &ForestConfig {
        &self.best_config
    }

    /// Cross-validation scores of every grid point.
    pub fn search_report(&self) -> &SearchReport {
        &self.search
    }

    /// Number of rows the final model was fitted on.
    pub fn training_rows(&self) -> usize {
        self.training_rows
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Crate version that wrote the model.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Encode the model as a framed, checksummed blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)
            .map_err(|e| TriageError::persistence(format!("failed to encode model: {e}")))?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len() + CHECKSUM_LEN);
        bytes.extend_from_slice(MODEL_MAGIC);
        bytes.write_u64::<LittleEndian>(payload.len() as u64)?;
        bytes.extend_from_slice(&payload);
        bytes.write_u32::<LittleEndian>(crc32fast::hash(&payload))?;
        Ok(bytes)
    }

    /// Decode a blob written by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
            return Err(TriageError::persistence(format!(
                "model file is truncated ({} bytes)",
                bytes.len()
            )));
        }

        let mut cursor = Cursor::new(bytes);
        let mut magic = [0u8; 8];
        cursor.read_exact(&mut magic)?;
        if &magic != MODEL_MAGIC {
            return Err(TriageError::persistence("not a triage model file"));
        }

        let payload_len = cursor.read_u64::<LittleEndian>()? as usize;
        let expected = HEADER_LEN
            .checked_add(payload_len)
            .and_then(|n| n.checked_add(CHECKSUM_LEN));
        if expected != Some(bytes.len()) {
            return Err(TriageError::persistence(format!(
                "model payload length {payload_len} does not match file size {}",
                bytes.len()
            )));
        }

        let payload = &bytes[HEADER_LEN..HEADER_LEN + payload_len];
        cursor.set_position((HEADER_LEN + payload_len) as u64);
        let stored = cursor.read_u32::<LittleEndian>()?;
        let actual = crc32fast::hash(payload);
        if stored != actual {
            return Err(TriageError::persistence(format!(
                "model checksum mismatch: stored {stored:#010x}, computed {actual:#010x}"
            )));
        }

        bincode::deserialize(payload)
            .map_err(|e| TriageError::persistence(format!("failed to decode model: {e}")))
    }

    /// Write the model to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, &bytes)?;
        log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Read a model saved with [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}
