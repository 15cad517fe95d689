//! Output formatting for CLI commands.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::error::Result;
use crate::ml::metrics::CategoryReport;
use crate::ml::search::SearchReport;

/// Result structure for a training run.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub database: String,
    pub model: String,
    pub train_rows: usize,
    pub test_rows: usize,
    pub categories: Vec<String>,
    pub best_params: String,
    pub search: SearchReport,
    pub reports: Vec<CategoryReport>,
    pub duration_ms: u64,
}

/// Categories predicted for one message.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageClassification {
    pub message: String,
    pub categories: Vec<String>,
}

/// Result structure for classification.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassificationResults {
    pub model: String,
    pub results: Vec<MessageClassification>,
}

/// Prints stage progress lines to stdout.
///
/// Silent in quiet mode and for JSON output, which must stay a single
/// document.
#[derive(Debug, Clone, Copy)]
pub struct StageReporter {
    enabled: bool,
}

impl StageReporter {
    pub fn new(format: OutputFormat, verbosity: u8) -> Self {
        StageReporter {
            enabled: format == OutputFormat::Human && verbosity > 0,
        }
    }

    /// Print one stage line.
    pub fn stage(&self, message: &str) {
        if self.enabled {
            println!("{message}");
        }
    }
}

/// Write the per-category reports in the plain-text layout.
pub fn write_reports<W: Write>(out: &mut W, reports: &[CategoryReport]) -> Result<()> {
    for report in reports {
        writeln!(out, "{report}\n")?;
    }
    Ok(())
}

/// Write the search scores, the winner marked with `*`.
pub fn write_search_summary<W: Write>(out: &mut W, search: &SearchReport) -> Result<()> {
    writeln!(out, "Grid search ({} folds):", search.n_folds)?;
    for (i, candidate) in search.candidates.iter().enumerate() {
        let marker = if i == search.best_index { '*' } else { ' ' };
        match (candidate.mean_score, &candidate.error) {
            (Some(score), _) => {
                writeln!(out, " {marker} {:<40} {score:.4}", candidate.describe())?
            }
            (None, Some(error)) => {
                writeln!(out, " {marker} {:<40} failed: {error}", candidate.describe())?
            }
            (None, None) => writeln!(out, " {marker} {}", candidate.describe())?,
        }
    }
    Ok(())
}

/// Write classification results, one message per block.
pub fn write_classifications<W: Write>(
    out: &mut W,
    results: &ClassificationResults,
) -> Result<()> {
    for result in &results.results {
        writeln!(out, "Message: {}", result.message)?;
        if result.categories.is_empty() {
            writeln!(out, "Categories: (none)")?;
        } else {
            writeln!(out, "Categories: {}", result.categories.join(", "))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Output in JSON format.
pub fn output_json<T: Serialize>(result: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::search::{CandidateResult, ForestParam};

    #[test]
    fn test_write_reports_spacing() {
        let report = CategoryReport::from_labels("water", &[1, 0], &[1, 1]).unwrap();
        let mut out = Vec::new();
        write_reports(&mut out, &[report]).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Category: water\n"));
        assert!(text.ends_with("Accuracy 0.5\n\n\n"));
    }

    #[test]
    fn test_write_search_summary_marks_best() {
        let search = SearchReport {
            n_folds: 3,
            candidates: vec![
                CandidateResult {
                    params: vec![ForestParam::MinSamplesSplit(2)],
                    fold_scores: vec![0.5, 0.5, 0.5],
                    mean_score: Some(0.5),
                    error: None,
                },
                CandidateResult {
                    params: vec![ForestParam::MinSamplesSplit(4)],
                    fold_scores: vec![0.7, 0.7, 0.7],
                    mean_score: Some(0.7),
                    error: None,
                },
            ],
            best_index: 1,
        };
        let mut out = Vec::new();
        write_search_summary(&mut out, &search).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Grid search (3 folds):");
        assert!(lines[1].starts_with("   min_samples_split=2"));
        assert!(lines[2].starts_with(" * min_samples_split=4"));
        assert!(lines[2].ends_with("0.7000"));
    }

    #[test]
    fn test_write_classifications() {
        let results = ClassificationResults {
            model: "m.model".to_string(),
            results: vec![
                MessageClassification {
                    message: "we need water".to_string(),
                    categories: vec!["related".to_string(), "water".to_string()],
                },
                MessageClassification {
                    message: "hello".to_string(),
                    categories: vec![],
                },
            ],
        };
        let mut out = Vec::new();
        write_classifications(&mut out, &results).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Categories: related, water\n"));
        assert!(text.contains("Categories: (none)\n"));
    }
}
