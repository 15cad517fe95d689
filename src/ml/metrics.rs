//! Per-category classification metrics.
//!
//! [`evaluate`] scores a predicted label matrix against the true one, one
//! [`CategoryReport`] per category in category order. Each report carries the
//! positive-class precision and recall, the accuracy, and a full
//! [`ClassificationReport`] over the classes present in either column.
//! Undefined ratios (zero denominators) are reported as 0.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::ml::matrix::LabelMatrix;

/// Name column width of the text report.
const NAME_WIDTH: usize = 12;

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Precision, recall, F1 and support of one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn compute(class: u8, actual: &[u8], predicted: &[u8]) -> Self {
        let mut true_positive = 0;
        let mut predicted_positive = 0;
        let mut support = 0;
        for (&a, &p) in actual.iter().zip(predicted) {
            if p == class {
                predicted_positive += 1;
                if a == class {
                    true_positive += 1;
                }
            }
            if a == class {
                support += 1;
            }
        }

        let precision = ratio(true_positive, predicted_positive);
        let recall = ratio(true_positive, support);
        ClassMetrics {
            class,
            precision,
            recall,
            f1_score: f1(precision, recall),
            support,
        }
    }
}

/// Averaged metrics over the classes of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class breakdown of one binary column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Metrics of every class present in the true or predicted column, ascending.
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

impl ClassificationReport {
    /// Build the report for one column of true and predicted labels.
    pub fn from_labels(actual: &[u8], predicted: &[u8]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(TriageError::data(format!(
                "{} true labels but {} predictions",
                actual.len(),
                predicted.len()
            )));
        }
        if actual.is_empty() {
            return Err(TriageError::data("cannot evaluate zero rows"));
        }

        let mut present: Vec<u8> = actual.iter().chain(predicted).copied().collect();
        present.sort_unstable();
        present.dedup();

        let classes: Vec<ClassMetrics> = present
            .iter()
            .map(|&class| ClassMetrics::compute(class, actual, predicted))
            .collect();

        let correct = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();
        let total = actual.len();

        let n_classes = classes.len() as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / n_classes,
            support: total,
        };

        let weighted = |metric: fn(&ClassMetrics) -> f64| {
            classes
                .iter()
                .map(|c| metric(c) * c.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1_score: weighted(|c| c.f1_score),
            support: total,
        };

        Ok(ClassificationReport {
            accuracy: ratio(correct, total),
            classes,
            macro_avg,
            weighted_avg,
        })
    }

    /// Metrics of `class`, if it is present.
    pub fn class(&self, class: u8) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.class == class)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = NAME_WIDTH;
        writeln!(
            f,
            "{:>w$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>w$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.class, c.precision, c.recall, c.f1_score, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>w$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [
            ("macro avg", &self.macro_avg),
            ("weighted avg", &self.weighted_avg),
        ] {
            writeln!(
                f,
                "{:>w$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1_score, avg.support
            )?;
        }
        Ok(())
    }
}

/// Evaluation of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: String,
    /// Precision of the positive class.
    pub precision: f64,
    /// Recall of the positive class.
    pub recall: f64,
    pub accuracy: f64,
    pub report: ClassificationReport,
}

impl CategoryReport {
    /// Score one category column.
    pub fn from_labels(category: &str, actual: &[u8], predicted: &[u8]) -> Result<Self> {
        let report = ClassificationReport::from_labels(actual, predicted)?;
        let positive = ClassMetrics::compute(1, actual, predicted);
        Ok(CategoryReport {
            category: category.to_string(),
            precision: positive.precision,
            recall: positive.recall,
            accuracy: report.accuracy,
            report,
        })
    }
}

impl fmt::Display for CategoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Category: {}", self.category)?;
        writeln!(f, "{}", self.report)?;
        // Debug keeps the trailing `.0` on whole numbers.
        writeln!(f, "Accuracy {:?}", self.accuracy)
    }
}

/// Score every category of a predicted label matrix.
pub fn evaluate(
    predicted: &LabelMatrix,
    actual: &LabelMatrix,
    categories: &[String],
) -> Result<Vec<CategoryReport>> {
    if predicted.shape() != actual.shape() {
        return Err(TriageError::data(format!(
            "predicted shape {:?} does not match actual shape {:?}",
            predicted.shape(),
            actual.shape()
        )));
    }
    if actual.n_labels() != categories.len() {
        return Err(TriageError::data(format!(
            "{} label columns but {} category names",
            actual.n_labels(),
            categories.len()
        )));
    }

    categories
        .iter()
        .enumerate()
        .map(|(i, category)| {
            CategoryReport::from_labels(category, &actual.column(i), &predicted.column(i))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_metrics() {
        let actual = [1, 1, 0, 0, 1];
        let predicted = [1, 0, 0, 1, 1];
        let report = ClassificationReport::from_labels(&actual, &predicted).unwrap();

        let positive = report.class(1).unwrap();
        assert!((positive.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((positive.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(positive.support, 3);

        let negative = report.class(0).unwrap();
        assert!((negative.precision - 0.5).abs() < 1e-12);
        assert_eq!(negative.support, 2);
        assert!((report.accuracy - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_averages() {
        let report = ClassificationReport::from_labels(&[1, 0, 0, 0], &[1, 1, 0, 0]).unwrap();
        // class 0: p=1, r=2/3; class 1: p=1/2, r=1
        assert!((report.macro_avg.precision - 0.75).abs() < 1e-12);
        assert!((report.weighted_avg.recall - 0.75).abs() < 1e-12);
        assert_eq!(report.weighted_avg.support, 4);
    }

    #[test]
    fn test_undefined_positive_class_is_zero() {
        let report = CategoryReport::from_labels("water", &[0, 0, 0], &[0, 0, 0]).unwrap();
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.recall, 0.0);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.report.classes.len(), 1);
    }

    #[test]
    fn test_evaluate_follows_category_order() {
        let categories = vec!["related".to_string(), "aid_related".to_string(), "water".to_string()];
        let actual = LabelMatrix::new(3, vec![vec![1, 0, 1], vec![1, 1, 0]]).unwrap();
        let predicted = LabelMatrix::new(3, vec![vec![1, 0, 0], vec![1, 1, 0]]).unwrap();

        let reports = evaluate(&predicted, &actual, &categories).unwrap();
        let names: Vec<&str> = reports.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(names, vec!["related", "aid_related", "water"]);
        assert_eq!(reports[2].accuracy, 0.5);
        assert_eq!(reports[0].precision, 1.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let categories = vec!["a".to_string()];
        let actual = LabelMatrix::new(1, vec![vec![1]]).unwrap();
        let predicted = LabelMatrix::new(1, vec![vec![1], vec![0]]).unwrap();
        assert!(matches!(
            evaluate(&predicted, &actual, &categories),
            Err(TriageError::Data(_))
        ));

        let two = vec!["a".to_string(), "b".to_string()];
        assert!(matches!(
            evaluate(&actual, &actual, &two),
            Err(TriageError::Data(_))
        ));
    }

    #[test]
    fn test_display_layout() {
        let report = CategoryReport::from_labels("water", &[1, 0], &[1, 0]).unwrap();
        let text = report.to_string();
        assert!(text.starts_with("Category: water\n"));
        assert!(text.contains("precision    recall  f1-score   support"));
        assert!(text.contains("    accuracy                           1.00         2"));
        assert!(text.contains("weighted avg       1.00      1.00      1.00         2"));
        assert!(text.trim_end().ends_with("Accuracy 1.0"));
    }
}
