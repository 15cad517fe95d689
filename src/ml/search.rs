//! Grid search with k-fold cross-validation over the text classifier.
//!
//! Every grid point is a [`ForestConfig`]: the base configuration with one
//! value from each grid axis applied. A grid point is scored by the mean
//! subset accuracy over contiguous, unshuffled folds of the training rows,
//! refitting the feature encoder inside every fold. The best mean wins
//! (the earliest grid point on ties) and is refitted on all training rows.
//!
//! # Examples
//!
//! ```
//! use triage::ml::forest::ForestConfig;
//! use triage::ml::search::ParamGrid;
//!
//! let candidates = ParamGrid::default().candidates(&ForestConfig::default()).unwrap();
//! assert_eq!(candidates.len(), 2);
//! assert!(candidates.iter().all(|c| c.oob_score));
//! assert_eq!(candidates[1].min_samples_split, 4);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::token::TokenSequence;
use crate::error::{Result, TriageError};
use crate::ml::forest::{ForestConfig, MaxFeatures};
use crate::ml::matrix::LabelMatrix;
use crate::ml::text_classifier::{TextClassifier, subset_accuracy};

/// Default number of cross-validation folds.
pub const DEFAULT_CV_FOLDS: usize = 5;

/// One forest hyperparameter with a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForestParam {
    Bootstrap(bool),
    MaxDepth(Option<usize>),
    MaxFeatures(MaxFeatures),
    MinSamplesLeaf(usize),
    MinSamplesSplit(usize),
    NEstimators(usize),
    OobScore(bool),
}

impl ForestParam {
    /// Parameter name as it appears in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            ForestParam::Bootstrap(_) => "bootstrap",
            ForestParam::MaxDepth(_) => "max_depth",
            ForestParam::MaxFeatures(_) => "max_features",
            ForestParam::MinSamplesLeaf(_) => "min_samples_leaf",
            ForestParam::MinSamplesSplit(_) => "min_samples_split",
            ForestParam::NEstimators(_) => "n_estimators",
            ForestParam::OobScore(_) => "oob_score",
        }
    }

    /// Set this value on a forest configuration.
    pub fn apply(&self, config: &mut ForestConfig) {
        match *self {
            ForestParam::Bootstrap(v) => config.bootstrap = v,
            ForestParam::MaxDepth(v) => config.max_depth = v,
            ForestParam::MaxFeatures(v) => config.max_features = v,
            ForestParam::MinSamplesLeaf(v) => config.min_samples_leaf = v,
            ForestParam::MinSamplesSplit(v) => config.min_samples_split = v,
            ForestParam::NEstimators(v) => config.n_estimators = v,
            ForestParam::OobScore(v) => config.oob_score = v,
        }
    }
}

impl fmt::Display for ForestParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForestParam::Bootstrap(v) | ForestParam::OobScore(v) => {
                write!(f, "{}={v}", self.name())
            }
            ForestParam::MaxDepth(Some(v)) => write!(f, "{}={v}", self.name()),
            ForestParam::MaxDepth(None) => write!(f, "{}=none", self.name()),
            ForestParam::MaxFeatures(v) => write!(f, "{}={v:?}", self.name()),
            ForestParam::MinSamplesLeaf(v)
            | ForestParam::MinSamplesSplit(v)
            | ForestParam::NEstimators(v) => write!(f, "{}={v}", self.name()),
        }
    }
}

/// Values to try for each forest hyperparameter.
///
/// `None` leaves the parameter at the base configuration's value; `Some`
/// makes it a grid axis. Axes are combined as a cartesian product, in field
/// order, the last axis varying fastest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub bootstrap: Option<Vec<bool>>,
    pub max_depth: Option<Vec<Option<usize>>>,
    pub max_features: Option<Vec<MaxFeatures>>,
    pub min_samples_leaf: Option<Vec<usize>>,
    pub min_samples_split: Option<Vec<usize>>,
    pub n_estimators: Option<Vec<usize>>,
    pub oob_score: Option<Vec<bool>>,
}

impl Default for ParamGrid {
    /// `oob_score ∈ {true}`, `min_samples_split ∈ {2, 4}`.
    fn default() -> Self {
        ParamGrid {
            min_samples_split: Some(vec![2, 4]),
            oob_score: Some(vec![true]),
            ..ParamGrid::empty()
        }
    }
}

impl ParamGrid {
    /// A grid with no axes.
    pub fn empty() -> Self {
        ParamGrid {
            bootstrap: None,
            max_depth: None,
            max_features: None,
            min_samples_leaf: None,
            min_samples_split: None,
            n_estimators: None,
            oob_score: None,
        }
    }

    /// The grid axes, each a non-empty list of values.
    pub fn axes(&self) -> Result<Vec<Vec<ForestParam>>> {
        fn axis<T: Copy>(
            values: &Option<Vec<T>>,
            name: &str,
            wrap: fn(T) -> ForestParam,
        ) -> Result<Option<Vec<ForestParam>>> {
            match values {
                None => Ok(None),
                Some(values) if values.is_empty() => Err(TriageError::configuration(format!(
                    "search grid axis '{name}' has no values"
                ))),
                Some(values) => Ok(Some(values.iter().copied().map(wrap).collect())),
            }
        }

        let axes: Vec<Vec<ForestParam>> = [
            axis(&self.bootstrap, "bootstrap", ForestParam::Bootstrap)?,
            axis(&self.max_depth, "max_depth", ForestParam::MaxDepth)?,
            axis(&self.max_features, "max_features", ForestParam::MaxFeatures)?,
            axis(&self.min_samples_leaf, "min_samples_leaf", ForestParam::MinSamplesLeaf)?,
            axis(&self.min_samples_split, "min_samples_split", ForestParam::MinSamplesSplit)?,
            axis(&self.n_estimators, "n_estimators", ForestParam::NEstimators)?,
            axis(&self.oob_score, "oob_score", ForestParam::OobScore)?,
        ]
        .into_iter()
        .flatten()
        .collect();

        if axes.is_empty() {
            return Err(TriageError::configuration("search grid is empty"));
        }
        Ok(axes)
    }

    /// Every grid point as parameter lists, in search order.
    pub fn points(&self) -> Result<Vec<Vec<ForestParam>>> {
        let mut points: Vec<Vec<ForestParam>> = vec![Vec::new()];
        for axis in self.axes()? {
            points = points
                .iter()
                .flat_map(|prefix| {
                    axis.iter().map(move |value| {
                        let mut point = prefix.clone();
                        point.push(*value);
                        point
                    })
                })
                .collect();
        }
        Ok(points)
    }

    /// Every grid point applied to `base`, in search order.
    pub fn candidates(&self, base: &ForestConfig) -> Result<Vec<ForestConfig>> {
        Ok(self
            .points()?
            .iter()
            .map(|point| {
                let mut config = base.clone();
                for param in point {
                    param.apply(&mut config);
                }
                config
            })
            .collect())
    }
}

/// Train and validation row indices of one fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Contiguous, unshuffled k-fold splits.
///
/// The first `n_samples % n_folds` folds hold one extra row.
pub fn k_fold(n_samples: usize, n_folds: usize) -> Result<Vec<CvSplit>> {
    if n_folds < 2 {
        return Err(TriageError::configuration(format!(
            "cross-validation needs at least 2 folds, got {n_folds}"
        )));
    }
    if n_samples < n_folds {
        return Err(TriageError::data(format!(
            "cannot split {n_samples} rows into {n_folds} folds"
        )));
    }

    let base = n_samples / n_folds;
    let extra = n_samples % n_folds;
    let mut splits = Vec::with_capacity(n_folds);
    let mut start = 0;

    for fold in 0..n_folds {
        let size = base + usize::from(fold < extra);
        let end = start + size;
        splits.push(CvSplit {
            train_indices: (0..start).chain(end..n_samples).collect(),
            test_indices: (start..end).collect(),
        });
        start = end;
    }

    Ok(splits)
}

/// Cross-validation outcome of one grid point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    /// Grid values applied to the base configuration.
    pub params: Vec<ForestParam>,
    /// Subset accuracy per fold; empty if the candidate failed.
    pub fold_scores: Vec<f64>,
    /// Mean fold score, `None` if the candidate failed.
    pub mean_score: Option<f64>,
    /// Why the candidate failed.
    pub error: Option<String>,
}

impl CandidateResult {
    /// Parameters as `name=value, ...`.
    pub fn describe(&self) -> String {
        self.params
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Scores of every grid point plus the winner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub n_folds: usize,
    pub candidates: Vec<CandidateResult>,
    pub best_index: usize,
}

impl SearchReport {
    /// The winning grid point.
    pub fn best(&self) -> &CandidateResult {
        &self.candidates[self.best_index]
    }
}

/// Result of a grid search: the refitted winner and the search report.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub model: TextClassifier,
    pub best_config: ForestConfig,
    pub report: SearchReport,
}

/// Exhaustive search over a [`ParamGrid`].
#[derive(Debug, Clone)]
pub struct GridSearch {
    base: ForestConfig,
    grid: ParamGrid,
    cv_folds: usize,
}

impl GridSearch {
    /// Create a search over `grid`, applied on top of `base`.
    pub fn new(base: ForestConfig, grid: ParamGrid) -> Self {
        GridSearch {
            base,
            grid,
            cv_folds: DEFAULT_CV_FOLDS,
        }
    }

    /// Set the number of cross-validation folds.
    pub fn with_cv_folds(mut self, cv_folds: usize) -> Self {
        self.cv_folds = cv_folds;
        self
    }

    /// Number of grid points.
    pub fn n_candidates(&self) -> Result<usize> {
        Ok(self.grid.points()?.len())
    }

    /// Cross-validate every grid point, then refit the winner on all rows.
    pub fn fit(&self, documents: &[TokenSequence], labels: &LabelMatrix) -> Result<SearchOutcome> {
        let points = self.grid.points()?;
        if self.cv_folds < 2 {
            return Err(TriageError::configuration(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }

        let n_train = documents.len();
        if n_train != labels.n_rows() {
            return Err(TriageError::data(format!(
                "{n_train} documents but {} label rows",
                labels.n_rows()
            )));
        }
        if n_train < 2 {
            return Err(TriageError::data(format!(
                "hyperparameter search needs at least 2 training rows, got {n_train}"
            )));
        }

        let n_folds = self.cv_folds.min(n_train);
        let splits = k_fold(n_train, n_folds)?;
        log::info!(
            "Grid search: {} candidates x {} folds on {} rows",
            points.len(),
            n_folds,
            n_train
        );

        let mut candidates = Vec::with_capacity(points.len());
        let mut best: Option<(usize, f64, ForestConfig)> = None;

        for (index, params) in points.into_iter().enumerate() {
            let mut config = self.base.clone();
            for param in &params {
                param.apply(&mut config);
            }

            let result = match cross_validate(&config, documents, labels, &splits) {
                Ok(fold_scores) => {
                    let mean = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
                    CandidateResult {
                        params,
                        fold_scores,
                        mean_score: Some(mean),
                        error: None,
                    }
                }
                Err(e) => CandidateResult {
                    params,
                    fold_scores: Vec::new(),
                    mean_score: None,
                    error: Some(e.to_string()),
                },
            };

            match (result.mean_score, &result.error) {
                (Some(mean), _) => {
                    log::info!("  [{}] {} -> {mean:.4}", index, result.describe());
                    if best.as_ref().is_none_or(|(_, score, _)| mean > *score) {
                        best = Some((index, mean, config));
                    }
                }
                (None, Some(error)) => {
                    log::warn!("  [{}] {} failed: {error}", index, result.describe());
                }
                (None, None) => {}
            }
            candidates.push(result);
        }

        let Some((best_index, best_score, best_config)) = best else {
            return Err(TriageError::search_exhausted(format!(
                "all {} grid candidates failed to fit",
                candidates.len()
            )));
        };
        log::info!(
            "Best candidate: {} (mean subset accuracy {best_score:.4})",
            candidates[best_index].describe()
        );

        let model = TextClassifier::fit(&best_config, documents, labels)?;

        Ok(SearchOutcome {
            model,
            best_config,
            report: SearchReport {
                n_folds,
                candidates,
                best_index,
            },
        })
    }
}

/// Subset accuracy of `config` on each fold.
fn cross_validate(
    config: &ForestConfig,
    documents: &[TokenSequence],
    labels: &LabelMatrix,
    splits: &[CvSplit],
) -> Result<Vec<f64>> {
    splits
        .iter()
        .map(|split| {
            let train_docs: Vec<TokenSequence> = split
                .train_indices
                .iter()
                .map(|&i| documents[i].clone())
                .collect();
            let test_docs: Vec<TokenSequence> = split
                .test_indices
                .iter()
                .map(|&i| documents[i].clone())
                .collect();

            let model =
                TextClassifier::fit(config, &train_docs, &labels.select_rows(&split.train_indices))?;
            let predicted = model.predict(&test_docs)?;
            subset_accuracy(&predicted, &labels.select_rows(&split.test_indices))
        })
        .collect()
}
