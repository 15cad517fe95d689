//! Binary CART decision tree over sparse feature rows.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::ml::matrix::{FeatureMatrix, SparseVector};

/// Splits whose impurity decrease is below this are treated as no improvement.
const MIN_IMPURITY_DECREASE: f64 = 1e-12;

/// Decision tree configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth of tree (None = grow until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in each child of a split
    pub min_samples_leaf: usize,
    /// Number of non-constant features scored at every split
    pub max_features: usize,
    /// Random seed for feature sampling
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: usize::MAX,
            seed: 42,
        }
    }
}

/// Tree node, stored in a flat arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Terminal node with its majority class.
    Leaf {
        class: u8,
        positive_fraction: f64,
        n_samples: usize,
    },
    /// Internal node: rows with `feature <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

impl TreeNode {
    fn leaf(positives: usize, n_samples: usize) -> Self {
        TreeNode::Leaf {
            class: u8::from(2 * positives > n_samples),
            positive_fraction: if n_samples == 0 {
                0.0
            } else {
                positives as f64 / n_samples as f64
            },
            n_samples,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }
}

/// A candidate split found for one node.
struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Work item of the iterative tree builder.
struct PendingNode {
    node: usize,
    samples: Vec<usize>,
    depth: usize,
}

/// Gini impurity of a binary node.
fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

/// Columns with a stored value in at least one of `samples`, ascending.
///
/// Every other column is zero throughout the node and cannot split it.
fn present_features(features: &FeatureMatrix, samples: &[usize]) -> Vec<usize> {
    let mut columns: Vec<usize> = samples
        .iter()
        .flat_map(|&i| features.row(i).iter().map(|(column, _)| column))
        .collect();
    columns.sort_unstable();
    columns.dedup();
    columns
}

/// A binary classification tree grown with Gini impurity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    config: TreeConfig,
    nodes: Vec<TreeNode>,
}

impl DecisionTreeClassifier {
    /// Create an unfitted tree.
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
        }
    }

    /// Grow the tree on the given sample indices (repeats allowed).
    pub fn fit(&mut self, features: &FeatureMatrix, labels: &[u8], samples: &[usize]) -> Result<()> {
        if labels.len() != features.n_rows() {
            return Err(TriageError::data(format!(
                "{} label values for {} feature rows",
                labels.len(),
                features.n_rows()
            )));
        }
        if samples.is_empty() {
            return Err(TriageError::data("cannot fit a tree on zero samples"));
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let max_features = self.config.max_features.clamp(1, features.n_features().max(1));

        let mut nodes = vec![TreeNode::leaf(0, 0)];
        let mut stack = vec![PendingNode {
            node: 0,
            samples: samples.to_vec(),
            depth: 0,
        }];

        while let Some(pending) = stack.pop() {
            let n = pending.samples.len();
            let positives = pending.samples.iter().filter(|&&i| labels[i] == 1).count();

            let stop = self.config.max_depth.is_some_and(|d| pending.depth >= d)
                || n < self.config.min_samples_split
                || n < 2 * self.config.min_samples_leaf
                || positives == 0
                || positives == n
                || features.n_features() == 0;

            let split = if stop {
                None
            } else {
                let mut candidates = present_features(features, &pending.samples);
                candidates.shuffle(&mut rng);
                self.best_split(
                    features,
                    labels,
                    &pending.samples,
                    positives,
                    max_features,
                    candidates.into_iter(),
                )
            };

            match split {
                Some(split) => {
                    let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = pending
                        .samples
                        .iter()
                        .partition(|&&i| features.get(i, split.feature) <= split.threshold);

                    let left = nodes.len();
                    let right = left + 1;
                    nodes.push(TreeNode::leaf(0, 0));
                    nodes.push(TreeNode::leaf(0, 0));
                    nodes[pending.node] = TreeNode::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left,
                        right,
                    };

                    stack.push(PendingNode {
                        node: right,
                        samples: right_samples,
                        depth: pending.depth + 1,
                    });
                    stack.push(PendingNode {
                        node: left,
                        samples: left_samples,
                        depth: pending.depth + 1,
                    });
                }
                None => nodes[pending.node] = TreeNode::leaf(positives, n),
            }
        }

        self.nodes = nodes;
        Ok(())
    }

    /// Find the split with the largest impurity decrease, scoring the first
    /// `max_features` non-constant columns of `candidates`.
    ///
    /// Constant columns are skipped without counting toward `max_features`.
    fn best_split(
        &self,
        features: &FeatureMatrix,
        labels: &[u8],
        samples: &[usize],
        positives: usize,
        max_features: usize,
        candidates: impl Iterator<Item = usize>,
    ) -> Option<BestSplit> {
        let n = samples.len();
        let min_leaf = self.config.min_samples_leaf;
        let parent_impurity = gini(positives, n);
        let mut best: Option<BestSplit> = None;
        let mut scored = 0;

        for feature in candidates {
            if scored == max_features {
                break;
            }
            let mut values: Vec<(f64, u8)> = samples
                .iter()
                .map(|&i| (features.get(i, feature), labels[i]))
                .collect();

            let first = values[0].0;
            if values.iter().all(|&(v, _)| v == first) {
                continue;
            }
            scored += 1;
            values.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_positives = 0;
            for k in 0..n - 1 {
                left_positives += usize::from(values[k].1);
                if values[k].0 == values[k + 1].0 {
                    continue;
                }

                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let weighted = (n_left as f64 * gini(left_positives, n_left)
                    + n_right as f64 * gini(positives - left_positives, n_right))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if gain > MIN_IMPURITY_DECREASE && best.as_ref().is_none_or(|b| gain > b.gain) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (values[k].0 + values[k + 1].0) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }

    fn leaf_for(&self, row: &SparseVector) -> Option<&TreeNode> {
        let mut current = self.nodes.first()?;
        while let TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        } = current
        {
            let next = if row.get(*feature) <= *threshold {
                *left
            } else {
                *right
            };
            current = self.nodes.get(next)?;
        }
        Some(current)
    }

    /// Predicted class of one row; an unfitted tree predicts 0.
    pub fn predict_row(&self, row: &SparseVector) -> u8 {
        match self.leaf_for(row) {
            Some(TreeNode::Leaf { class, .. }) => *class,
            _ => 0,
        }
    }

    /// Fraction of positive training samples in the leaf reached by `row`.
    pub fn predict_proba_row(&self, row: &SparseVector) -> f64 {
        match self.leaf_for(row) {
            Some(TreeNode::Leaf {
                positive_fraction, ..
            }) => *positive_fraction,
            _ => 0.0,
        }
    }

    /// Check whether the tree has been grown.
    pub fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Length of the longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            match self.nodes.get(node) {
                Some(TreeNode::Split { left, right, .. }) => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
                Some(TreeNode::Leaf { .. }) => deepest = deepest.max(depth),
                None => {}
            }
        }
        deepest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> (FeatureMatrix, Vec<u8>) {
        let features = FeatureMatrix::from_dense(
            2,
            &[
                vec![0.0, 1.0],
                vec![0.0, 0.5],
                vec![0.9, 0.0],
                vec![0.7, 0.2],
            ],
        )
        .unwrap();
        (features, vec![0, 0, 1, 1])
    }

    fn all_features() -> TreeConfig {
        TreeConfig {
            max_features: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_fit_separable() {
        let (features, labels) = dataset();
        let mut tree = DecisionTreeClassifier::new(all_features());
        tree.fit(&features, &labels, &[0, 1, 2, 3]).unwrap();

        for (i, &label) in labels.iter().enumerate() {
            assert_eq!(tree.predict_row(features.row(i)), label);
        }
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let (features, _) = dataset();
        let mut tree = DecisionTreeClassifier::new(all_features());
        tree.fit(&features, &[0, 0, 0, 0], &[0, 1, 2, 3]).unwrap();

        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_row(features.row(2)), 0);
        assert_eq!(tree.predict_proba_row(features.row(2)), 0.0);
    }

    #[test]
    fn test_min_samples_split() {
        let (features, labels) = dataset();
        let mut tree = DecisionTreeClassifier::new(TreeConfig {
            min_samples_split: 5,
            ..all_features()
        });
        tree.fit(&features, &labels, &[0, 1, 2, 3]).unwrap();
        assert_eq!(tree.n_nodes(), 1);
    }

    #[test]
    fn test_max_depth_zero_gives_majority_leaf() {
        let (features, _) = dataset();
        let mut tree = DecisionTreeClassifier::new(TreeConfig {
            max_depth: Some(0),
            ..all_features()
        });
        tree.fit(&features, &[1, 1, 1, 0], &[0, 1, 2, 3]).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_row(features.row(3)), 1);
    }

    #[test]
    fn test_ties_predict_negative() {
        let (features, _) = dataset();
        let mut tree = DecisionTreeClassifier::new(TreeConfig {
            max_depth: Some(0),
            ..all_features()
        });
        tree.fit(&features, &[1, 0, 1, 0], &[0, 1, 2, 3]).unwrap();
        assert_eq!(tree.predict_row(features.row(0)), 0);
    }

    #[test]
    fn test_repeated_samples_weight_the_leaf() {
        let (features, labels) = dataset();
        let mut tree = DecisionTreeClassifier::new(TreeConfig {
            max_depth: Some(0),
            ..all_features()
        });
        tree.fit(&features, &labels, &[2, 2, 3, 0]).unwrap();
        assert_eq!(tree.predict_proba_row(features.row(0)), 0.75);
    }

    #[test]
    fn test_unfitted_tree_predicts_negative() {
        let (features, _) = dataset();
        let tree = DecisionTreeClassifier::new(TreeConfig::default());
        assert!(!tree.is_fitted());
        assert_eq!(tree.predict_row(features.row(2)), 0);
    }

    /// Twenty rows over 100 columns; only column 0 carries the label.
    fn sparse_dataset() -> (FeatureMatrix, Vec<u8>) {
        let labels: Vec<u8> = (0..20).map(|i| (i % 2) as u8).collect();
        let rows: Vec<Vec<f64>> = labels
            .iter()
            .map(|&label| {
                let mut row = vec![0.0; 100];
                row[0] = f64::from(label) * 0.8;
                row
            })
            .collect();
        (FeatureMatrix::from_dense(100, &rows).unwrap(), labels)
    }

    #[test]
    fn test_constant_columns_do_not_use_up_max_features() {
        let (features, labels) = sparse_dataset();
        let samples: Vec<usize> = (0..20).collect();

        for seed in 0..50 {
            let mut tree = DecisionTreeClassifier::new(TreeConfig {
                max_features: 10,
                seed,
                ..Default::default()
            });
            tree.fit(&features, &labels, &samples).unwrap();

            assert_eq!(tree.n_leaves(), 2, "seed {seed}");
            for (i, &label) in labels.iter().enumerate() {
                assert_eq!(tree.predict_row(features.row(i)), label);
            }
        }
    }

    #[test]
    fn test_present_features() {
        let (features, _) = dataset();
        assert_eq!(present_features(&features, &[0, 1]), vec![1]);
        assert_eq!(present_features(&features, &[1, 3]), vec![0, 1]);
    }

    #[test]
    fn test_label_length_mismatch() {
        let (features, _) = dataset();
        let mut tree = DecisionTreeClassifier::new(TreeConfig::default());
        let result = tree.fit(&features, &[0, 1], &[0, 1]);
        assert!(matches!(result, Err(TriageError::Data(_))));
    }
}
