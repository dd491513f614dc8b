//! Gradient-boosted regression trees
//!
//! Second-order boosting on squared error with L2-regularized leaf weights
//! and exact greedy split search, following the XGBoost formulation:
//! a leaf with gradient sum `G` and hessian sum `H` gets weight `-G / (H + lambda)`,
//! and a split is kept only when its loss reduction exceeds `gamma`.

use crate::{mean, MathError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Hyperparameters for [`GradientBoostedRegressor`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to every leaf weight
    pub learning_rate: f64,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// L2 regularization on leaf weights
    pub lambda: f64,
    /// Minimum loss reduction required to split
    pub gamma: f64,
    /// Minimum hessian sum in each child
    pub min_child_weight: f64,
    /// Fraction of rows sampled per round
    pub subsample: f64,
    /// Seed for row subsampling
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
            subsample: 1.0,
            seed: 42,
        }
    }
}

impl BoostingParams {
    /// Validate hyperparameters
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(MathError::InvalidInput(
                "n_estimators must be positive".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(MathError::InvalidInput(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if self.max_depth == 0 {
            return Err(MathError::InvalidInput(
                "max_depth must be positive".to_string(),
            ));
        }
        if self.lambda < 0.0 || self.gamma < 0.0 || self.min_child_weight < 0.0 {
            return Err(MathError::InvalidInput(
                "lambda, gamma and min_child_weight must be non-negative".to_string(),
            ));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(MathError::InvalidInput(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single fitted regression tree
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Predict the (already shrunk) leaf value for one row
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] < *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Depth of the deepest leaf, 0 for a single leaf
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    params: &'a BoostingParams,
    features: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    nodes: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.lambda)
    }

    fn leaf_value(&self, g: f64, h: f64) -> f64 {
        -g / (h + self.params.lambda) * self.params.learning_rate
    }

    fn build(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let g: f64 = rows.iter().map(|&r| self.grad[r]).sum();
        let h: f64 = rows.iter().map(|&r| self.hess[r]).sum();

        let split = if depth < self.params.max_depth && !rows.is_empty() {
            self.best_split(&rows, g, h)
        } else {
            None
        };

        let Some(split) = split else {
            self.nodes.push(Node::Leaf {
                value: self.leaf_value(g, h),
            });
            return self.nodes.len() - 1;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| self.features[r][split.feature] < split.threshold);

        // Reserve the slot so the parent precedes its children
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { value: 0.0 });
        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    fn best_split(&self, rows: &[usize], g: f64, h: f64) -> Option<SplitCandidate> {
        let parent_score = self.score(g, h);
        let n_features = self.features[rows[0]].len();
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..n_features {
            let mut sorted = rows.to_vec();
            sorted.sort_by(|&a, &b| self.features[a][feature].total_cmp(&self.features[b][feature]));

            let mut g_left = 0.0;
            let mut h_left = 0.0;
            for window in 0..sorted.len() - 1 {
                let row = sorted[window];
                g_left += self.grad[row];
                h_left += self.hess[row];

                let current = self.features[row][feature];
                let next = self.features[sorted[window + 1]][feature];
                if next <= current {
                    continue;
                }

                let g_right = g - g_left;
                let h_right = h - h_left;
                if h_left < self.params.min_child_weight || h_right < self.params.min_child_weight {
                    continue;
                }

                let gain = 0.5
                    * (self.score(g_left, h_left) + self.score(g_right, h_right) - parent_score)
                    - self.params.gamma;
                if gain <= 1e-12 {
                    continue;
                }
                if best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: split_threshold(current, next),
                        gain,
                    });
                }
            }
        }

        best
    }
}

/// Midpoint of two distinct sorted values, kept strictly above `current`.
///
/// Adjacent floats can have a midpoint that rounds down to `current`, which
/// would send every row to the right child.
fn split_threshold(current: f64, next: f64) -> f64 {
    let mid = current + (next - current) / 2.0;
    if mid > current && mid <= next {
        mid
    } else {
        next
    }
}

/// Gradient-boosted regression tree ensemble with squared-error loss
#[derive(Debug, Clone)]
pub struct GradientBoostedRegressor {
    base_score: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl GradientBoostedRegressor {
    /// Fit an ensemble to `features` (one row per sample) and `target`
    pub fn fit(params: &BoostingParams, features: &[Vec<f64>], target: &[f64]) -> Result<Self> {
        params.validate()?;
        if features.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot fit a regressor on zero rows".to_string(),
            ));
        }
        if features.len() != target.len() {
            return Err(MathError::InvalidInput(format!(
                "Feature rows ({}) don't match target length ({})",
                features.len(),
                target.len()
            )));
        }
        let n_features = features[0].len();
        if n_features == 0 || features.iter().any(|row| row.len() != n_features) {
            return Err(MathError::InvalidInput(
                "Every feature row must have the same non-zero width".to_string(),
            ));
        }
        if features.iter().flatten().chain(target.iter()).any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Features and target must be finite".to_string(),
            ));
        }

        let base_score = mean(target).unwrap_or(0.0);
        let mut predictions = vec![base_score; target.len()];
        let hess = vec![1.0; target.len()];
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let grad: Vec<f64> = predictions
                .iter()
                .zip(target.iter())
                .map(|(p, y)| p - y)
                .collect();

            let mut rows: Vec<usize> = if params.subsample < 1.0 {
                (0..target.len())
                    .filter(|_| rng.gen::<f64>() < params.subsample)
                    .collect()
            } else {
                (0..target.len()).collect()
            };
            if rows.is_empty() {
                rows.push(rng.gen_range(0..target.len()));
            }

            let mut builder = TreeBuilder {
                params,
                features,
                grad: &grad,
                hess: &hess,
                nodes: Vec::new(),
            };
            builder.build(rows, 0);
            let tree = RegressionTree {
                nodes: builder.nodes,
            };

            for (p, row) in predictions.iter_mut().zip(features.iter()) {
                *p += tree.predict(row);
            }
            trees.push(tree);
        }

        Ok(Self {
            base_score,
            trees,
            n_features,
        })
    }

    /// Predict a single row
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(MathError::InvalidInput(format!(
                "Expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        Ok(self.base_score + self.trees.iter().map(|t| t.predict(row)).sum::<f64>())
    }

    /// Predict many rows
    pub fn predict_many(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    /// Fitted trees
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Initial prediction before any tree is added
    pub fn base_score(&self) -> f64 {
        self.base_score
    }
}
