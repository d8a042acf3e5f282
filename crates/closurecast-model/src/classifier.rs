//! Predictive model trait and the built-in binary classifiers

use closurecast_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Trait for all trained binary classifiers
pub trait PredictiveModel: Send + Sync {
    /// Probability of the positive (closure) class for one sample
    fn predict_proba(&self, features: &[f64]) -> Result<f64>;

    /// Number of input features the model was trained on
    fn n_features(&self) -> usize;

    /// Get the model kind, for logs
    fn name(&self) -> &str;

    /// Reject inputs whose width disagrees with the model
    fn check_shape(&self, features: &[f64]) -> Result<()> {
        if features.len() != self.n_features() {
            return Err(Error::ShapeMismatch {
                expected: self.n_features(),
                actual: features.len(),
            });
        }
        Ok(())
    }
}

/// Logistic regression: `sigmoid(intercept + w · x)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LogisticModel {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }
}

impl PredictiveModel for LogisticModel {
    fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        self.check_shape(features)?;

        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>();

        Ok(sigmoid(z))
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn name(&self) -> &str {
        "logistic"
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// A node of a fitted decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Positive-class probability at a leaf
    Leaf { leaf: f64 },

    /// Go `left` when `x[feature] <= threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One decision tree stored as a flat node array rooted at index 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Check that every split references an in-range feature and node, and
    /// that children come after their parent so traversal always terminates.
    pub fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::config("decision tree has no nodes"));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Leaf { leaf } = node {
                if !(0.0..=1.0).contains(leaf) {
                    return Err(Error::config(format!(
                        "node {} has leaf value {} outside [0, 1]",
                        idx, leaf
                    )));
                }
            }

            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(Error::config(format!(
                        "node {} splits on feature {} but the model has {} features",
                        idx, feature, n_features
                    )));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(Error::config(format!(
                            "node {} has invalid child index {}",
                            idx, child
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn leaf_value(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { leaf } => return *leaf,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Tree ensemble averaging per-tree leaf probabilities (random forest)
#[derive(Debug, Clone)]
pub struct ForestModel {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl ForestModel {
    /// Create a validated forest
    pub fn new(n_features: usize, trees: Vec<DecisionTree>) -> Result<Self> {
        if trees.is_empty() {
            return Err(Error::config("forest model has no trees"));
        }
        for tree in &trees {
            tree.validate(n_features)?;
        }

        Ok(Self { n_features, trees })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl PredictiveModel for ForestModel {
    fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        self.check_shape(features)?;

        let total: f64 = self.trees.iter().map(|t| t.leaf_value(features)).sum();
        Ok(total / self.trees.len() as f64)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn name(&self) -> &str {
        "forest"
    }
}
