//! Multi-output random forest evaluation.
//!
//! The classifier artifact holds one forest per predicted target. Trees are
//! stored as flat node arrays in the usual exported layout: node 0 is the
//! root and children always come after their parent. A sample goes left
//! when `x[feature] <= threshold`.

use serde::{Deserialize, Serialize};

use crate::{ModelError, RawPrediction};

/// A node of an exported decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Internal split.
    Split {
        /// Feature index.
        feature: usize,
        /// Split threshold.
        threshold: f64,
        /// Node index taken when `x[feature] <= threshold`.
        left: usize,
        /// Node index taken otherwise.
        right: usize,
    },
    /// Terminal node with per-class training weights.
    Leaf {
        /// Class weights, aligned with the output's `classes`.
        value: Vec<f64>,
    },
}

/// One exported decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {index} splits on feature {feature}, transform emits {n_features}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {index} has threshold {threshold}"));
                    }
                    for child in [left, right] {
                        if *child <= index || *child >= self.nodes.len() {
                            return Err(format!("node {index} points to invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "leaf {index} has {} weights for {n_classes} classes",
                            value.len()
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    fn leaf(&self, features: &[f64]) -> Result<&[f64], ModelError> {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(value.as_slice()),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).copied().ok_or_else(|| {
                        ModelError::InvalidArtifact {
                            message: format!("feature {feature} out of range"),
                        }
                    })?;
                    let next = if x <= *threshold { *left } else { *right };
                    if next <= index {
                        return Err(ModelError::InvalidArtifact {
                            message: format!("node {index} points backwards to {next}"),
                        });
                    }
                    index = next;
                }
                None => {
                    return Err(ModelError::InvalidArtifact {
                        message: format!("node {index} does not exist"),
                    });
                }
            }
        }
    }
}

/// The forest for a single predicted target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestOutput {
    #[serde(default)]
    name: String,
    classes: Vec<f64>,
    trees: Vec<DecisionTree>,
}

impl ForestOutput {
    /// Target name, e.g. `Arrest`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class values, in leaf weight order.
    #[must_use]
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Averages the trees' normalized leaf distributions and returns the
    /// class with the highest mean probability. Ties go to the first class.
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        let mut probabilities = vec![0.0; self.classes.len()];

        for tree in &self.trees {
            let weights = tree.leaf(features)?;
            let total: f64 = weights.iter().sum();
            if total > 0.0 {
                for (p, w) in probabilities.iter_mut().zip(weights) {
                    *p += w / total;
                }
            }
        }

        let mut best = 0;
        for (i, p) in probabilities.iter().enumerate() {
            if *p > probabilities[best] {
                best = i;
            }
        }

        self.classes
            .get(best)
            .copied()
            .ok_or(ModelError::EmptyPrediction)
    }
}

/// A multi-output classifier: one forest per target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiOutputForest {
    outputs: Vec<ForestOutput>,
}

impl MultiOutputForest {
    /// Per-target forests, in output column order.
    #[must_use]
    pub fn outputs(&self) -> &[ForestOutput] {
        &self.outputs
    }

    /// Total number of trees across all targets.
    #[must_use]
    pub fn tree_count(&self) -> usize {
        self.outputs.iter().map(|o| o.trees.len()).sum()
    }

    /// Checks the forest against the width of the feature transform.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidArtifact`] describing the first problem.
    pub fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        if self.outputs.is_empty() {
            return Err(ModelError::InvalidArtifact {
                message: "classifier has no outputs".to_string(),
            });
        }

        for (o, output) in self.outputs.iter().enumerate() {
            let context = |detail: String| ModelError::InvalidArtifact {
                message: format!("output {o} ({}): {detail}", output.name),
            };

            if output.classes.is_empty() {
                return Err(context("no classes".to_string()));
            }
            if output.trees.is_empty() {
                return Err(context("no trees".to_string()));
            }
            for (t, tree) in output.trees.iter().enumerate() {
                tree.validate(n_features, output.classes.len())
                    .map_err(|e| context(format!("tree {t}: {e}")))?;
            }
        }

        Ok(())
    }

    /// Predicts every target for one feature vector. The result is a single
    /// row with one column per target.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if a tree cannot be evaluated.
    pub fn predict(&self, features: &[f64]) -> Result<RawPrediction, ModelError> {
        let row = self
            .outputs
            .iter()
            .map(|output| output.predict(features))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RawPrediction::Matrix(vec![row]))
    }
}
