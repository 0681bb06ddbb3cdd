use serde::{Deserialize, Serialize};

use super::train::ForestOptions;
use crate::ml::RegressionModel;

/// Current serialized layout of [`RandomForestModel`].
pub const FOREST_MODEL_VERSION: i64 = 1;

/// Tree node stored in a flat array; the root lives at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Internal split: `feature <= threshold` goes left.
    Split {
        feature: u16,
        threshold: f64,
        left: u32,
        right: u32,
    },
    /// Terminal prediction.
    Leaf { value: f64 },
}

/// Single regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<Node>,
}

impl RegressionTree {
    /// Walk from the root to a leaf for a feature vector.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature as usize).copied().unwrap_or(0.0);
                    idx = if value <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                None => return f64::NAN,
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left as usize).max(walk(nodes, *right as usize))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {idx} has a non-finite value"));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature as usize >= n_features {
                        return Err(format!("node {idx} splits on unknown feature {feature}"));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {idx} has a NaN threshold"));
                    }
                    // Children are always appended after their parent, which also rules out cycles.
                    for child in [*left as usize, *right as usize] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {idx} points at invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Averaged ensemble of regression trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestModel {
    /// Model format version.
    pub model_version: i64,
    /// Positional feature names, in training order.
    pub feature_names: Vec<String>,
    /// Hyperparameters the model was fitted with.
    pub options: ForestOptions,
    pub trees: Vec<RegressionTree>,
}

impl RandomForestModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.model_version != FOREST_MODEL_VERSION {
            return Err(format!(
                "Unsupported model_version {} (expected {FOREST_MODEL_VERSION})",
                self.model_version
            ));
        }
        if self.feature_names.is_empty() {
            return Err("Model must name at least one feature".to_string());
        }
        if self.trees.is_empty() {
            return Err("Model must contain at least one tree".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_names.len())
                .map_err(|err| format!("Tree {tree_idx}: {err}"))?;
        }
        Ok(())
    }
}

impl RegressionModel for RandomForestModel {
    fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        total / self.trees.len().max(1) as f64
    }
}
