//! Random forest crime type classifier evaluated from a JSON export.
//!
//! Each tree is a flat node array rooted at index 0. A split sends the
//! sample left when `features[feature] <= threshold`. Leaves carry per-class
//! weights; the forest averages the normalized leaf distributions and picks
//! the class with the highest mean (ties go to the lower index).

use std::path::Path;

use crime_insight_risk_models::{FEATURE_NAMES, FeatureVector};
use serde::Deserialize;

use crate::{
    ArtifactError, CrimeTypeModel, InferenceError, ModelUnavailableError, ensure_finite,
    load_artifact,
};

/// Serialized random forest.
#[derive(Debug, Clone, Deserialize)]
pub struct RandomForestArtifact {
    /// Column names the forest was trained with.
    #[serde(default)]
    pub feature_names: Vec<String>,
    /// Class id for each leaf value column.
    pub classes: Vec<i64>,
    /// Member trees.
    pub trees: Vec<DecisionTree>,
}

/// A single tree as a flat node array.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    /// Nodes; index 0 is the root.
    pub nodes: Vec<TreeNode>,
}

/// A decision tree node.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Internal node.
    Split {
        /// Index into the feature vector.
        feature: usize,
        /// Samples with `value <= threshold` go left.
        threshold: f64,
        /// Left child index.
        left: usize,
        /// Right child index.
        right: usize,
    },
    /// Terminal node.
    Leaf {
        /// Per-class weights (sample counts or probabilities).
        value: Vec<f64>,
    },
}

/// A validated random forest implementing [`CrimeTypeModel`].
#[derive(Debug, Clone)]
pub struct RandomForestModel {
    classes: Vec<i64>,
    trees: Vec<DecisionTree>,
}

impl RandomForestModel {
    /// Loads and validates a forest artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ModelUnavailableError`] if the file is missing, malformed,
    /// or structurally inconsistent.
    pub fn load(path: &Path) -> Result<Self, ModelUnavailableError> {
        let artifact: RandomForestArtifact = load_artifact("crime type", path)?;
        let model = Self::from_artifact(artifact)
            .map_err(|e| ModelUnavailableError::new("crime type", path, e))?;
        log::info!(
            "Loaded crime type forest: {} trees, {} classes",
            model.trees.len(),
            model.classes.len()
        );
        Ok(model)
    }

    /// Validates an in-memory artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Invalid`] if the forest is empty, a tree
    /// references a feature or child out of range, a child does not come
    /// after its parent, or a leaf width differs from the class count.
    pub fn from_artifact(artifact: RandomForestArtifact) -> Result<Self, ArtifactError> {
        let invalid = |message: String| ArtifactError::Invalid { message };

        if artifact.classes.is_empty() {
            return Err(invalid("forest has no classes".to_string()));
        }
        if artifact.trees.is_empty() {
            return Err(invalid("forest has no trees".to_string()));
        }

        if !artifact.feature_names.is_empty()
            && artifact
                .feature_names
                .iter()
                .map(String::as_str)
                .ne(FEATURE_NAMES.iter().copied())
        {
            log::warn!(
                "Crime type model feature names {:?} differ from the expected order {FEATURE_NAMES:?}",
                artifact.feature_names
            );
        }

        let n_classes = artifact.classes.len();
        for (t, tree) in artifact.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(invalid(format!("tree {t} has no nodes")));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature >= FeatureVector::LEN {
                            return Err(invalid(format!(
                                "tree {t} node {i} splits on feature {feature}, expected < {}",
                                FeatureVector::LEN
                            )));
                        }
                        if threshold.is_nan() {
                            return Err(invalid(format!("tree {t} node {i} has a NaN threshold")));
                        }
                        for child in [*left, *right] {
                            if child <= i || child >= tree.nodes.len() {
                                return Err(invalid(format!(
                                    "tree {t} node {i} has invalid child index {child}"
                                )));
                            }
                        }
                    }
                    TreeNode::Leaf { value } => {
                        if value.len() != n_classes {
                            return Err(invalid(format!(
                                "tree {t} leaf {i} has {} values, expected {n_classes}",
                                value.len()
                            )));
                        }
                    }
                }
            }
        }

        Ok(Self {
            classes: artifact.classes,
            trees: artifact.trees,
        })
    }

    /// Mean class distribution over all trees.
    fn distribution(&self, features: &[f64; FeatureVector::LEN]) -> Vec<f64> {
        let mut totals = vec![0.0; self.classes.len()];

        for tree in &self.trees {
            let leaf = walk(tree, features);
            let sum: f64 = leaf.iter().sum();
            if sum > 0.0 {
                for (total, weight) in totals.iter_mut().zip(leaf) {
                    *total += weight / sum;
                }
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let n_trees = self.trees.len() as f64;
        for total in &mut totals {
            *total /= n_trees;
        }
        totals
    }
}

/// Follows splits from the root to a leaf. Validation guarantees child
/// indices increase, so the walk terminates.
fn walk<'a>(tree: &'a DecisionTree, features: &[f64; FeatureVector::LEN]) -> &'a [f64] {
    let mut idx = 0;
    loop {
        match &tree.nodes[idx] {
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
            TreeNode::Leaf { value } => return value,
        }
    }
}

impl CrimeTypeModel for RandomForestModel {
    fn predict(&self, features: &FeatureVector) -> Result<i64, InferenceError> {
        ensure_finite(features)?;

        let distribution = self.distribution(&features.to_array());

        let mut best = 0;
        for (i, p) in distribution.iter().enumerate() {
            if *p > distribution[best] {
                best = i;
            }
        }

        Ok(self.classes[best])
    }
}
