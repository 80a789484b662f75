//! Decision-forest inference.
//!
//! The artifact is a JSON document listing the class ids and, per tree, a flat
//! node array with the root at index 0. A split sends the sample to `left`
//! when `features[feature] <= threshold` and to `right` otherwise. A leaf
//! holds per-class sample counts (or fractions) in `classes` order. The
//! forest's class probabilities are the mean of each tree's normalized leaf.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::{GlyphClassifier, Prediction};
use crate::error::RecognizeError;
use crate::ocr::{Bitmap, GlyphShape};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f32>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walks from the root to the leaf reached by `features`.
    fn leaf(&self, features: &[f32]) -> Result<&[f32], RecognizeError> {
        let mut idx = 0;
        // A valid tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).copied().ok_or_else(|| {
                        RecognizeError::model(format!("split on missing feature {}", feature))
                    })?;
                    idx = if x <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { value }) => return Ok(value),
                None => {
                    return Err(RecognizeError::model(format!(
                        "node index {} out of range",
                        idx
                    )));
                }
            }
        }
        Err(RecognizeError::model("tree contains a cycle"))
    }
}

/// Pretrained decision-tree ensemble over flattened glyph bitmaps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub glyph_rows: u32,
    pub glyph_cols: u32,
    /// Class id of each probability slot
    pub classes: Vec<u32>,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Reads and validates an artifact file.
    pub fn load(path: &Path) -> Result<Self, RecognizeError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            RecognizeError::model(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
            .map_err(|e| RecognizeError::model(format!("{}: {}", path.display(), e)))
    }

    /// Parses and validates an artifact document.
    pub fn from_json(json: &str) -> Result<Self, RecognizeError> {
        let forest: RandomForest = serde_json::from_str(json)
            .map_err(|e| RecognizeError::model(format!("malformed forest: {}", e)))?;
        forest.validate()?;
        Ok(forest)
    }

    /// Number of features a sample must have.
    pub fn feature_len(&self) -> usize {
        self.glyph_rows as usize * self.glyph_cols as usize
    }

    /// Checks that every tree can be walked for any input.
    pub fn validate(&self) -> Result<(), RecognizeError> {
        if self.glyph_rows == 0 || self.glyph_cols == 0 {
            return Err(RecognizeError::model("glyph shape must be non-empty"));
        }
        if self.classes.is_empty() {
            return Err(RecognizeError::model("forest has no classes"));
        }
        if self.trees.is_empty() {
            return Err(RecognizeError::model("forest has no trees"));
        }

        let n_features = self.feature_len();
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(RecognizeError::model(format!("tree {} is empty", t)));
            }
            for (n, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        if *feature >= n_features {
                            return Err(RecognizeError::model(format!(
                                "tree {} node {}: feature {} out of range (< {})",
                                t, n, feature, n_features
                            )));
                        }
                        if *left >= tree.nodes.len() || *right >= tree.nodes.len() {
                            return Err(RecognizeError::model(format!(
                                "tree {} node {}: child index out of range",
                                t, n
                            )));
                        }
                    }
                    TreeNode::Leaf { value } => {
                        if value.len() != self.classes.len() {
                            return Err(RecognizeError::model(format!(
                                "tree {} node {}: leaf has {} values for {} classes",
                                t,
                                n,
                                value.len(),
                                self.classes.len()
                            )));
                        }
                        let sum: f32 = value.iter().sum();
                        if value.iter().any(|v| *v < 0.0) || sum <= 0.0 {
                            return Err(RecognizeError::model(format!(
                                "tree {} node {}: leaf values must be non-negative with a positive sum",
                                t, n
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Mean class probabilities over all trees, in `classes` order.
    pub fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, RecognizeError> {
        if features.len() != self.feature_len() {
            return Err(RecognizeError::model(format!(
                "expected {} features, got {}",
                self.feature_len(),
                features.len()
            )));
        }

        let mut proba = vec![0.0f32; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf(features)?;
            let total: f32 = leaf.iter().sum();
            for (p, v) in proba.iter_mut().zip(leaf) {
                *p += v / total;
            }
        }

        let n_trees = self.trees.len() as f32;
        for p in proba.iter_mut() {
            *p /= n_trees;
        }
        Ok(proba)
    }

    /// Most probable class (first one on ties) and its probability.
    pub fn predict(&self, features: &[f32]) -> Result<Prediction, RecognizeError> {
        let proba = self.predict_proba(features)?;

        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }

        Ok(Prediction {
            class_id: self.classes[best],
            confidence: Some(proba[best]),
        })
    }
}

impl GlyphClassifier for RandomForest {
    fn glyph_shape(&self) -> GlyphShape {
        GlyphShape {
            rows: self.glyph_rows,
            cols: self.glyph_cols,
        }
    }

    fn classify(&self, glyph: &Bitmap) -> Result<Prediction, RecognizeError> {
        self.predict(&glyph.to_features())
    }
}
