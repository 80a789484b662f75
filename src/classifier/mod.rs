//! Glyph classification.
//!
//! This module provides:
//! - The `GlyphClassifier` seam the pipeline classifies through
//! - A decision-forest model read from a JSON artifact
//! - A load-once handle for sharing the model between workers
//! - Artifact lookup and first-run download

pub mod forest;
pub mod handle;
pub mod setup;

pub use forest::{DecisionTree, RandomForest, TreeNode};
pub use handle::ModelHandle;
pub use setup::{ensure_model, open_model};

use crate::error::RecognizeError;
use crate::ocr::{Bitmap, GlyphShape};

/// A classifier's verdict for one glyph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub class_id: u32,
    /// Probability of `class_id`, if the classifier produces probabilities
    pub confidence: Option<f32>,
}

/// Maps a normalized glyph bitmap to a class id.
///
/// Implementations are read-only once built, so one instance can serve any
/// number of threads.
pub trait GlyphClassifier: Send + Sync {
    /// Shape every glyph must be normalized to before `classify`.
    fn glyph_shape(&self) -> GlyphShape;

    /// Classifies one glyph of exactly `glyph_shape()` size.
    fn classify(&self, glyph: &Bitmap) -> Result<Prediction, RecognizeError>;
}
