//! Load-once handle around the classifier artifact.
//!
//! Workers share one `ModelHandle` (behind an `Arc`). The first `load()` reads
//! the artifact while holding a guard; concurrent callers wait on the guard and
//! then see the finished model. `get()` never waits: before loading completes
//! it reports `ModelUnavailable`, which callers may retry.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};

use super::GlyphClassifier;
use super::forest::RandomForest;
use crate::error::RecognizeError;
use crate::ocr::GlyphShape;

pub struct ModelHandle {
    source: PathBuf,
    expected_shape: Option<GlyphShape>,
    model: OnceLock<Arc<RandomForest>>,
    load_guard: Mutex<()>,
}

impl ModelHandle {
    /// Creates an unloaded handle for the artifact at `source`.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            expected_shape: None,
            model: OnceLock::new(),
            load_guard: Mutex::new(()),
        }
    }

    /// Creates a handle that is already loaded with `model`.
    pub fn from_model(model: RandomForest) -> Self {
        let handle = Self::new(PathBuf::new());
        let _ = handle.model.set(Arc::new(model));
        handle
    }

    /// Requires the loaded model's glyph shape to equal `shape`.
    pub fn with_shape(mut self, shape: GlyphShape) -> Self {
        self.expected_shape = Some(shape);
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// Returns the model if loading has finished.
    pub fn get(&self) -> Result<Arc<RandomForest>, RecognizeError> {
        self.model
            .get()
            .cloned()
            .ok_or(RecognizeError::ModelUnavailable)
    }

    /// Loads the model if needed and returns it. Blocks while another thread
    /// is loading. A failed load leaves the handle empty.
    pub fn load(&self) -> Result<Arc<RandomForest>, RecognizeError> {
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }

        let _guard = self
            .load_guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Another thread may have finished while we waited.
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }

        crate::log(&format!("Loading classifier from {}", self.source.display()));
        let forest = RandomForest::load(&self.source)?;

        if let Some(expected) = self.expected_shape {
            let actual = forest.glyph_shape();
            if actual != expected {
                return Err(RecognizeError::model(format!(
                    "model glyph shape {}x{} does not match configured {}x{}",
                    actual.rows, actual.cols, expected.rows, expected.cols
                )));
            }
        }

        crate::log(&format!(
            "Classifier ready: {} trees, {} classes",
            forest.trees.len(),
            forest.classes.len()
        ));

        let model = Arc::new(forest);
        let _ = self.model.set(Arc::clone(&model));
        Ok(model)
    }

    /// Starts loading on a background thread.
    pub fn spawn_load(self: &Arc<Self>) -> JoinHandle<Result<Arc<RandomForest>, RecognizeError>> {
        let handle = Arc::clone(self);
        thread::spawn(move || handle.load())
    }
}
