use thiserror::Error;

/// Failures of the recognition pipeline for a single image.
///
/// An image with no recognizable symbols is not an error; it yields
/// [`RecognitionResult::empty`](crate::ocr::RecognitionResult::empty).
#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("invalid input image: {message}")]
    Input { message: String },

    #[error(
        "glyph of {height}x{width} pixels at ({left}, {top}) exceeds the {rows}x{cols} classifier capacity"
    )]
    ShapeOverflow {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        rows: u32,
        cols: u32,
    },

    #[error("classifier model is not loaded yet")]
    ModelUnavailable,

    #[error("classifier model error: {message}")]
    Model { message: String },
}

impl RecognizeError {
    pub(crate) fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    pub(crate) fn model(message: impl Into<String>) -> Self {
        Self::Model {
            message: message.into(),
        }
    }

    /// True for conditions the caller may retry once loading completes.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ModelUnavailable)
    }
}
