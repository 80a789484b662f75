//! Image-to-digits pipeline.
//!
//! color filter → segmentation → normalization → classification → assembly

pub mod assemble;
pub mod bitmap;
pub mod normalize;
pub mod preprocess;
pub mod segment;

pub use assemble::{assemble, RecognitionResult, SymbolPrediction};
pub use bitmap::Bitmap;
pub use normalize::{normalize_symbol, pad_to_shape, GlyphShape};
pub use preprocess::{crop_region, filter_color_range, ColorRange, Region};
pub use segment::{find_components, BoundingBox, Symbol};

use image::RgbImage;
use std::path::Path;

use crate::classifier::{GlyphClassifier, ModelHandle};
use crate::config::{OverflowPolicy, SortAxis};
use crate::error::RecognizeError;

/// Per-call pipeline settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecognizeOptions {
    pub color_range: ColorRange,
    pub reserved_class: u32,
    pub sort_axis: SortAxis,
    pub overflow_policy: OverflowPolicy,
    /// Components with fewer pixels are dropped before classification (0 keeps all)
    pub min_component_pixels: usize,
}

impl Default for RecognizeOptions {
    fn default() -> Self {
        Self {
            color_range: ColorRange::default(),
            reserved_class: 10,
            sort_axis: SortAxis::default(),
            overflow_policy: OverflowPolicy::default(),
            min_component_pixels: 0,
        }
    }
}

/// Opens an image file as 8-bit RGB.
pub fn load_image(path: &Path) -> Result<RgbImage, RecognizeError> {
    let img = image::open(path).map_err(|e| {
        RecognizeError::input(format!("failed to load {}: {}", path.display(), e))
    })?;
    Ok(img.to_rgb8())
}

/// Decodes an in-memory image (e.g. an upload) as 8-bit RGB.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, RecognizeError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| RecognizeError::input(format!("failed to decode image: {}", e)))?;
    Ok(img.to_rgb8())
}

/// Segments the text pixels of `img` into glyphs, in row-major discovery order.
pub fn extract_symbols(img: &RgbImage, range: &ColorRange) -> Vec<Symbol> {
    let mask = filter_color_range(img, range);
    find_components(mask)
}

/// Runs the full pipeline on one image.
///
/// An image without recognizable digits yields [`RecognitionResult::empty`].
pub fn recognize(
    img: &RgbImage,
    classifier: &dyn GlyphClassifier,
    options: &RecognizeOptions,
) -> Result<RecognitionResult, RecognizeError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(RecognizeError::input("image is empty"));
    }

    let symbols = extract_symbols(img, &options.color_range);
    let found = symbols.len();
    let shape = classifier.glyph_shape();

    let mut predictions = Vec::with_capacity(found);
    for symbol in symbols {
        if symbol.bitmap.count_on() < options.min_component_pixels {
            continue;
        }
        let Some(glyph) = normalize_symbol(&symbol, shape, options.overflow_policy)? else {
            continue;
        };
        let prediction = classifier.classify(&glyph)?;
        predictions.push(SymbolPrediction {
            class_id: prediction.class_id,
            bbox: symbol.bbox,
            confidence: prediction.confidence,
        });
    }

    let classified = predictions.len();
    let result = assemble(predictions, options.reserved_class, options.sort_axis);

    crate::log(&format!(
        "Recognized {:?} ({} of {} components, {} classified, conf {:.3})",
        result.text, result.count, found, classified, result.confidence
    ));

    Ok(result)
}

/// Runs the pipeline with the model held by `handle`.
///
/// Fails with `ModelUnavailable` until the handle has finished loading.
pub fn recognize_with_handle(
    img: &RgbImage,
    handle: &ModelHandle,
    options: &RecognizeOptions,
) -> Result<RecognitionResult, RecognizeError> {
    let model = handle.get()?;
    recognize(img, model.as_ref(), options)
}
