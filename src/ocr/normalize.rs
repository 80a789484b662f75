use serde::{Deserialize, Serialize};

use super::bitmap::Bitmap;
use super::segment::Symbol;
use crate::config::OverflowPolicy;
use crate::error::RecognizeError;

/// Fixed glyph capacity the classifier was trained on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphShape {
    pub rows: u32,
    pub cols: u32,
}

impl Default for GlyphShape {
    fn default() -> Self {
        Self { rows: 17, cols: 10 }
    }
}

impl GlyphShape {
    /// Length of the flattened feature vector.
    pub fn feature_len(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// True if a bitmap of this size can be padded without losing pixels.
    pub fn fits(&self, bitmap: &Bitmap) -> bool {
        bitmap.height() <= self.rows && bitmap.width() <= self.cols
    }
}

/// Copies `bitmap` into a `shape`-sized grid anchored at the top-left.
///
/// Cells beyond the original are off; cells of the original beyond the shape
/// are dropped.
pub fn pad_to_shape(bitmap: &Bitmap, shape: GlyphShape) -> Bitmap {
    let mut padded = Bitmap::new(shape.cols, shape.rows);
    for y in 0..bitmap.height().min(shape.rows) {
        for x in 0..bitmap.width().min(shape.cols) {
            if bitmap.get(x, y) {
                padded.set(x, y, true);
            }
        }
    }
    padded
}

/// Normalizes one segmented glyph for classification.
///
/// Returns `Ok(None)` when the glyph is oversized and the policy is `Skip`.
pub fn normalize_symbol(
    symbol: &Symbol,
    shape: GlyphShape,
    policy: OverflowPolicy,
) -> Result<Option<Bitmap>, RecognizeError> {
    if shape.fits(&symbol.bitmap) {
        return Ok(Some(pad_to_shape(&symbol.bitmap, shape)));
    }

    let bbox = symbol.bbox;
    match policy {
        OverflowPolicy::Reject => Err(RecognizeError::ShapeOverflow {
            left: bbox.left,
            top: bbox.top,
            width: bbox.width,
            height: bbox.height,
            rows: shape.rows,
            cols: shape.cols,
        }),
        OverflowPolicy::Clip => {
            crate::log(&format!(
                "Clipping {}x{} glyph at ({}, {}) to {}x{}",
                bbox.height, bbox.width, bbox.left, bbox.top, shape.rows, shape.cols
            ));
            Ok(Some(pad_to_shape(&symbol.bitmap, shape)))
        }
        OverflowPolicy::Skip => {
            crate::log(&format!(
                "Skipping {}x{} glyph at ({}, {}): exceeds {}x{}",
                bbox.height, bbox.width, bbox.left, bbox.top, shape.rows, shape.cols
            ));
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::segment::BoundingBox;

    fn symbol(bitmap: Bitmap) -> Symbol {
        Symbol {
            bbox: BoundingBox {
                left: 7,
                top: 3,
                width: bitmap.width(),
                height: bitmap.height(),
            },
            bitmap,
        }
    }

    #[test]
    fn test_padding_keeps_original_at_origin() {
        let original = Bitmap::from_pattern(&["##.", ".#.", "#.#"]);
        let shape = GlyphShape { rows: 5, cols: 4 };

        let padded = pad_to_shape(&original, shape);

        assert_eq!((padded.width(), padded.height()), (4, 5));
        for y in 0..shape.rows {
            for x in 0..shape.cols {
                let expected = x < 3 && y < 3 && original.get(x, y);
                assert_eq!(padded.get(x, y), expected, "cell ({}, {})", x, y);
            }
        }
        assert_eq!(padded.count_on(), original.count_on());
    }

    #[test]
    fn test_default_shape_is_17_rows_by_10_cols() {
        let padded = pad_to_shape(&Bitmap::from_pattern(&["#"]), GlyphShape::default());

        assert_eq!(padded.height(), 17);
        assert_eq!(padded.width(), 10);
        assert_eq!(padded.to_features().len(), GlyphShape::default().feature_len());
    }

    #[test]
    fn test_exact_fit_is_accepted() {
        let shape = GlyphShape { rows: 2, cols: 3 };
        let glyph = symbol(Bitmap::from_pattern(&["###", "#.#"]));

        let normalized = normalize_symbol(&glyph, shape, OverflowPolicy::Reject)
            .unwrap()
            .unwrap();

        assert_eq!(normalized, glyph.bitmap);
    }

    #[test]
    fn test_overflow_is_rejected_by_default() {
        let shape = GlyphShape { rows: 2, cols: 2 };
        let glyph = symbol(Bitmap::from_pattern(&["###", "#.#"]));

        let err = normalize_symbol(&glyph, shape, OverflowPolicy::default()).unwrap_err();

        match err {
            RecognizeError::ShapeOverflow {
                left,
                top,
                width,
                height,
                rows,
                cols,
            } => {
                assert_eq!((left, top, width, height), (7, 3, 3, 2));
                assert_eq!((rows, cols), (2, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_overflow_clip_keeps_top_left_window() {
        let shape = GlyphShape { rows: 2, cols: 2 };
        let glyph = symbol(Bitmap::from_pattern(&["#.#", ".##", "###"]));

        let clipped = normalize_symbol(&glyph, shape, OverflowPolicy::Clip)
            .unwrap()
            .unwrap();

        assert_eq!(clipped.to_pattern(), ["#.", ".#"]);
    }

    #[test]
    fn test_overflow_skip_drops_glyph() {
        let shape = GlyphShape { rows: 1, cols: 1 };
        let glyph = symbol(Bitmap::from_pattern(&["##"]));

        let result = normalize_symbol(&glyph, shape, OverflowPolicy::Skip).unwrap();
        assert!(result.is_none());
    }
}
