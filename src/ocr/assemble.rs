use serde::{Deserialize, Serialize};

use super::segment::BoundingBox;
use crate::config::SortAxis;

/// Classifier verdict for one glyph, tied to where the glyph was found.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SymbolPrediction {
    pub class_id: u32,
    pub bbox: BoundingBox,
    /// Highest class probability, when the classifier reports one
    pub confidence: Option<f32>,
}

/// Final reading of one image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Recognized digits in reading order
    #[serde(rename = "extracted_text")]
    pub text: String,
    /// Mean confidence of the retained symbols (0.0 when none)
    pub confidence: f32,
    /// Number of symbols that made it into `text`
    #[serde(rename = "symbol_count")]
    pub count: usize,
}

impl RecognitionResult {
    /// The result for an image with nothing to read.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            count: 0,
        }
    }
}

/// Joins per-glyph predictions into a digit string.
///
/// Predictions of `reserved_class` (commas and other punctuation) are
/// dropped. The rest are stably sorted by the `axis` origin of their box, so
/// glyphs sharing a coordinate keep their segmentation order.
pub fn assemble(
    predictions: Vec<SymbolPrediction>,
    reserved_class: u32,
    axis: SortAxis,
) -> RecognitionResult {
    let mut kept: Vec<SymbolPrediction> = predictions
        .into_iter()
        .filter(|p| p.class_id != reserved_class)
        .collect();

    if kept.is_empty() {
        return RecognitionResult::empty();
    }

    kept.sort_by_key(|p| match axis {
        SortAxis::Horizontal => p.bbox.left,
        SortAxis::Vertical => p.bbox.top,
    });

    let text: String = kept.iter().map(|p| p.class_id.to_string()).collect();

    let confidences: Vec<f32> = kept.iter().filter_map(|p| p.confidence).collect();
    let confidence = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f32>() / confidences.len() as f32
    };

    RecognitionResult {
        text,
        confidence,
        count: kept.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESERVED: u32 = 10;

    fn prediction(class_id: u32, left: u32, top: u32, confidence: Option<f32>) -> SymbolPrediction {
        SymbolPrediction {
            class_id,
            bbox: BoundingBox {
                left,
                top,
                width: 3,
                height: 5,
            },
            confidence,
        }
    }

    #[test]
    fn test_sorts_by_horizontal_origin() {
        let predictions = vec![
            prediction(3, 30, 0, Some(0.9)),
            prediction(1, 5, 0, Some(0.9)),
            prediction(2, 17, 0, Some(0.9)),
        ];

        let result = assemble(predictions, RESERVED, SortAxis::Horizontal);

        assert_eq!(result.text, "123");
        assert_eq!(result.count, 3);
    }

    #[test]
    fn test_default_axis_reads_left_to_right() {
        // Glyphs are found top-first by the row-major scan; the reading order
        // must still follow their horizontal position.
        let predictions = vec![
            prediction(9, 20, 0, None),
            prediction(4, 0, 2, None),
            prediction(7, 10, 1, None),
        ];

        let result = assemble(predictions, RESERVED, SortAxis::default());

        assert_eq!(SortAxis::default(), SortAxis::Horizontal);
        assert_eq!(result.text, "479");
    }

    #[test]
    fn test_vertical_axis_sorts_by_top() {
        let predictions = vec![
            prediction(1, 0, 40, None),
            prediction(2, 10, 4, None),
            prediction(3, 20, 22, None),
        ];

        let result = assemble(predictions, RESERVED, SortAxis::Vertical);
        assert_eq!(result.text, "231");
    }

    #[test]
    fn test_reserved_class_is_dropped() {
        let predictions = vec![
            prediction(1, 0, 0, Some(0.8)),
            prediction(RESERVED, 6, 4, Some(0.1)),
            prediction(2, 9, 0, Some(0.6)),
            prediction(5, 14, 0, Some(1.0)),
        ];

        let result = assemble(predictions, RESERVED, SortAxis::Horizontal);

        assert_eq!(result.text, "125");
        assert_eq!(result.count, 3);
        assert!((result.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_equal_origins_keep_input_order() {
        let predictions = vec![
            prediction(8, 5, 0, None),
            prediction(6, 5, 9, None),
            prediction(0, 1, 0, None),
        ];

        let result = assemble(predictions, RESERVED, SortAxis::Horizontal);
        assert_eq!(result.text, "086");
    }

    #[test]
    fn test_nothing_left_is_empty_result() {
        let predictions = vec![prediction(RESERVED, 0, 0, Some(0.9))];

        assert_eq!(
            assemble(predictions, RESERVED, SortAxis::Horizontal),
            RecognitionResult::empty()
        );
        assert_eq!(
            assemble(Vec::new(), RESERVED, SortAxis::Horizontal),
            RecognitionResult::empty()
        );
    }

    #[test]
    fn test_missing_confidences_average_to_zero() {
        let predictions = vec![prediction(4, 0, 0, None), prediction(2, 4, 0, None)];

        let result = assemble(predictions, RESERVED, SortAxis::Horizontal);

        assert_eq!(result.text, "42");
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_result_serializes_with_public_field_names() {
        let result = RecognitionResult {
            text: "12345".to_string(),
            confidence: 0.5,
            count: 5,
        };

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"extracted_text\":\"12345\""));
        assert!(json.contains("\"symbol_count\":5"));
    }
}
