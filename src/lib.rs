//! Digit OCR
//!
//! Reads printed digit strings out of screenshots: light text pixels are
//! isolated with a color range, split into glyphs by connected components,
//! padded to a fixed glyph shape and classified by a pretrained decision
//! forest. The recognized digits are reassembled left-to-right.

pub mod classifier;
pub mod config;
pub mod error;
pub mod ocr;
pub mod paths;
pub mod worker;

pub use classifier::{GlyphClassifier, ModelHandle, Prediction, RandomForest};
pub use config::{OverflowPolicy, RecognizerConfig, SortAxis};
pub use error::RecognizeError;
pub use ocr::{
    decode_image, extract_symbols, load_image, recognize, recognize_with_handle, Bitmap,
    BoundingBox, ColorRange, GlyphShape, RecognitionResult, RecognizeOptions, Region, Symbol,
};

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

/// Logs a message to stderr and the log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    eprint!("{}", line);
    let log_path = paths::get_logs_dir().join("digit_ocr.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}
