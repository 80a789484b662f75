//! Recognizer configuration.
//!
//! Loads settings from config.json at startup. Provides the text color range,
//! glyph capacity, assembly rules and model location.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::ocr::{ColorRange, GlyphShape, RecognizeOptions};

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<RecognizerConfig> = OnceLock::new();

/// Bounding-box coordinate used to order recognized symbols.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortAxis {
    /// Left edge; reads a single line left-to-right
    #[default]
    Horizontal,
    /// Top edge; reads a single column top-to-bottom
    Vertical,
}

/// What to do with a glyph larger than the classifier's glyph shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Fail the whole image with a shape-overflow error
    #[default]
    Reject,
    /// Keep only the top-left window that fits
    Clip,
    /// Leave the glyph out of the result
    Skip,
}

/// Complete recognizer configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Pixels with every channel inside this range are treated as text
    pub color_range: ColorRange,
    /// Glyph capacity in rows (must match the model)
    pub glyph_rows: u32,
    /// Glyph capacity in columns (must match the model)
    pub glyph_cols: u32,
    /// Class id meaning "not a digit"; dropped from the text
    pub reserved_class: u32,
    /// Coordinate used to order symbols
    pub sort_axis: SortAxis,
    /// Handling of glyphs larger than the glyph capacity
    pub overflow_policy: OverflowPolicy,
    /// Components with fewer pixels are ignored as noise (0 disables)
    pub min_component_pixels: usize,
    /// Explicit path to the classifier artifact
    pub model_path: Option<PathBuf>,
    /// Where to fetch the artifact from if it is not found locally
    pub model_url: Option<String>,
    /// Batch worker threads (0 = one per available CPU)
    pub worker_threads: usize,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        let shape = GlyphShape::default();
        Self {
            color_range: ColorRange::default(),
            glyph_rows: shape.rows,
            glyph_cols: shape.cols,
            reserved_class: 10,
            sort_axis: SortAxis::default(),
            overflow_policy: OverflowPolicy::default(),
            min_component_pixels: 0,
            model_path: None,
            model_url: None,
            worker_threads: 0,
        }
    }
}

impl RecognizerConfig {
    /// Glyph capacity the classifier expects.
    pub fn glyph_shape(&self) -> GlyphShape {
        GlyphShape {
            rows: self.glyph_rows,
            cols: self.glyph_cols,
        }
    }

    /// Per-call pipeline options derived from this config.
    pub fn options(&self) -> RecognizeOptions {
        RecognizeOptions {
            color_range: self.color_range,
            reserved_class: self.reserved_class,
            sort_axis: self.sort_axis,
            overflow_policy: self.overflow_policy,
            min_component_pixels: self.min_component_pixels,
        }
    }

    /// Number of batch workers to spawn.
    pub fn effective_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            return self.worker_threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.glyph_rows == 0 || self.glyph_cols == 0 {
            return Err(anyhow!(
                "glyph shape must be non-empty, got {}x{}",
                self.glyph_rows,
                self.glyph_cols
            ));
        }
        Ok(())
    }
}

/// Reads and validates a config file. Fails if the file is missing or invalid.
pub fn load_config_from(path: &Path) -> Result<RecognizerConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: RecognizerConfig = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from config.json next to the executable, or defaults.
fn load_default_config() -> RecognizerConfig {
    let config_path = crate::paths::get_config_path();

    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match load_config_from(&config_path) {
            Ok(config) => {
                crate::log("Config loaded from config.json");
                return config;
            }
            Err(e) => {
                crate::log(&format!("{:#}. Using defaults.", e));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    RecognizerConfig::default()
}

/// Loads the config: an explicit path must exist and parse; otherwise the
/// default location is tried with a fallback to defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<RecognizerConfig> {
    match explicit {
        Some(path) => {
            let config = load_config_from(path)?;
            crate::log(&format!("Config loaded from {}", path.display()));
            Ok(config)
        }
        None => Ok(load_default_config()),
    }
}

/// Initializes the global configuration. Call once at startup; later calls
/// are ignored.
pub fn init_config(config: RecognizerConfig) {
    let _ = CONFIG.set(config);
}

/// Returns the global configuration, or defaults if `init_config` was never
/// called.
pub fn get_config() -> &'static RecognizerConfig {
    CONFIG.get_or_init(RecognizerConfig::default)
}
