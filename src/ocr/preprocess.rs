use image::RgbImage;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::bitmap::Bitmap;
use crate::error::RecognizeError;

/// Pattern for a region string: `left,top,width,height`.
const REGION_PATTERN: &str = r"^\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*$";

/// Inclusive per-channel RGB bounds selecting text pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    /// Lowest accepted [R, G, B]
    pub lower: [u8; 3],
    /// Highest accepted [R, G, B]
    pub upper: [u8; 3],
}

impl Default for ColorRange {
    /// Light-gray to white: isolates anti-aliased light text on a dark background.
    fn default() -> Self {
        Self {
            lower: [160, 154, 157],
            upper: [255, 255, 255],
        }
    }
}

impl ColorRange {
    /// True if every channel of `rgb` lies within its bounds.
    pub fn contains(&self, rgb: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= rgb[c] && rgb[c] <= self.upper[c])
    }
}

/// Converts an image to a text mask by keeping only pixels inside `range`.
///
/// The mask has the image's dimensions; on cells are text.
pub fn filter_color_range(img: &RgbImage, range: &ColorRange) -> Bitmap {
    let (width, height) = img.dimensions();
    let mut mask = Bitmap::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        if range.contains(pixel.0) {
            mask.set(x, y, true);
        }
    }

    mask
}

/// A rectangle in absolute pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Parses `left,top,width,height` (whitespace around numbers is allowed).
    pub fn parse(text: &str) -> Result<Self, RecognizeError> {
        let regex = Regex::new(REGION_PATTERN).map_err(|e| RecognizeError::input(e.to_string()))?;
        let caps = regex.captures(text).ok_or_else(|| {
            RecognizeError::input(format!(
                "region must be four comma-separated integers (left,top,width,height), got {:?}",
                text.trim()
            ))
        })?;

        let mut values = [0u32; 4];
        for (i, value) in values.iter_mut().enumerate() {
            *value = caps[i + 1]
                .parse()
                .map_err(|e| RecognizeError::input(format!("region value {}: {}", i + 1, e)))?;
        }

        Ok(Self {
            left: values[0],
            top: values[1],
            width: values[2],
            height: values[3],
        })
    }
}

impl FromStr for Region {
    type Err = RecognizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Crops a sub-region from an image.
///
/// The region is clamped to the image bounds; a region starting outside the
/// image or with zero area is rejected.
pub fn crop_region(img: &RgbImage, region: &Region) -> Result<RgbImage, RecognizeError> {
    let (w, h) = img.dimensions();

    if region.width == 0 || region.height == 0 {
        return Err(RecognizeError::input("region has zero area"));
    }
    if region.left >= w || region.top >= h {
        return Err(RecognizeError::input(format!(
            "region origin ({}, {}) lies outside the {}x{} image",
            region.left, region.top, w, h
        )));
    }

    let rw = region.width.min(w - region.left);
    let rh = region.height.min(h - region.top);

    Ok(image::imageops::crop_imm(img, region.left, region.top, rw, rh).to_image())
}
