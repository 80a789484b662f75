//! CSV writer for batch results.
//!
//! Writes one row per image in append-only mode for crash safety.
//! Each row contains: index, timestamp, image path, text, confidence,
//! symbol count and error message (empty on success).

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use super::queue::WorkResult;

/// CSV header row.
const CSV_HEADER: &str = "index,timestamp,image,text,confidence,count,error";

/// Initializes CSV file with header if it doesn't exist or is empty.
///
/// If the file exists and has content, this does nothing (preserves existing data).
pub fn init_csv(path: &Path) -> Result<()> {
    if path.exists() {
        let file = File::open(path).context("Failed to open existing CSV")?;
        let reader = BufReader::new(file);
        if reader.lines().next().is_some() {
            return Ok(());
        }
    }

    let mut file = File::create(path).context("Failed to create CSV file")?;
    writeln!(file, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    Ok(())
}

/// Quotes a field if it contains a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Appends one result row to the CSV file.
///
/// Opens the file in append mode for each write, so rows written before a
/// crash are kept.
pub fn append_result(path: &Path, result: &WorkResult) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open CSV for append")?;

    let item = &result.item;
    let (text, confidence, count, error) = match &result.outcome {
        Ok(r) => (
            r.text.clone(),
            format!("{:.4}", r.confidence),
            r.count.to_string(),
            String::new(),
        ),
        Err(e) => (String::new(), String::new(), String::new(), e.clone()),
    };

    let line = format!(
        "{},{},{},{},{},{},{}",
        item.index,
        item.queued_at.format("%Y-%m-%dT%H:%M:%S"),
        csv_field(&item.image_path.display().to_string()),
        csv_field(&text),
        confidence,
        count,
        csv_field(&error),
    );

    writeln!(file, "{}", line).context("Failed to write CSV row")?;
    Ok(())
}
