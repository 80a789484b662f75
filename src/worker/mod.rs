//! Batch recognition of many images.
//!
//! This module provides:
//! - A work queue carrying image paths to worker threads
//! - OCR workers sharing one loaded classifier
//! - CSV result output

pub mod csv_writer;
pub mod ocr_worker;
pub mod queue;

pub use queue::{create_work_queue, OcrWorkItem, WorkResult};

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::classifier::GlyphClassifier;
use crate::ocr::RecognizeOptions;
use csv_writer::{append_result, init_csv};
use ocr_worker::run_ocr_worker;

/// File extensions picked up when a directory is given.
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// Totals for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expands the inputs into image paths. Directories contribute their image
/// files (not recursive), sorted by name; files are taken as given.
pub fn collect_images(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)
                .with_context(|| format!("Failed to read directory {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image_file(p))
                .collect();
            found.sort();
            images.extend(found);
        } else {
            images.push(input.clone());
        }
    }

    if images.is_empty() {
        return Err(anyhow!("No images to process"));
    }
    Ok(images)
}

/// Recognizes `images` on `threads` workers and appends one CSV row per image.
///
/// Rows are written as results arrive, so their order follows completion;
/// the `index` column gives the input position.
pub fn run_batch(
    images: Vec<PathBuf>,
    classifier: Arc<dyn GlyphClassifier>,
    options: RecognizeOptions,
    threads: usize,
    csv_path: &Path,
) -> Result<BatchSummary> {
    init_csv(csv_path)?;

    let threads = threads.clamp(1, images.len().max(1));
    crate::log(&format!(
        "Batch: {} images on {} workers -> {}",
        images.len(),
        threads,
        csv_path.display()
    ));

    let (sender, receiver) = create_work_queue();
    let receiver = Arc::new(Mutex::new(receiver));
    let (result_tx, result_rx) = channel();

    let mut workers = Vec::with_capacity(threads);
    for worker_id in 0..threads {
        let receiver = Arc::clone(&receiver);
        let classifier = Arc::clone(&classifier);
        let result_tx = result_tx.clone();
        let handle = thread::Builder::new()
            .name(format!("ocr-worker-{}", worker_id))
            .spawn(move || run_ocr_worker(worker_id, receiver, classifier, options, result_tx))
            .context("Failed to spawn OCR worker")?;
        workers.push(handle);
    }
    // Only the workers hold result senders now; the loop below ends with them.
    drop(result_tx);

    for (i, path) in images.into_iter().enumerate() {
        sender
            .send(OcrWorkItem::new(path, i as u32 + 1))
            .map_err(|_| anyhow!("All OCR workers exited early"))?;
    }
    drop(sender);

    let mut summary = BatchSummary::default();
    for result in result_rx {
        summary.processed += 1;
        if result.outcome.is_err() {
            summary.failed += 1;
        }
        if let Err(e) = append_result(csv_path, &result) {
            crate::log(&format!(
                "Failed to write CSV row for #{}: {:#}",
                result.item.index, e
            ));
        }
    }

    for worker in workers {
        if worker.join().is_err() {
            crate::log("An OCR worker panicked");
        }
    }

    crate::log(&format!(
        "Batch complete: {} processed, {} failed",
        summary.processed, summary.failed
    ));

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Prediction;
    use crate::error::RecognizeError;
    use crate::ocr::{Bitmap, GlyphShape};
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    /// Reads a vertical bar's height as its digit.
    struct BarHeightClassifier;

    impl GlyphClassifier for BarHeightClassifier {
        fn glyph_shape(&self) -> GlyphShape {
            GlyphShape::default()
        }

        fn classify(&self, glyph: &Bitmap) -> Result<Prediction, RecognizeError> {
            Ok(Prediction {
                class_id: glyph.count_on() as u32 % 10,
                confidence: Some(0.5),
            })
        }
    }

    /// Draws one vertical bar per digit, each `digit` pixels tall.
    fn write_bars(path: &Path, digits: &[u32]) {
        let mut img = RgbImage::from_pixel(2 + digits.len() as u32 * 3, 12, Rgb([0, 0, 0]));
        for (i, &d) in digits.iter().enumerate() {
            for y in 0..d {
                img.put_pixel(2 + i as u32 * 3, 1 + y, Rgb([230, 230, 230]));
            }
        }
        img.save(path).unwrap();
    }

    #[test]
    fn test_collect_images_expands_directories() {
        let dir = tempdir().unwrap();
        write_bars(&dir.path().join("b.png"), &[1]);
        write_bars(&dir.path().join("a.png"), &[2]);
        fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let images = collect_images(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(
            images,
            vec![dir.path().join("a.png"), dir.path().join("b.png")]
        );
    }

    #[test]
    fn test_collect_images_rejects_empty_input() {
        let dir = tempdir().unwrap();
        assert!(collect_images(&[dir.path().to_path_buf()]).is_err());
    }

    #[test]
    fn test_run_batch_writes_one_row_per_image() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.png");
        let second = dir.path().join("second.png");
        write_bars(&first, &[3, 1, 4]);
        write_bars(&second, &[2, 7]);
        let missing = dir.path().join("missing.png");
        let csv_path = dir.path().join("results.csv");

        let summary = run_batch(
            vec![first, second, missing],
            Arc::new(BarHeightClassifier),
            RecognizeOptions::default(),
            2,
            &csv_path,
        )
        .unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                processed: 3,
                failed: 1
            }
        );

        let content = fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4); // header + 3 rows
        assert!(lines.iter().any(|l| l.contains("first.png,314,0.5000,3,")));
        assert!(lines.iter().any(|l| l.contains("second.png,27,0.5000,2,")));
        assert!(lines.iter().any(|l| l.contains("missing.png,,,,")));
    }
}
