//! OCR worker thread for batch recognition.
//!
//! Several workers pull image paths from one shared queue, run the pipeline
//! against a shared read-only classifier, and send each outcome back on the
//! result channel.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

use super::queue::{OcrWorkItem, WorkResult};
use crate::classifier::GlyphClassifier;
use crate::ocr::{load_image, recognize, RecognizeOptions};

/// Runs the OCR worker loop.
///
/// Processes items until the work channel is closed (sender dropped) or the
/// result channel's receiver is gone. Blocks, so run it on a dedicated thread.
pub fn run_ocr_worker(
    worker_id: usize,
    receiver: Arc<Mutex<Receiver<OcrWorkItem>>>,
    classifier: Arc<dyn GlyphClassifier>,
    options: RecognizeOptions,
    results: Sender<WorkResult>,
) {
    crate::log(&format!("OCR worker {} started", worker_id));

    loop {
        let next = {
            let queue = receiver
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            queue.recv()
        };

        let work_item = match next {
            Ok(item) => item,
            Err(_) => {
                crate::log(&format!("OCR worker {}: channel closed, exiting", worker_id));
                break;
            }
        };

        crate::log(&format!(
            "OCR worker {}: processing #{} ({})",
            worker_id,
            work_item.index,
            work_item.image_path.display()
        ));

        let outcome = load_image(&work_item.image_path)
            .and_then(|img| recognize(&img, classifier.as_ref(), &options))
            .map_err(|e| e.to_string());

        if let Err(e) = &outcome {
            crate::log(&format!(
                "OCR worker {}: #{} failed: {}",
                worker_id, work_item.index, e
            ));
        }

        let result = WorkResult {
            item: work_item,
            outcome,
        };
        if results.send(result).is_err() {
            crate::log(&format!("OCR worker {}: result channel closed, exiting", worker_id));
            break;
        }
    }

    crate::log(&format!("OCR worker {} finished", worker_id));
}
