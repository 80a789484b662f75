//! Work queue for passing images to OCR worker threads.
//!
//! Uses a std::sync::mpsc channel. The batch driver sends image paths; the
//! workers share the receiving end and report back on a result channel.

use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::ocr::RecognitionResult;

/// A work item for an OCR worker thread.
#[derive(Debug, Clone)]
pub struct OcrWorkItem {
    /// Path to the image file
    pub image_path: PathBuf,
    /// Position in the batch (1-based)
    pub index: u32,
    /// Timestamp when the item was queued
    pub queued_at: DateTime<Local>,
}

impl OcrWorkItem {
    /// Creates a new work item.
    pub fn new(image_path: PathBuf, index: u32) -> Self {
        Self {
            image_path,
            index,
            queued_at: Local::now(),
        }
    }
}

/// Outcome of one work item. Failures are kept as messages so one bad image
/// never stops the batch.
#[derive(Debug, Clone)]
pub struct WorkResult {
    pub item: OcrWorkItem,
    pub outcome: Result<RecognitionResult, String>,
}

/// Creates a new work queue.
///
/// Returns a tuple of (sender, receiver). The channel is unbounded; items
/// queue up if the workers are slower than the producer.
pub fn create_work_queue() -> (Sender<OcrWorkItem>, Receiver<OcrWorkItem>) {
    channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_work_queue_send_receive() {
        let (sender, receiver) = create_work_queue();

        let item = OcrWorkItem::new(PathBuf::from("test/digits.png"), 1);
        sender.send(item).expect("Failed to send");

        let received = receiver.recv().expect("Failed to receive");
        assert_eq!(received.index, 1);
        assert_eq!(received.image_path, PathBuf::from("test/digits.png"));
    }

    #[test]
    fn test_work_queue_multiple_items() {
        let (sender, receiver) = create_work_queue();

        for i in 1..=5 {
            let item = OcrWorkItem::new(PathBuf::from(format!("digits_{}.png", i)), i);
            sender.send(item).expect("Failed to send");
        }

        for i in 1..=5 {
            let received = receiver.recv().expect("Failed to receive");
            assert_eq!(received.index, i);
        }
    }

    #[test]
    fn test_channel_closes_when_sender_dropped() {
        let (sender, receiver) = create_work_queue();

        sender
            .send(OcrWorkItem::new(PathBuf::from("test.png"), 1))
            .unwrap();

        drop(sender);

        assert!(receiver.recv().is_ok());
        assert!(receiver.recv().is_err());
    }
}
