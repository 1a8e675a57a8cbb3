// SPDX-License-Identifier: MPL-2.0

//! Core types for frame processing results
//!
//! These types carry the output of the frame processor to its consumers: the
//! preview display and the capture service.

use crate::backends::camera::types::Frame;
use crate::filters::FilterConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tokio::sync::watch;

/// The frame to display for one processing cycle
#[derive(Debug, Clone)]
pub struct ProcessedFrame {
    /// Pixels to show; the input frame itself when no filter ran
    pub frame: Frame,
    /// The config that produced `frame`; a fallback records mode `None`
    pub applied: FilterConfig,
    /// Whether the filter engine produced `frame`
    pub filtered: bool,
}

/// Handoff of the most recent processed frame
///
/// Each publish swaps in a new immutable snapshot, so a reader always sees a
/// whole frame, either the one before or the one after a concurrent update.
/// Clones share the same slot.
#[derive(Clone)]
pub struct LatestFrame {
    tx: Arc<watch::Sender<Option<Arc<ProcessedFrame>>>>,
}

impl LatestFrame {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the current frame
    pub fn publish(&self, frame: Arc<ProcessedFrame>) {
        self.tx.send_replace(Some(frame));
    }

    /// The most recently published frame, if any
    pub fn snapshot(&self) -> Option<Arc<ProcessedFrame>> {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every publish
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<ProcessedFrame>>> {
        self.tx.subscribe()
    }

    /// Wait until at least one frame has been published
    pub async fn wait_for_frame(&self) -> Option<Arc<ProcessedFrame>> {
        let mut rx = self.subscribe();
        let frame = rx.wait_for(Option::is_some).await.ok()?.clone();
        frame
    }
}

impl Default for LatestFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LatestFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sequence = self.snapshot().map(|p| p.frame.sequence);
        f.debug_struct("LatestFrame")
            .field("sequence", &sequence)
            .finish()
    }
}

/// Counters shared between the processor thread and observers
#[derive(Debug, Default)]
pub struct ProcessorStats {
    frames_processed: AtomicU64,
    processing_errors: AtomicU64,
    dropped_frames: AtomicU64,
    buffer_allocations: AtomicU64,
    fps: AtomicU32,
}

/// Point-in-time copy of [`ProcessorStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames_processed: u64,
    pub processing_errors: u64,
    pub dropped_frames: u64,
    pub buffer_allocations: u64,
    pub fps: u32,
}

impl ProcessorStats {
    pub(crate) fn record_frame(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.processing_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_allocation(&self) {
        self.buffer_allocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_dropped(&self, dropped: u64) {
        self.dropped_frames.store(dropped, Ordering::Relaxed);
    }

    pub(crate) fn set_fps(&self, fps: u32) {
        self.fps.store(fps, Ordering::Relaxed);
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn processing_errors(&self) -> u64 {
        self.processing_errors.load(Ordering::Relaxed)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    pub fn buffer_allocations(&self) -> u64 {
        self.buffer_allocations.load(Ordering::Relaxed)
    }

    /// Frames completed during the last full measurement window
    pub fn fps(&self) -> u32 {
        self.fps.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_processed: self.frames_processed(),
            processing_errors: self.processing_errors(),
            dropped_frames: self.dropped_frames(),
            buffer_allocations: self.buffer_allocations(),
            fps: self.fps(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processed(sequence: u64) -> Arc<ProcessedFrame> {
        let mut frame = Frame::filled(1, 1, [0, 0, 0, 255]).unwrap();
        frame.sequence = sequence;
        Arc::new(ProcessedFrame {
            frame,
            applied: FilterConfig::default(),
            filtered: false,
        })
    }

    #[test]
    fn test_latest_frame_swaps_snapshots() {
        let latest = LatestFrame::new();
        assert!(latest.snapshot().is_none());

        latest.publish(processed(1));
        let held = latest.snapshot().unwrap();
        latest.publish(processed(2));

        // A reader holding the old snapshot keeps it intact
        assert_eq!(held.frame.sequence, 1);
        assert_eq!(latest.clone().snapshot().unwrap().frame.sequence, 2);
    }

    #[tokio::test]
    async fn test_wait_for_frame() {
        let latest = LatestFrame::new();
        let publisher = latest.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            publisher.publish(processed(7));
        });
        let frame = latest.wait_for_frame().await.unwrap();
        assert_eq!(frame.frame.sequence, 7);
    }
}
