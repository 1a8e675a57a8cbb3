// SPDX-License-Identifier: MPL-2.0

//! Live preview wiring
//!
//! Source thread → frame slot → processor thread → [`LatestFrame`].

use super::processor::FrameProcessor;
use super::types::{LatestFrame, ProcessorStats};
use crate::backends::camera::{
    CaptureLoopController, FrameSource, LoopAction, RecvError, frame_slot, spawn_source_pump,
};
use crate::constants::timing;
use crate::filters::{FilterEngine, SharedFilterConfig};
use std::sync::Arc;
use tracing::info;

/// A running source plus frame processor
pub struct PreviewPipeline {
    source_loop: CaptureLoopController,
    processor_loop: CaptureLoopController,
    latest: LatestFrame,
    stats: Arc<ProcessorStats>,
    config: SharedFilterConfig,
}

impl PreviewPipeline {
    pub fn start<S, E>(source: S, engine: E, config: SharedFilterConfig) -> Self
    where
        S: FrameSource + 'static,
        E: FilterEngine + 'static,
    {
        info!(source = source.name(), engine = engine.name(), "Starting preview pipeline");

        let latest = LatestFrame::new();
        let mut processor = FrameProcessor::new(engine, config.clone(), latest.clone());
        let stats = processor.stats();

        let (sender, receiver) = frame_slot();
        let source_loop = spawn_source_pump(source, sender);

        let loop_stats = Arc::clone(&stats);
        let processor_loop = CaptureLoopController::start("frame-processor", move || {
            match receiver.recv_timeout(timing::LOOP_POLL_INTERVAL) {
                Ok(frame) => {
                    processor.on_frame(frame);
                    loop_stats.set_dropped(receiver.dropped());
                    LoopAction::Continue
                }
                Err(RecvError::Timeout) => LoopAction::Continue,
                Err(RecvError::Closed) => {
                    info!("Frame source closed");
                    loop_stats.set_dropped(receiver.dropped());
                    LoopAction::Stop
                }
            }
        });

        Self {
            source_loop,
            processor_loop,
            latest,
            stats,
            config,
        }
    }

    /// Handle to the most recent processed frame
    pub fn latest(&self) -> LatestFrame {
        self.latest.clone()
    }

    pub fn stats(&self) -> Arc<ProcessorStats> {
        Arc::clone(&self.stats)
    }

    pub fn config(&self) -> &SharedFilterConfig {
        &self.config
    }

    /// Whether the processor thread is still consuming frames
    pub fn is_running(&self) -> bool {
        self.processor_loop.is_running()
    }

    /// Stop both threads and wait for them to exit
    pub fn stop(&mut self) {
        self.source_loop.stop();
        self.processor_loop.stop();
        info!(
            frames = self.stats.frames_processed(),
            errors = self.stats.processing_errors(),
            dropped = self.stats.dropped_frames(),
            "Preview pipeline stopped"
        );
    }
}
