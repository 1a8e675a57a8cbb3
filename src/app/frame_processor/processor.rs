// SPDX-License-Identifier: MPL-2.0

//! Per-frame filter application
//!
//! [`FrameProcessor::on_frame`] turns one raw frame into the frame to display.
//! The filter selection is read fresh for every frame, engine failures fall
//! back to the unfiltered input, and the result is published to a
//! [`LatestFrame`] for the capture service.

use super::fps::FpsCounter;
use super::types::{LatestFrame, ProcessedFrame, ProcessorStats};
use crate::backends::camera::types::Frame;
use crate::errors::FilterError;
use crate::filters::{FilterConfig, FilterEngine, FilterMode, SharedFilterConfig};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Engine output buffer, sized for one frame geometry
struct OutputBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl OutputBuffer {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; Frame::byte_len(width, height)],
        }
    }
}

/// Applies the current filter to each delivered frame
///
/// The engine always renders into one scratch buffer per frame geometry, so
/// `buffer_allocations` only grows when the dimensions change. Publishing a
/// filtered frame then costs one copy of that buffer into a fresh
/// `Arc<[u8]>` (`width * height * 4` bytes per frame): readers such as the
/// capture service hold immutable snapshots and never observe the scratch
/// buffer mid-write. Unfiltered frames are passed through without a copy.
pub struct FrameProcessor {
    engine: Box<dyn FilterEngine>,
    config: SharedFilterConfig,
    latest: LatestFrame,
    stats: Arc<ProcessorStats>,
    output: Option<OutputBuffer>,
    fps: FpsCounter,
    /// Set while consecutive frames fail, so only the first failure is logged
    failing: bool,
}

impl FrameProcessor {
    pub fn new<E>(engine: E, config: SharedFilterConfig, latest: LatestFrame) -> Self
    where
        E: FilterEngine + 'static,
    {
        debug!(engine = engine.name(), "Creating frame processor");
        Self {
            engine: Box::new(engine),
            config,
            latest,
            stats: Arc::new(ProcessorStats::default()),
            output: None,
            fps: FpsCounter::new(),
            failing: false,
        }
    }

    /// Process one frame and publish the result
    ///
    /// Never fails: if the engine errors or panics, the input frame is
    /// returned unfiltered and the error counter is bumped.
    pub fn on_frame(&mut self, frame: Frame) -> Arc<ProcessedFrame> {
        let config = self.config.load();
        trace!(sequence = frame.sequence, mode = %config.mode, "Processing frame");

        let processed = if config.mode == FilterMode::None {
            ProcessedFrame {
                frame,
                applied: config,
                filtered: false,
            }
        } else {
            match self.run_engine(&frame, config) {
                Ok(data) => {
                    if self.failing {
                        debug!("Filter engine recovered");
                        self.failing = false;
                    }
                    ProcessedFrame {
                        frame: Frame {
                            width: frame.width,
                            height: frame.height,
                            data,
                            sequence: frame.sequence,
                            captured_at: frame.captured_at,
                        },
                        applied: config,
                        filtered: true,
                    }
                }
                Err(e) => {
                    self.stats.record_error();
                    if !self.failing {
                        warn!(error = %e, mode = %config.mode, "Filter failed, showing unfiltered frame");
                        self.failing = true;
                    }
                    ProcessedFrame {
                        frame,
                        applied: FilterConfig {
                            mode: FilterMode::None,
                            ..config
                        },
                        filtered: false,
                    }
                }
            }
        };

        let processed = Arc::new(processed);
        self.latest.publish(Arc::clone(&processed));
        self.stats.record_frame();
        if let Some(fps) = self.fps.tick() {
            self.stats.set_fps(fps);
            debug!(fps, "Frame rate");
        }
        processed
    }

    /// Run the engine into the scratch buffer and copy the result out for publishing
    fn run_engine(&mut self, frame: &Frame, config: FilterConfig) -> Result<Arc<[u8]>, FilterError> {
        let (width, height) = frame.dimensions();
        if self
            .output
            .as_ref()
            .is_some_and(|b| (b.width, b.height) != (width, height))
        {
            debug!(width, height, "Frame size changed, releasing output buffer");
            self.output = None;
        }

        let stats = &self.stats;
        let buffer = self.output.get_or_insert_with(|| {
            stats.record_allocation();
            OutputBuffer::new(width, height)
        });

        let engine = &self.engine;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            engine.apply(frame, config, &mut buffer.data)
        }));

        match result {
            Ok(Ok(())) => Ok(Arc::from(buffer.data.as_slice())),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(FilterError::Panicked),
        }
    }

    pub fn config(&self) -> &SharedFilterConfig {
        &self.config
    }

    pub fn latest(&self) -> &LatestFrame {
        &self.latest
    }

    pub fn stats(&self) -> Arc<ProcessorStats> {
        Arc::clone(&self.stats)
    }

    /// Geometry of the currently held output buffer
    pub fn buffer_dimensions(&self) -> Option<(u32, u32)> {
        self.output.as_ref().map(|b| (b.width, b.height))
    }
}
