// SPDX-License-Identifier: MPL-2.0

//! Real-time frame processing
//!
//! Raw frames arrive through a latest-wins slot, the current filter is applied
//! by a [`FrameProcessor`], and the result is published as the latest frame
//! for display and capture.

pub mod fps;
pub mod pipeline;
pub mod processor;
pub mod types;

pub use fps::FpsCounter;
pub use pipeline::PreviewPipeline;
pub use processor::FrameProcessor;
pub use types::{LatestFrame, ProcessedFrame, ProcessorStats, StatsSnapshot};
