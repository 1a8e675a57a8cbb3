// SPDX-License-Identifier: GPL-3.0-only

//! Application core: the live frame path

pub mod frame_processor;

pub use frame_processor::{FrameProcessor, LatestFrame, PreviewPipeline, ProcessedFrame};
