// SPDX-License-Identifier: GPL-3.0-only

//! Still image frame source
//!
//! Loads an image once and re-emits it at camera cadence, so the live pipeline
//! can be driven from a file when no camera is around.

use super::FrameSource;
use super::types::Frame;
use crate::constants::{file_formats, timing};
use crate::errors::SourceError;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

pub struct ImageFileSource {
    frame: Frame,
    frame_duration: Duration,
    name: String,
}

impl ImageFileSource {
    /// Decode `path` into an RGBA frame
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !file_formats::is_image_extension(&extension) {
            return Err(SourceError::Unsupported(extension));
        }

        info!(path = %path.display(), "Loading image file");

        let rgba = image::open(path)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        let frame = Frame::new(width, height, rgba.into_raw())?;

        info!(width, height, "Image loaded successfully");

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Ok(Self {
            frame,
            frame_duration: timing::SOURCE_FRAME_DURATION,
            name,
        })
    }

    pub fn with_frame_duration(mut self, frame_duration: Duration) -> Self {
        self.frame_duration = frame_duration;
        self
    }
}

impl FrameSource for ImageFileSource {
    fn next_frame(&mut self) -> Option<Frame> {
        if !self.frame_duration.is_zero() {
            thread::sleep(self.frame_duration);
        }
        // Shares the decoded pixels; only the timestamp is fresh
        let mut frame = self.frame.clone();
        frame.captured_at = Instant::now();
        Some(frame)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
