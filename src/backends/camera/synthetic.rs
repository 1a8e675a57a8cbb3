// SPDX-License-Identifier: GPL-3.0-only

//! Moving test pattern source
//!
//! Stands in for a physical camera: a diagonal colour gradient with a white
//! square sweeping across it, so filters have both smooth areas and hard edges
//! to work on.

use super::FrameSource;
use super::types::Frame;
use crate::constants::{synthetic, timing};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Side length of the moving square, in pixels
const SQUARE_SIZE: u32 = 64;

pub struct SyntheticSource {
    width: u32,
    height: u32,
    frame_duration: Duration,
    limit: Option<u64>,
    produced: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            frame_duration: timing::SOURCE_FRAME_DURATION,
            limit: None,
            produced: 0,
        }
    }

    /// Stop after `frames` frames
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    /// Override the frame cadence; zero produces frames as fast as possible
    pub fn with_frame_duration(mut self, frame_duration: Duration) -> Self {
        self.frame_duration = frame_duration;
        self
    }

    /// Render pattern number `index` without waiting
    pub fn render(&self, index: u64) -> Frame {
        let (w, h) = (self.width, self.height);
        let mut data = Vec::with_capacity(Frame::byte_len(w, h));

        let travel = w.saturating_sub(SQUARE_SIZE).max(1);
        let square_x = ((index * 4) % travel as u64) as u32;
        let square_y = h.saturating_sub(SQUARE_SIZE) / 2;

        for y in 0..h {
            for x in 0..w {
                let inside = x >= square_x
                    && x < square_x + SQUARE_SIZE
                    && y >= square_y
                    && y < square_y + SQUARE_SIZE;
                if inside {
                    data.extend_from_slice(&[255, 255, 255, 255]);
                } else {
                    let r = (x * 255 / w) as u8;
                    let g = (y * 255 / h) as u8;
                    let b = (index % 256) as u8;
                    data.extend_from_slice(&[r, g, b, 255]);
                }
            }
        }

        // Dimensions are clamped to non-zero and data is sized from them
        Frame {
            width: w,
            height: h,
            data: data.into(),
            sequence: 0,
            captured_at: std::time::Instant::now(),
        }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(synthetic::WIDTH, synthetic::HEIGHT)
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Option<Frame> {
        if self.limit.is_some_and(|limit| self.produced >= limit) {
            debug!(produced = self.produced, "Synthetic source exhausted");
            return None;
        }
        if !self.frame_duration.is_zero() {
            thread::sleep(self.frame_duration);
        }
        let frame = self.render(self.produced);
        self.produced += 1;
        Some(frame)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
