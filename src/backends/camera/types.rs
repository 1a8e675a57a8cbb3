// SPDX-License-Identifier: GPL-3.0-only
// Shared types for frame sources

//! Shared types for frame sources

use crate::errors::FrameError;
use std::sync::Arc;
use std::time::Instant;

/// Bytes per RGBA pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// Result type for frame construction
pub type FrameResult<T> = Result<T, FrameError>;

/// A single RGBA frame
///
/// Pixel data is reference counted, so cloning a frame never copies pixels.
/// Rows are tightly packed (stride = width * 4).
#[derive(Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixels
    pub data: Arc<[u8]>,
    /// Delivery sequence number, stamped by the frame slot
    pub sequence: u64,
    /// Timestamp when the frame was produced
    pub captured_at: Instant,
}

impl Frame {
    /// Create a frame, validating that `data` holds exactly `width * height` RGBA pixels
    pub fn new(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> FrameResult<Self> {
        let data = data.into();
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroSized { width, height });
        }
        let expected = Self::byte_len(width, height);
        if data.len() != expected {
            return Err(FrameError::DataLength {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
            sequence: 0,
            captured_at: Instant::now(),
        })
    }

    /// Create a frame filled with a single colour
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> FrameResult<Self> {
        let pixels = (width as usize) * (height as usize);
        let data: Vec<u8> = std::iter::repeat_n(rgba, pixels).flatten().collect();
        Self::new(width, height, data)
    }

    /// Number of bytes an RGBA frame of this size occupies
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// View the buffer as RGBA pixels
    pub fn pixels(&self) -> &[[u8; 4]] {
        bytemuck::cast_slice(&self.data)
    }

    /// Deep copy of the pixel data, detached from any buffer the frame shares
    pub fn detached(&self) -> Frame {
        Frame {
            width: self.width,
            height: self.height,
            data: Arc::from(self.data.to_vec()),
            sequence: self.sequence,
            captured_at: self.captured_at,
        }
    }

    /// Whether two frames share the same pixel allocation
    pub fn shares_buffer_with(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .field("sequence", &self.sequence)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_validates_length() {
        assert!(Frame::new(2, 2, vec![0u8; 16]).is_ok());
        assert_eq!(
            Frame::new(2, 2, vec![0u8; 15]).unwrap_err(),
            FrameError::DataLength {
                width: 2,
                height: 2,
                expected: 16,
                actual: 15
            }
        );
        assert!(matches!(
            Frame::new(0, 2, Vec::new()),
            Err(FrameError::ZeroSized { .. })
        ));
    }

    #[test]
    fn test_detached_copy_does_not_alias() {
        let frame = Frame::filled(4, 3, [1, 2, 3, 255]).unwrap();
        let copy = frame.detached();
        assert!(!copy.shares_buffer_with(&frame));
        assert_eq!(copy.data, frame.data);
        assert!(frame.clone().shares_buffer_with(&frame));
    }

    #[test]
    fn test_pixels_view() {
        let frame = Frame::filled(3, 1, [9, 8, 7, 6]).unwrap();
        assert_eq!(frame.pixels(), &[[9, 8, 7, 6]; 3]);
    }
}
