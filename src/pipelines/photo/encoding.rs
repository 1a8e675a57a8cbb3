// SPDX-License-Identifier: GPL-3.0-only

//! Snapshot encoding
//!
//! Snapshots are persisted as JPEG. The encoder is synchronous and meant to
//! run on the blocking pool.

use crate::errors::CaptureError;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// Encoded image data ready for storage
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Photo encoder
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    quality: EncodingQuality,
}

impl PhotoEncoder {
    /// Create a new encoder with high quality
    pub fn new() -> Self {
        Self {
            quality: EncodingQuality::High,
        }
    }

    pub fn with_quality(mut self, quality: EncodingQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Encode an RGB image as JPEG
    pub fn encode(&self, image: &RgbImage) -> Result<EncodedImage, CaptureError> {
        let data = Self::encode_jpeg(image, self.quality)?;

        debug!(size = data.len(), quality = ?self.quality, "Encoding complete");

        Ok(EncodedImage {
            data,
            width: image.width(),
            height: image.height(),
        })
    }

    fn encode_jpeg(image: &RgbImage, quality: EncodingQuality) -> Result<Vec<u8>, CaptureError> {
        let mut buffer = Vec::new();
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.jpeg_quality());

        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| CaptureError::EncodingFailed(format!("JPEG encoding failed: {e}")))?;

        Ok(buffer)
    }
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_quality_values() {
        assert_eq!(EncodingQuality::Low.jpeg_quality(), 60);
        assert_eq!(EncodingQuality::Medium.jpeg_quality(), 80);
        assert_eq!(EncodingQuality::High.jpeg_quality(), 92);
        assert_eq!(EncodingQuality::Maximum.jpeg_quality(), 98);
    }

    #[test]
    fn test_jpeg_output_decodes() {
        let image = RgbImage::from_pixel(16, 8, image::Rgb([200, 10, 10]));
        let encoded = PhotoEncoder::new()
            .with_quality(EncodingQuality::Low)
            .encode(&image)
            .unwrap();
        assert_eq!(encoded.width, 16);
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&encoded.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }
}
