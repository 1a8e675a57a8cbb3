// SPDX-License-Identifier: MPL-2.0

//! Frame to image conversion for encoding

use crate::backends::camera::types::Frame;
use crate::errors::CaptureError;
use image::RgbImage;

/// Drop the alpha channel of an RGBA frame
pub fn frame_to_rgb(frame: &Frame) -> Result<RgbImage, CaptureError> {
    convert_rgba_to_rgb(&frame.data, frame.width, frame.height)
}

/// Convert tightly packed RGBA to an RGB image
pub fn convert_rgba_to_rgb(rgba_data: &[u8], width: u32, height: u32) -> Result<RgbImage, CaptureError> {
    let pixels = width as usize * height as usize;
    let expected_size = pixels * 4;
    if rgba_data.len() < expected_size {
        return Err(CaptureError::EncodingFailed(format!(
            "RGBA data too small: expected {}, got {}",
            expected_size,
            rgba_data.len()
        )));
    }

    let rgb_data: Vec<u8> = rgba_data
        .chunks_exact(4)
        .take(pixels)
        .flat_map(|rgba| [rgba[0], rgba[1], rgba[2]])
        .collect();

    RgbImage::from_raw(width, height, rgb_data).ok_or_else(|| {
        CaptureError::EncodingFailed("Failed to create RGB image from converted data".to_string())
    })
}
