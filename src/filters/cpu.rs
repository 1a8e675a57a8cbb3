// SPDX-License-Identifier: MPL-2.0

//! CPU reference implementations of the five filter modes
//!
//! These are straightforward software filters operating directly on RGBA
//! data. They favour clarity over speed; the frame processor treats them like
//! any other engine.

use super::{FilterConfig, FilterEngine, FilterMode};
use crate::backends::camera::types::Frame;
use crate::errors::FilterError;

/// Edge strength above which the cartoon filter draws an outline
const CARTOON_EDGE_THRESHOLD: f32 = 100.0;

/// Number of colour levels per channel in the cartoon filter
const CARTOON_LEVELS: u32 = 6;

/// Software filter engine
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuFilterEngine;

impl CpuFilterEngine {
    pub fn new() -> Self {
        Self
    }
}

impl FilterEngine for CpuFilterEngine {
    fn apply(
        &self,
        input: &Frame,
        config: FilterConfig,
        output: &mut [u8],
    ) -> Result<(), FilterError> {
        if output.len() != input.data.len() {
            return Err(FilterError::BufferSize {
                expected: input.data.len(),
                actual: output.len(),
            });
        }

        let width = input.width as usize;
        let height = input.height as usize;
        let src = input.pixels();
        let dst: &mut [[u8; 4]] = bytemuck::cast_slice_mut(output);
        let intensity = config.intensity.value() as f32;

        match config.mode {
            FilterMode::None => dst.copy_from_slice(src),
            FilterMode::Gray => apply_gray(src, dst, intensity),
            FilterMode::Blur => apply_blur(src, dst, width, height, intensity),
            FilterMode::Edge => apply_edge(src, dst, width, height, intensity),
            FilterMode::Cartoon => apply_cartoon(src, dst, width, height),
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "cpu"
    }
}

/// BT.601 luma of an RGBA pixel
fn luma(p: [u8; 4]) -> f32 {
    0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32
}

/// Grayscale with brightness scaled by intensity (50 = unchanged)
fn apply_gray(src: &[[u8; 4]], dst: &mut [[u8; 4]], intensity: f32) {
    let scale = (intensity / 50.0).max(0.1);
    for (out, &p) in dst.iter_mut().zip(src) {
        let v = (luma(p) * scale).round().clamp(0.0, 255.0) as u8;
        *out = [v, v, v, p[3]];
    }
}

/// Box blur approximating a Gaussian; kernel grows in steps of 10 intensity
fn apply_blur(src: &[[u8; 4]], dst: &mut [[u8; 4]], width: usize, height: usize, intensity: f32) {
    let ksize = ((intensity as usize / 10) * 2 + 1).max(1);
    let radius = ksize / 2;
    if radius == 0 {
        dst.copy_from_slice(src);
        return;
    }

    // Horizontal pass into a scratch row set, vertical pass into dst
    let mut horizontal = vec![[0u8; 4]; src.len()];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        for x in 0..width {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(width - 1);
            horizontal[y * width + x] = average(&row[lo..=hi]);
        }
    }

    let mut column = Vec::with_capacity(ksize);
    for x in 0..width {
        for y in 0..height {
            let lo = y.saturating_sub(radius);
            let hi = (y + radius).min(height - 1);
            column.clear();
            column.extend((lo..=hi).map(|yy| horizontal[yy * width + x]));
            dst[y * width + x] = average(&column);
        }
    }
}

fn average(pixels: &[[u8; 4]]) -> [u8; 4] {
    let mut sum = [0u32; 4];
    for p in pixels {
        for c in 0..4 {
            sum[c] += p[c] as u32;
        }
    }
    let n = pixels.len().max(1) as u32;
    [
        (sum[0] / n) as u8,
        (sum[1] / n) as u8,
        (sum[2] / n) as u8,
        (sum[3] / n) as u8,
    ]
}

/// Sobel gradient magnitude of the luma plane
fn sobel(src: &[[u8; 4]], width: usize, height: usize) -> Vec<f32> {
    let lum: Vec<f32> = src.iter().map(|&p| luma(p)).collect();
    let sample = |x: isize, y: isize| -> f32 {
        let x = x.clamp(0, width as isize - 1) as usize;
        let y = y.clamp(0, height as isize - 1) as usize;
        lum[y * width + x]
    };

    let mut magnitude = vec![0.0f32; lum.len()];
    for py in 0..height {
        for px in 0..width {
            let (x, y) = (px as isize, py as isize);
            let tl = sample(x - 1, y - 1);
            let tm = sample(x, y - 1);
            let tr = sample(x + 1, y - 1);
            let ml = sample(x - 1, y);
            let mr = sample(x + 1, y);
            let bl = sample(x - 1, y + 1);
            let bm = sample(x, y + 1);
            let br = sample(x + 1, y + 1);

            let gx = (tr + 2.0 * mr + br) - (tl + 2.0 * ml + bl);
            let gy = (bl + 2.0 * bm + br) - (tl + 2.0 * tm + tr);
            magnitude[py * width + px] = (gx * gx + gy * gy).sqrt();
        }
    }
    magnitude
}

/// Dark edges on white; higher intensity lowers the threshold (more edges)
fn apply_edge(src: &[[u8; 4]], dst: &mut [[u8; 4]], width: usize, height: usize, intensity: f32) {
    let factor = (100.0 - intensity) / 100.0;
    let threshold = 30.0 + factor * 220.0;
    let magnitude = sobel(src, width, height);
    for ((out, &p), &m) in dst.iter_mut().zip(src).zip(&magnitude) {
        let v = if m > threshold { 0 } else { 255 };
        *out = [v, v, v, p[3]];
    }
}

/// Quantized colours with outlines where the gradient is strong
fn apply_cartoon(src: &[[u8; 4]], dst: &mut [[u8; 4]], width: usize, height: usize) {
    let magnitude = sobel(src, width, height);
    let step = 255 / (CARTOON_LEVELS - 1);
    let quantize = |c: u8| -> u8 { ((c as u32 * CARTOON_LEVELS / 256) * step).min(255) as u8 };

    for ((out, &p), &m) in dst.iter_mut().zip(src).zip(&magnitude) {
        *out = if m > CARTOON_EDGE_THRESHOLD {
            [0, 0, 0, p[3]]
        } else {
            [quantize(p[0]), quantize(p[1]), quantize(p[2]), p[3]]
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(frame: &Frame, mode: FilterMode, intensity: i32) -> Vec<u8> {
        let mut out = vec![0u8; frame.data.len()];
        CpuFilterEngine::new()
            .apply(frame, FilterConfig::new(mode, intensity), &mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_none_copies_input() {
        let frame = Frame::filled(4, 4, [10, 20, 30, 255]).unwrap();
        assert_eq!(run(&frame, FilterMode::None, 50), frame.data.to_vec());
    }

    #[test]
    fn test_gray_neutral_intensity() {
        let frame = Frame::filled(2, 2, [100, 100, 100, 255]).unwrap();
        let out = run(&frame, FilterMode::Gray, 50);
        assert_eq!(&out[..4], &[100, 100, 100, 255]);
    }

    #[test]
    fn test_gray_intensity_scales_brightness() {
        let frame = Frame::filled(2, 2, [100, 100, 100, 255]).unwrap();
        let bright = run(&frame, FilterMode::Gray, 100);
        let dark = run(&frame, FilterMode::Gray, 0);
        assert_eq!(bright[0], 200);
        assert_eq!(dark[0], 10);
    }

    #[test]
    fn test_blur_of_flat_frame_is_flat() {
        let frame = Frame::filled(8, 6, [40, 80, 120, 255]).unwrap();
        assert_eq!(run(&frame, FilterMode::Blur, 90), frame.data.to_vec());
    }

    #[test]
    fn test_edge_of_flat_frame_is_white() {
        let frame = Frame::filled(5, 5, [40, 80, 120, 255]).unwrap();
        let out = run(&frame, FilterMode::Edge, 50);
        assert!(out.chunks(4).all(|p| p[..3] == [255, 255, 255]));
    }

    #[test]
    fn test_intensity_ignored_where_unused() {
        let frame = crate::backends::camera::SyntheticSource::new(80, 72).render(3);
        for mode in FilterMode::ALL {
            if !mode.uses_intensity() {
                assert_eq!(run(&frame, mode, 0), run(&frame, mode, 100), "{mode}");
            }
        }
        assert!(FilterMode::Gray.uses_intensity());
    }

    #[test]
    fn test_rejects_mismatched_output() {
        let frame = Frame::filled(2, 2, [0, 0, 0, 255]).unwrap();
        let mut out = vec![0u8; 3];
        let err = CpuFilterEngine::new()
            .apply(&frame, FilterConfig::default(), &mut out)
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::BufferSize {
                expected: 16,
                actual: 3
            }
        );
    }
}
