// SPDX-License-Identifier: GPL-3.0-only

//! Filter selection and the filter engine seam
//!
//! The selected [`FilterMode`] and [`Intensity`] form a [`FilterConfig`]. The
//! live config is shared between the frame processor and the capture service
//! through a [`SharedFilterConfig`], a lock-free handle that both sides read
//! per call. Pixel work is delegated to a [`FilterEngine`].

pub mod cpu;

pub use cpu::CpuFilterEngine;

use crate::backends::camera::types::Frame;
use crate::constants::{DEFAULT_INTENSITY, MAX_INTENSITY};
use crate::errors::{FilterError, InvalidFilterMode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

/// Visual transform applied to live frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum FilterMode {
    /// Frames are displayed untouched
    #[default]
    None = 0,
    /// Flattened colours with dark outlines
    Cartoon = 1,
    /// Edge map, dark lines on white
    Edge = 2,
    /// Smoothing blur
    Blur = 3,
    /// Grayscale with brightness scaled by intensity
    Gray = 4,
}

impl FilterMode {
    /// All modes in picker order
    pub const ALL: [FilterMode; 5] = [
        FilterMode::None,
        FilterMode::Cartoon,
        FilterMode::Edge,
        FilterMode::Blur,
        FilterMode::Gray,
    ];

    /// Upper-case name used in artifact names and provenance tags
    pub fn name(&self) -> &'static str {
        match self {
            FilterMode::None => "NONE",
            FilterMode::Cartoon => "CARTOON",
            FilterMode::Edge => "EDGE",
            FilterMode::Blur => "BLUR",
            FilterMode::Gray => "GRAY",
        }
    }

    /// Get display name for the mode
    pub fn display_name(&self) -> &'static str {
        match self {
            FilterMode::None => "None",
            FilterMode::Cartoon => "Cartoon",
            FilterMode::Edge => "Edge",
            FilterMode::Blur => "Blur",
            FilterMode::Gray => "Grayscale",
        }
    }

    /// Whether the intensity slider has any effect for this mode
    pub fn uses_intensity(&self) -> bool {
        matches!(self, FilterMode::Edge | FilterMode::Blur | FilterMode::Gray)
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for FilterMode {
    type Error = InvalidFilterMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FilterMode::None),
            1 => Ok(FilterMode::Cartoon),
            2 => Ok(FilterMode::Edge),
            3 => Ok(FilterMode::Blur),
            4 => Ok(FilterMode::Gray),
            other => Err(InvalidFilterMode(other.to_string())),
        }
    }
}

impl FromStr for FilterMode {
    type Err = InvalidFilterMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "original" => Ok(FilterMode::None),
            "cartoon" => Ok(FilterMode::Cartoon),
            "edge" | "edges" => Ok(FilterMode::Edge),
            "blur" => Ok(FilterMode::Blur),
            "gray" | "grey" | "grayscale" | "greyscale" => Ok(FilterMode::Gray),
            _ => Err(InvalidFilterMode(s.to_string())),
        }
    }
}

/// Filter strength, always within 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Intensity(u8);

impl Intensity {
    pub const MIN: Intensity = Intensity(0);
    pub const MAX: Intensity = Intensity(MAX_INTENSITY);

    /// Clamp any integer into the valid range
    pub fn new(value: i32) -> Self {
        Self(value.clamp(0, MAX_INTENSITY as i32) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Intensity as a fraction in 0.0..=1.0
    pub fn fraction(&self) -> f32 {
        self.0 as f32 / MAX_INTENSITY as f32
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self(DEFAULT_INTENSITY)
    }
}

impl From<i64> for Intensity {
    fn from(value: i64) -> Self {
        Self(value.clamp(0, MAX_INTENSITY as i64) as u8)
    }
}

impl From<Intensity> for u8 {
    fn from(value: Intensity) -> Self {
        value.0
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user's current filter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub mode: FilterMode,
    pub intensity: Intensity,
}

impl FilterConfig {
    pub fn new(mode: FilterMode, intensity: i32) -> Self {
        Self {
            mode,
            intensity: Intensity::new(intensity),
        }
    }

    fn pack(self) -> u16 {
        ((self.mode as u16) << 8) | self.intensity.value() as u16
    }

    fn unpack(packed: u16) -> Self {
        // Only `pack` ever writes the cell, so the mode byte is always valid
        let mode = FilterMode::try_from((packed >> 8) as u8).unwrap_or_default();
        Self {
            mode,
            intensity: Intensity::new((packed & 0xff) as i32),
        }
    }
}

/// Lock-free handle to the live filter selection
///
/// Mode and intensity live in one atomic word, so a reader always observes a
/// pair that was set together. Clones share the same cell.
#[derive(Debug, Clone)]
pub struct SharedFilterConfig {
    cell: Arc<AtomicU16>,
}

impl SharedFilterConfig {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            cell: Arc::new(AtomicU16::new(config.pack())),
        }
    }

    /// Read the current selection
    pub fn load(&self) -> FilterConfig {
        FilterConfig::unpack(self.cell.load(Ordering::Acquire))
    }

    /// Replace the whole selection
    pub fn store(&self, config: FilterConfig) {
        self.cell.store(config.pack(), Ordering::Release);
    }

    /// Change the mode, keeping the current intensity
    pub fn set_mode(&self, mode: FilterMode) -> FilterConfig {
        self.update(|config| FilterConfig { mode, ..config })
    }

    /// Change the intensity (clamped), keeping the current mode
    pub fn set_intensity(&self, intensity: i32) -> FilterConfig {
        let intensity = Intensity::new(intensity);
        self.update(|config| FilterConfig { intensity, ..config })
    }

    fn update(&self, f: impl Fn(FilterConfig) -> FilterConfig) -> FilterConfig {
        let previous = self
            .cell
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |packed| {
                Some(f(FilterConfig::unpack(packed)).pack())
            })
            .unwrap_or_else(|packed| packed);
        f(FilterConfig::unpack(previous))
    }
}

impl Default for SharedFilterConfig {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

/// Pixel-level filter implementation
///
/// `output` is a caller-owned RGBA buffer with exactly the input frame's
/// size. Implementations may fail; callers decide how to degrade.
pub trait FilterEngine: Send + Sync {
    fn apply(&self, input: &Frame, config: FilterConfig, output: &mut [u8])
    -> Result<(), FilterError>;

    /// Short name for logging
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<E: FilterEngine + ?Sized> FilterEngine for Arc<E> {
    fn apply(
        &self,
        input: &Frame,
        config: FilterConfig,
        output: &mut [u8],
    ) -> Result<(), FilterError> {
        (**self).apply(input, config, output)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
