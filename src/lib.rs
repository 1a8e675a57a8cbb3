// SPDX-License-Identifier: MPL-2.0

//! FilterCam - live camera filters with a snapshot gallery
//!
//! This library provides the core of the FilterCam application: a real-time
//! filter pipeline over camera frames, snapshot capture with recorded
//! provenance, and a gallery whose list and viewer screens stay consistent.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Frame sources and the latest-wins frame slot
//! - [`filters`]: Filter selection and the CPU filter engine
//! - [`app`]: The frame processor and the preview pipeline around it
//! - [`pipelines`]: Snapshot encoding, persistence and provenance
//! - [`storage`]: Artifact storage (filesystem or in memory)
//! - [`gallery`]: Catalog, favorites, viewer and list screens
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```no_run
//! use filtercam::app::PreviewPipeline;
//! use filtercam::backends::camera::SyntheticSource;
//! use filtercam::filters::{CpuFilterEngine, FilterConfig, FilterMode, SharedFilterConfig};
//!
//! let config = SharedFilterConfig::new(FilterConfig::new(FilterMode::Cartoon, 70));
//! let mut pipeline = PreviewPipeline::start(SyntheticSource::default(), CpuFilterEngine::new(), config);
//! let latest = pipeline.latest();
//! std::thread::sleep(std::time::Duration::from_millis(200));
//! if let Some(frame) = latest.snapshot() {
//!     println!("{}x{} {}", frame.frame.width, frame.frame.height, frame.applied.mode);
//! }
//! pipeline.stop();
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod filters;
pub mod gallery;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use app::{FrameProcessor, LatestFrame, PreviewPipeline, ProcessedFrame};
pub use config::Config;
pub use filters::{FilterConfig, FilterMode, Intensity, SharedFilterConfig};
pub use gallery::{Catalog, CatalogView, FavoritesStore, ViewerOutcome, ViewerSession};
pub use pipelines::photo::CaptureService;
