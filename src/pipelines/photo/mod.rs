// SPDX-License-Identifier: MPL-2.0

//! Async photo capture pipeline
//!
//! ```text
//! LatestFrame → copy → RGB → JPEG → reserve/write/finalize → attach provenance
//!      ↓
//! Preview continues uninterrupted
//! ```
//!
//! Everything after the copy runs on the blocking pool, off the frame path.

pub mod capture;
pub mod encoding;
pub mod processing;
pub mod provenance;

pub use capture::{CaptureReceipt, CaptureService};
pub use encoding::{EncodedImage, EncodingQuality, PhotoEncoder};
pub use provenance::{
    ArtifactMetadata, Provenance, ProvenanceTags, SnapshotArtifact, artifact_name,
    parse_artifact_name, user_comment,
};
