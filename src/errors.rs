// SPDX-License-Identifier: MPL-2.0

//! Error types for the filter camera application

use crate::storage::ArtifactId;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Snapshot capture errors
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
    /// Artifact deletion errors
    #[error("Delete error: {0}")]
    Delete(#[from] DeleteError),
    /// Catalog enumeration errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Storage collaborator errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// Malformed frames
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
    /// Frame source could not be opened
    #[error("Frame source error: {0}")]
    Source(#[from] SourceError),
    /// Provenance could not be read
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
    /// Unknown filter mode supplied by the user
    #[error(transparent)]
    InvalidFilterMode(#[from] InvalidFilterMode),
    /// Ctrl-C handler could not be installed
    #[error("Signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),
    /// Runtime or terminal I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Output serialization failure
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure reported by a filter engine
///
/// The frame processor never lets this escape: it falls back to the
/// unfiltered frame and counts the failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The engine could not process the frame
    #[error("filter engine failed: {0}")]
    Engine(String),
    /// Output buffer does not match the input frame
    #[error("output buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    /// The engine panicked while processing
    #[error("filter engine panicked")]
    Panicked,
}

/// A frame whose pixel buffer does not match its dimensions
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame has zero width or height ({width}x{height})")]
    ZeroSized { width: u32, height: u32 },
    #[error("{width}x{height} RGBA frame needs {expected} bytes, got {actual}")]
    DataLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Errors opening a frame source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unsupported file format: {0}")]
    Unsupported(String),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// A filter mode name or discriminant outside the five known modes
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown filter mode: {0}")]
pub struct InvalidFilterMode(pub String);

/// Errors surfaced by the storage collaborator
#[derive(Debug, Error)]
pub enum StorageError {
    /// A pending id that was never reserved, or already finalized/aborted
    #[error("unknown pending artifact: {0}")]
    UnknownPending(String),
    /// Artifact does not exist
    #[error("artifact not found: {0}")]
    NotFound(String),
    /// Request rejected (bad name, bad namespace, ...)
    #[error("storage rejected request: {0}")]
    Rejected(String),
    /// Underlying filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors attaching or reading provenance metadata
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Provenance is write-once
    #[error("metadata already attached to {0}")]
    AlreadyAttached(String),
    /// Artifact does not exist
    #[error("artifact not found: {0}")]
    NotFound(String),
    #[error("metadata serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("metadata I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Snapshot capture errors
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Capture requested before the first frame was processed
    #[error("No frame available for capture")]
    NoFrameAvailable,
    /// Reserve, write or finalize failed; nothing was left visible
    #[error("Failed to save snapshot: {0}")]
    StorageWriteFailed(#[source] StorageError),
    /// JPEG encoding failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
    /// The background task running the capture died
    #[error("Capture task failed: {0}")]
    TaskFailed(String),
}

/// Artifact deletion errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeleteError {
    /// The artifact is already gone; callers treat this as consistent
    #[error("artifact not found: {0}")]
    NotFound(ArtifactId),
    /// IO or permission failure; the artifact is still there
    #[error("failed to delete artifact: {0}")]
    DeleteFailed(String),
}

/// Catalog enumeration errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to enumerate artifacts: {0}")]
    Storage(#[from] StorageError),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration directory available")]
    NoConfigDir,
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}
