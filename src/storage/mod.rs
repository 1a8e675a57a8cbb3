// SPDX-License-Identifier: MPL-2.0

//! Artifact storage
//!
//! Snapshots are written with staged visibility: a name is reserved, bytes
//! are written to the pending entry, and only [`Storage::finalize`] makes the
//! artifact show up in [`Storage::list`]. Provenance metadata is attached
//! afterwards through [`MetadataWriter`] and is write-once.
//!
//! Two implementations exist: [`FsStorage`] for a directory under the
//! pictures folder and [`MemoryStorage`] for tests and throwaway sessions.

pub mod fs;
pub mod memory;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

use crate::errors::{MetadataError, StorageError};
use crate::pipelines::photo::ArtifactMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a finalized artifact: `<namespace>/<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn in_namespace(namespace: &str, name: &str) -> Self {
        Self(format!("{namespace}/{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace part, if the id has one
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once('/').map(|(ns, _)| ns)
    }

    /// File name part
    pub fn name(&self) -> &str {
        self.0.split_once('/').map_or(&self.0, |(_, name)| name)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Handle to a reserved, not yet visible artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingId(String);

impl PendingId {
    pub(crate) fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PendingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A finalized artifact as seen by [`Storage::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub id: ArtifactId,
    pub created_at: DateTime<Utc>,
}

impl ArtifactRecord {
    pub fn name(&self) -> &str {
        self.id.name()
    }
}

/// Staged-visibility artifact storage
///
/// All calls are blocking; async callers run them on the blocking pool.
pub trait Storage: Send + Sync {
    /// Reserve a pending artifact called `name` in `namespace`
    fn reserve(&self, name: &str, mime_type: &str, namespace: &str)
    -> Result<PendingId, StorageError>;

    /// Append bytes to a pending artifact
    fn write(&self, pending: &PendingId, bytes: &[u8]) -> Result<(), StorageError>;

    /// Make a pending artifact visible. The final name may differ from the
    /// reserved one if it was already taken.
    fn finalize(&self, pending: PendingId) -> Result<ArtifactId, StorageError>;

    /// Discard a pending artifact
    fn abort(&self, pending: PendingId) -> Result<(), StorageError>;

    /// Remove an artifact; `Ok(false)` when it did not exist
    fn delete(&self, id: &ArtifactId) -> Result<bool, StorageError>;

    /// Finalized artifacts in `namespace`, most recent first
    fn list(&self, namespace: &str) -> Result<Vec<ArtifactRecord>, StorageError>;

    /// Artifact bytes
    fn read(&self, id: &ArtifactId) -> Result<Vec<u8>, StorageError>;
}

/// Provenance attachment for finalized artifacts
pub trait MetadataWriter: Send + Sync {
    /// Attach metadata once; a second attach fails with `AlreadyAttached`
    fn attach(&self, id: &ArtifactId, metadata: &ArtifactMetadata) -> Result<(), MetadataError>;

    /// Attached metadata, `None` if nothing was attached
    fn read_metadata(&self, id: &ArtifactId) -> Result<Option<ArtifactMetadata>, MetadataError>;
}

/// A backend providing both storage and metadata
pub trait ArtifactStore: Storage + MetadataWriter {}

impl<T: Storage + MetadataWriter> ArtifactStore for T {}

/// Reject names that could escape the namespace directory or collide with
/// staging and sidecar files
pub(crate) fn validate_component(kind: &str, value: &str) -> Result<(), StorageError> {
    let bad = value.is_empty()
        || value.starts_with('.')
        || value.contains(['/', '\\'])
        || value.chars().any(char::is_control);
    if bad {
        return Err(StorageError::Rejected(format!("invalid {kind}: {value:?}")));
    }
    Ok(())
}

/// Split an id into validated namespace and name
pub(crate) fn split_id(id: &ArtifactId) -> Result<(&str, &str), StorageError> {
    let namespace = id
        .namespace()
        .ok_or_else(|| StorageError::Rejected(format!("artifact id has no namespace: {id}")))?;
    let name = id.name();
    validate_component("namespace", namespace)?;
    validate_component("name", name)?;
    Ok((namespace, name))
}

/// Append `_1`, `_2`, ... before the extension until `taken` says no
pub(crate) fn unique_name(name: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(name) {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (name, String::new()),
    };
    (1u32..)
        .map(|n| format!("{stem}_{n}{ext}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Most recent first; equal timestamps fall back to name, descending
pub(crate) fn sort_by_recency(records: &mut [ArtifactRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.name().cmp(a.id.name()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_id_parts() {
        let id = ArtifactId::in_namespace("FilterCam", "a.jpg");
        assert_eq!(id.as_str(), "FilterCam/a.jpg");
        assert_eq!(id.namespace(), Some("FilterCam"));
        assert_eq!(id.name(), "a.jpg");
        assert_eq!(ArtifactId::new("a.jpg").namespace(), None);
    }

    #[test]
    fn test_validate_component() {
        assert!(validate_component("name", "a.jpg").is_ok());
        assert!(validate_component("name", "").is_err());
        assert!(validate_component("name", "../a.jpg").is_err());
        assert!(validate_component("name", ".pending-x").is_err());
        assert!(validate_component("namespace", "a/b").is_err());
    }

    #[test]
    fn test_unique_name() {
        let taken = ["a.jpg", "a_1.jpg"];
        assert_eq!(unique_name("b.jpg", |n| taken.contains(&n)), "b.jpg");
        assert_eq!(unique_name("a.jpg", |n| taken.contains(&n)), "a_2.jpg");
    }
}
