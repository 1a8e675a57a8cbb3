// SPDX-License-Identifier: MPL-2.0

//! Directory-backed storage
//!
//! Layout under the root (normally the user's pictures directory):
//!
//! ```text
//! <root>/<namespace>/<name>.jpg           finalized artifact
//! <root>/<namespace>/.pending-<id>-<name> staged bytes, hidden from list()
//! <root>/<namespace>/.<name>.json         provenance sidecar
//! ```
//!
//! Finalizing renames the staged file into place, so `list` never sees a
//! partially written artifact.

use super::{
    ArtifactId, ArtifactRecord, MetadataWriter, PendingId, Storage, sort_by_recency, split_id,
    unique_name, validate_component,
};
use crate::constants::snapshot;
use crate::errors::{MetadataError, StorageError};
use crate::pipelines::photo::ArtifactMetadata;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Whether a file name in a namespace directory is a finalized snapshot
fn is_snapshot_name(name: &str) -> bool {
    !name.starts_with('.')
        && Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(snapshot::EXTENSION))
}

struct PendingEntry {
    namespace: String,
    name: String,
    path: PathBuf,
}

pub struct FsStorage {
    root: PathBuf,
    pending: Mutex<HashMap<PendingId, PendingEntry>>,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a namespace's artifacts
    pub fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace)
    }

    fn artifact_path(&self, id: &ArtifactId) -> Result<PathBuf, StorageError> {
        let (namespace, name) = split_id(id)?;
        Ok(self.namespace_dir(namespace).join(name))
    }

    fn sidecar_path(&self, id: &ArtifactId) -> Result<PathBuf, StorageError> {
        let (namespace, name) = split_id(id)?;
        Ok(self
            .namespace_dir(namespace)
            .join(format!(".{name}{}", snapshot::SIDECAR_SUFFIX)))
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<PendingId, PendingEntry>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove staged files left behind by an interrupted run
    ///
    /// Only files not reserved by this instance are touched.
    pub fn purge_stale_pending(&self, namespace: &str) -> Result<usize, StorageError> {
        validate_component("namespace", namespace)?;
        let dir = self.namespace_dir(namespace);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let live: Vec<PathBuf> = self.lock_pending().values().map(|p| p.path.clone()).collect();
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_pending = entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(snapshot::PENDING_PREFIX));
            if is_pending && !live.contains(&path) {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove stale pending file"),
                }
            }
        }
        if removed > 0 {
            info!(namespace, removed, "Removed stale pending files");
        }
        Ok(removed)
    }
}

impl Storage for FsStorage {
    fn reserve(
        &self,
        name: &str,
        mime_type: &str,
        namespace: &str,
    ) -> Result<PendingId, StorageError> {
        validate_component("namespace", namespace)?;
        validate_component("name", name)?;

        let dir = self.namespace_dir(namespace);
        fs::create_dir_all(&dir)?;

        let id = PendingId::generate();
        let path = dir.join(format!("{}{}-{}", snapshot::PENDING_PREFIX, id, name));
        OpenOptions::new().write(true).create_new(true).open(&path)?;

        debug!(pending = %id, name, mime_type, path = %path.display(), "Reserved pending artifact");
        self.lock_pending().insert(
            id.clone(),
            PendingEntry {
                namespace: namespace.to_string(),
                name: name.to_string(),
                path,
            },
        );
        Ok(id)
    }

    fn write(&self, pending: &PendingId, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self
            .lock_pending()
            .get(pending)
            .map(|p| p.path.clone())
            .ok_or_else(|| StorageError::UnknownPending(pending.to_string()))?;

        let mut file = OpenOptions::new().append(true).open(&path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(())
    }

    fn finalize(&self, pending: PendingId) -> Result<ArtifactId, StorageError> {
        let entry = self
            .lock_pending()
            .remove(&pending)
            .ok_or_else(|| StorageError::UnknownPending(pending.to_string()))?;

        let dir = self.namespace_dir(&entry.namespace);
        let name = unique_name(&entry.name, |candidate| dir.join(candidate).exists());
        let target = dir.join(&name);

        if let Err(e) = fs::rename(&entry.path, &target) {
            let _ = fs::remove_file(&entry.path);
            return Err(e.into());
        }

        info!(path = %target.display(), "Artifact finalized");
        Ok(ArtifactId::in_namespace(&entry.namespace, &name))
    }

    fn abort(&self, pending: PendingId) -> Result<(), StorageError> {
        let entry = self
            .lock_pending()
            .remove(&pending)
            .ok_or_else(|| StorageError::UnknownPending(pending.to_string()))?;

        match fs::remove_file(&entry.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        debug!(pending = %pending, "Pending artifact aborted");
        Ok(())
    }

    fn delete(&self, id: &ArtifactId) -> Result<bool, StorageError> {
        let path = self.artifact_path(id)?;
        // Only files `list` would show are artifacts
        if !is_snapshot_name(id.name()) {
            debug!(id = %id, "Not a snapshot, nothing deleted");
            return Ok(false);
        }
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        }

        let sidecar = self.sidecar_path(id)?;
        if let Err(e) = fs::remove_file(&sidecar)
            && e.kind() != ErrorKind::NotFound
        {
            warn!(path = %sidecar.display(), error = %e, "Failed to remove metadata sidecar");
        }

        info!(path = %path.display(), "Artifact deleted");
        Ok(true)
    }

    fn list(&self, namespace: &str) -> Result<Vec<ArtifactRecord>, StorageError> {
        validate_component("namespace", namespace)?;
        let dir = self.namespace_dir(namespace);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for entry in entries.flatten() {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if !is_snapshot_name(&name) {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let created = metadata.created().or_else(|_| metadata.modified());
            let created_at = created.map(DateTime::<Utc>::from).unwrap_or_default();
            records.push(ArtifactRecord {
                id: ArtifactId::in_namespace(namespace, &name),
                created_at,
            });
        }

        sort_by_recency(&mut records);
        debug!(namespace, count = records.len(), "Listed artifacts");
        Ok(records)
    }

    fn read(&self, id: &ArtifactId) -> Result<Vec<u8>, StorageError> {
        let path = self.artifact_path(id)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(id.to_string()),
            _ => e.into(),
        })
    }
}

impl MetadataWriter for FsStorage {
    fn attach(&self, id: &ArtifactId, metadata: &ArtifactMetadata) -> Result<(), MetadataError> {
        let path = self
            .artifact_path(id)
            .map_err(|_| MetadataError::NotFound(id.to_string()))?;
        if !path.is_file() {
            return Err(MetadataError::NotFound(id.to_string()));
        }

        let sidecar = self
            .sidecar_path(id)
            .map_err(|_| MetadataError::NotFound(id.to_string()))?;
        let file = match OpenOptions::new().write(true).create_new(true).open(&sidecar) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(MetadataError::AlreadyAttached(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::to_writer_pretty(file, metadata)?;
        debug!(id = %id, "Metadata attached");
        Ok(())
    }

    fn read_metadata(&self, id: &ArtifactId) -> Result<Option<ArtifactMetadata>, MetadataError> {
        let sidecar = self
            .sidecar_path(id)
            .map_err(|_| MetadataError::NotFound(id.to_string()))?;
        match fs::read_to_string(&sidecar) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let exists = self.artifact_path(id).is_ok_and(|p| p.is_file());
                if exists {
                    Ok(None)
                } else {
                    Err(MetadataError::NotFound(id.to_string()))
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterConfig, FilterMode};
    use crate::pipelines::photo::{Provenance, ProvenanceTags};

    fn stage(storage: &FsStorage, name: &str, bytes: &[u8]) -> PendingId {
        let pending = storage.reserve(name, snapshot::MIME_TYPE, "Album").unwrap();
        storage.write(&pending, bytes).unwrap();
        pending
    }

    fn metadata() -> ArtifactMetadata {
        let config = FilterConfig::new(FilterMode::Cartoon, 70);
        ArtifactMetadata {
            provenance: Provenance::new(config, Utc::now()),
            tags: ProvenanceTags::for_config(config),
        }
    }

    #[test]
    fn test_delete_ignores_non_snapshot_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let album = storage.namespace_dir("Album");
        fs::create_dir_all(&album).unwrap();
        fs::write(album.join("notes.txt"), b"keep me").unwrap();

        let id = ArtifactId::in_namespace("Album", "notes.txt");
        assert!(!storage.delete(&id).unwrap());
        assert!(album.join("notes.txt").exists());
    }

    #[test]
    fn test_pending_is_invisible_until_finalized() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let pending = stage(&storage, "a.jpg", b"jpeg");

        assert!(storage.list("Album").unwrap().is_empty());
        let id = storage.finalize(pending).unwrap();

        let listed = storage.list("Album").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(storage.read(&id).unwrap(), b"jpeg");
    }

    #[test]
    fn test_abort_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let pending = stage(&storage, "a.jpg", b"partial");
        storage.abort(pending.clone()).unwrap();

        assert!(storage.list("Album").unwrap().is_empty());
        assert_eq!(fs::read_dir(dir.path().join("Album")).unwrap().count(), 0);
        assert!(matches!(
            storage.write(&pending, b"x"),
            Err(StorageError::UnknownPending(_))
        ));
    }

    #[test]
    fn test_finalize_deduplicates_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let first = stage(&storage, "a.jpg", b"1");
        let second = stage(&storage, "a.jpg", b"2");
        assert_eq!(storage.finalize(first).unwrap().name(), "a.jpg");
        assert_eq!(storage.finalize(second).unwrap().name(), "a_1.jpg");
    }

    #[test]
    fn test_delete_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let id = storage.finalize(stage(&storage, "a.jpg", b"1")).unwrap();
        storage.attach(&id, &metadata()).unwrap();

        assert!(storage.delete(&id).unwrap());
        assert!(!storage.delete(&id).unwrap());
        // Sidecar goes with the artifact
        assert!(!dir.path().join("Album/.a.jpg.json").exists());
    }

    #[test]
    fn test_metadata_is_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let id = storage.finalize(stage(&storage, "a.jpg", b"1")).unwrap();

        assert_eq!(storage.read_metadata(&id).unwrap(), None);
        storage.attach(&id, &metadata()).unwrap();
        assert!(matches!(
            storage.attach(&id, &metadata()),
            Err(MetadataError::AlreadyAttached(_))
        ));
        let read = storage.read_metadata(&id).unwrap().unwrap();
        assert_eq!(read.provenance.mode, FilterMode::Cartoon);
        assert_eq!(read.provenance.intensity.value(), 70);
    }

    #[test]
    fn test_attach_to_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let id = ArtifactId::in_namespace("Album", "ghost.jpg");
        assert!(matches!(
            storage.attach(&id, &metadata()),
            Err(MetadataError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        storage.finalize(stage(&storage, "a.jpg", b"1")).unwrap();
        fs::write(dir.path().join("Album/notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("Album/sub.jpg")).unwrap();

        let names: Vec<String> = storage
            .list("Album")
            .unwrap()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg"]);
        assert!(storage.list("Other").unwrap().is_empty());
    }

    #[test]
    fn test_purge_stale_pending() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let live = stage(&storage, "live.jpg", b"1");

        // Staged by a previous process
        let stale = FsStorage::new(dir.path());
        stage(&stale, "old.jpg", b"1");

        assert_eq!(storage.purge_stale_pending("Album").unwrap(), 1);
        storage.finalize(live).unwrap();
        assert_eq!(storage.list("Album").unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_path_escape() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        assert!(matches!(
            storage.reserve("../evil.jpg", snapshot::MIME_TYPE, "Album"),
            Err(StorageError::Rejected(_))
        ));
        assert!(storage.delete(&ArtifactId::new("no-namespace.jpg")).is_err());
    }
}
