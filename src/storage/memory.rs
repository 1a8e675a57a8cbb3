// SPDX-License-Identifier: MPL-2.0

//! In-process storage with the same staged visibility as [`super::FsStorage`]

use super::{
    ArtifactId, ArtifactRecord, MetadataWriter, PendingId, Storage, split_id, unique_name,
    validate_component,
};
use crate::errors::{MetadataError, StorageError};
use crate::pipelines::photo::ArtifactMetadata;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

struct Pending {
    namespace: String,
    name: String,
    bytes: Vec<u8>,
}

struct Stored {
    record: ArtifactRecord,
    bytes: Vec<u8>,
    metadata: Option<ArtifactMetadata>,
}

#[derive(Default)]
struct State {
    pending: HashMap<PendingId, Pending>,
    /// In finalize order
    artifacts: Vec<Stored>,
}

#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of reserved but not finalized artifacts
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }
}

impl Storage for MemoryStorage {
    fn reserve(
        &self,
        name: &str,
        mime_type: &str,
        namespace: &str,
    ) -> Result<PendingId, StorageError> {
        validate_component("namespace", namespace)?;
        validate_component("name", name)?;
        let id = PendingId::generate();
        debug!(pending = %id, name, mime_type, "Reserved pending artifact");
        self.lock().pending.insert(
            id.clone(),
            Pending {
                namespace: namespace.to_string(),
                name: name.to_string(),
                bytes: Vec::new(),
            },
        );
        Ok(id)
    }

    fn write(&self, pending: &PendingId, bytes: &[u8]) -> Result<(), StorageError> {
        let mut state = self.lock();
        let entry = state
            .pending
            .get_mut(pending)
            .ok_or_else(|| StorageError::UnknownPending(pending.to_string()))?;
        entry.bytes.extend_from_slice(bytes);
        Ok(())
    }

    fn finalize(&self, pending: PendingId) -> Result<ArtifactId, StorageError> {
        let mut state = self.lock();
        let entry = state
            .pending
            .remove(&pending)
            .ok_or_else(|| StorageError::UnknownPending(pending.to_string()))?;

        let name = unique_name(&entry.name, |candidate| {
            let candidate = ArtifactId::in_namespace(&entry.namespace, candidate);
            state.artifacts.iter().any(|a| a.record.id == candidate)
        });
        let id = ArtifactId::in_namespace(&entry.namespace, &name);
        state.artifacts.push(Stored {
            record: ArtifactRecord {
                id: id.clone(),
                created_at: Utc::now(),
            },
            bytes: entry.bytes,
            metadata: None,
        });
        Ok(id)
    }

    fn abort(&self, pending: PendingId) -> Result<(), StorageError> {
        self.lock()
            .pending
            .remove(&pending)
            .map(|_| ())
            .ok_or_else(|| StorageError::UnknownPending(pending.to_string()))
    }

    fn delete(&self, id: &ArtifactId) -> Result<bool, StorageError> {
        split_id(id)?;
        let mut state = self.lock();
        let before = state.artifacts.len();
        state.artifacts.retain(|a| &a.record.id != id);
        Ok(state.artifacts.len() != before)
    }

    fn list(&self, namespace: &str) -> Result<Vec<ArtifactRecord>, StorageError> {
        validate_component("namespace", namespace)?;
        // Newest finalize first, so the stable sort keeps that order on ties
        let mut records: Vec<ArtifactRecord> = self
            .lock()
            .artifacts
            .iter()
            .rev()
            .filter(|a| a.record.id.namespace() == Some(namespace))
            .map(|a| a.record.clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn read(&self, id: &ArtifactId) -> Result<Vec<u8>, StorageError> {
        self.lock()
            .artifacts
            .iter()
            .find(|a| &a.record.id == id)
            .map(|a| a.bytes.clone())
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }
}

impl MetadataWriter for MemoryStorage {
    fn attach(&self, id: &ArtifactId, metadata: &ArtifactMetadata) -> Result<(), MetadataError> {
        let mut state = self.lock();
        let stored = state
            .artifacts
            .iter_mut()
            .find(|a| &a.record.id == id)
            .ok_or_else(|| MetadataError::NotFound(id.to_string()))?;
        if stored.metadata.is_some() {
            return Err(MetadataError::AlreadyAttached(id.to_string()));
        }
        stored.metadata = Some(metadata.clone());
        Ok(())
    }

    fn read_metadata(&self, id: &ArtifactId) -> Result<Option<ArtifactMetadata>, MetadataError> {
        self.lock()
            .artifacts
            .iter()
            .find(|a| &a.record.id == id)
            .map(|a| a.metadata.clone())
            .ok_or_else(|| MetadataError::NotFound(id.to_string()))
    }
}
