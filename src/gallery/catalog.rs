// SPDX-License-Identifier: MPL-2.0

//! Ordered view over the app's persisted snapshots
//!
//! Every [`Catalog::load`] re-enumerates storage; nothing is cached between
//! loads, so artifacts removed behind the app's back simply disappear.

use super::favorites::FavoritesStore;
use crate::errors::{CatalogError, DeleteError, MetadataError, StorageError};
use crate::pipelines::photo::Provenance;
use crate::storage::{ArtifactId, ArtifactStore};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// One artifact as shown in the gallery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: ArtifactId,
    pub created_at: DateTime<Utc>,
    pub is_favorite: bool,
}

/// Result of a load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogListing {
    /// Nothing saved yet
    Empty,
    /// Most recent first
    Entries(Vec<CatalogEntry>),
}

impl CatalogListing {
    pub fn is_empty(&self) -> bool {
        matches!(self, CatalogListing::Empty)
    }

    pub fn len(&self) -> usize {
        match self {
            CatalogListing::Empty => 0,
            CatalogListing::Entries(entries) => entries.len(),
        }
    }

    pub fn into_entries(self) -> Vec<CatalogEntry> {
        match self {
            CatalogListing::Empty => Vec::new(),
            CatalogListing::Entries(entries) => entries,
        }
    }
}

/// Catalog of one namespace; clones share storage and favourites
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn ArtifactStore>,
    namespace: String,
    favorites: Arc<Mutex<FavoritesStore>>,
}

impl Catalog {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        namespace: impl Into<String>,
        favorites: FavoritesStore,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            favorites: Arc::new(Mutex::new(favorites)),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn favorites(&self) -> MutexGuard<'_, FavoritesStore> {
        self.favorites.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enumerate the namespace, most recent first
    ///
    /// Favourites pointing at artifacts of this namespace that no longer
    /// exist are pruned along the way.
    pub fn load(&self) -> Result<CatalogListing, CatalogError> {
        let records = self.store.list(&self.namespace)?;
        let existing: HashSet<&ArtifactId> = records.iter().map(|r| &r.id).collect();

        let mut favorites = self.favorites();
        favorites.retain_existing(|id| {
            id.namespace() != Some(self.namespace.as_str()) || existing.contains(id)
        });

        let entries: Vec<CatalogEntry> = records
            .iter()
            .map(|record| CatalogEntry {
                id: record.id.clone(),
                created_at: record.created_at,
                is_favorite: favorites.contains(&record.id),
            })
            .collect();

        debug!(namespace = %self.namespace, count = entries.len(), "Catalog loaded");
        if entries.is_empty() {
            Ok(CatalogListing::Empty)
        } else {
            Ok(CatalogListing::Entries(entries))
        }
    }

    /// Delete an artifact
    ///
    /// `NotFound` means the artifact was already gone; its favourite flag is
    /// dropped either way. Ids outside this catalog's namespace are never
    /// passed to storage and report `NotFound`.
    pub fn delete(&self, id: &ArtifactId) -> Result<(), DeleteError> {
        if id.namespace() != Some(self.namespace.as_str()) {
            debug!(id = %id, namespace = %self.namespace, "Refusing to delete outside the catalog");
            return Err(DeleteError::NotFound(id.clone()));
        }
        match self.store.delete(id) {
            Ok(true) => {
                self.favorites().remove(id);
                info!(id = %id, "Artifact deleted");
                Ok(())
            }
            Ok(false) | Err(StorageError::NotFound(_)) => {
                self.favorites().remove(id);
                debug!(id = %id, "Artifact already deleted");
                Err(DeleteError::NotFound(id.clone()))
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Failed to delete artifact");
                Err(DeleteError::DeleteFailed(e.to_string()))
            }
        }
    }

    /// Attached provenance, `None` if the artifact has none
    pub fn provenance(&self, id: &ArtifactId) -> Result<Option<Provenance>, MetadataError> {
        Ok(self.store.read_metadata(id)?.map(|m| m.provenance))
    }

    pub fn is_favorite(&self, id: &ArtifactId) -> bool {
        self.favorites().contains(id)
    }

    /// Flip the favourite flag; the artifact does not have to exist
    pub fn toggle_favorite(&self, id: &ArtifactId) -> bool {
        self.favorites().toggle(id)
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
