// SPDX-License-Identifier: MPL-2.0

//! Persisted set of favourite artifacts
//!
//! The whole set is read once when opened and rewritten in full after every
//! change. Write failures are logged; the in-memory set stays authoritative
//! for the rest of the session.

use crate::storage::ArtifactId;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct FavoritesStore {
    path: Option<PathBuf>,
    ids: BTreeSet<ArtifactId>,
}

impl FavoritesStore {
    /// Load the set stored at `path`; a missing or unreadable file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<BTreeSet<ArtifactId>>(&contents) {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Favorites file is corrupt, starting empty");
                    BTreeSet::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read favorites");
                BTreeSet::new()
            }
        };
        debug!(path = %path.display(), count = ids.len(), "Favorites loaded");
        Self {
            path: Some(path),
            ids,
        }
    }

    /// A set that is never written anywhere
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.ids.contains(id)
    }

    /// Flip the flag for `id` and return the new state
    pub fn toggle(&mut self, id: &ArtifactId) -> bool {
        let favorite = if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        };
        debug!(id = %id, favorite, "Favorite toggled");
        self.persist();
        favorite
    }

    /// Drop `id`; returns whether it was a favourite
    pub fn remove(&mut self, id: &ArtifactId) -> bool {
        let removed = self.ids.remove(id);
        if removed {
            self.persist();
        }
        removed
    }

    /// Keep only ids for which `keep` holds; returns how many were dropped
    pub fn retain_existing(&mut self, keep: impl Fn(&ArtifactId) -> bool) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| keep(id));
        let dropped = before - self.ids.len();
        if dropped > 0 {
            info!(dropped, "Pruned favorites of missing artifacts");
            self.persist();
        }
        dropped
    }

    pub fn ids(&self) -> impl Iterator<Item = &ArtifactId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = write_atomically(path, &self.ids) {
            warn!(path = %path.display(), error = %e, "Failed to save favorites");
        }
    }
}

fn write_atomically(path: &Path, ids: &BTreeSet<ArtifactId>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(ids)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/favorites.json");
        let id = ArtifactId::new("Album/a.jpg");

        let mut store = FavoritesStore::open(&path);
        assert!(store.toggle(&id));
        assert!(FavoritesStore::open(&path).contains(&id));

        assert!(!store.toggle(&id));
        assert!(!FavoritesStore::open(&path).contains(&id));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        fs::write(&path, "{not json").unwrap();
        assert!(FavoritesStore::open(&path).is_empty());
    }

    #[test]
    fn test_toggle_does_not_need_artifact() {
        let mut store = FavoritesStore::in_memory();
        let ghost = ArtifactId::new("Album/ghost.jpg");
        assert!(store.toggle(&ghost));
        assert!(store.contains(&ghost));
        assert!(store.remove(&ghost));
        assert!(!store.remove(&ghost));
    }

    #[test]
    fn test_retain_existing() {
        let mut store = FavoritesStore::in_memory();
        let a = ArtifactId::new("Album/a.jpg");
        let b = ArtifactId::new("Album/b.jpg");
        store.toggle(&a);
        store.toggle(&b);
        assert_eq!(store.retain_existing(|id| id == &a), 1);
        assert_eq!(store.ids().collect::<Vec<_>>(), vec![&a]);
    }
}
