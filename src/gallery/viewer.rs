// SPDX-License-Identifier: MPL-2.0

//! Single-artifact viewer and the list screen that opens it
//!
//! A [`ViewerSession`] works on a copy of the list taken when it opens. Closing
//! it yields a [`ViewerOutcome`] naming every artifact deleted and every
//! favourite changed, which [`CatalogView::resume`] applies in place. A session
//! that is dropped without closing yields nothing, and the list reloads.

use super::catalog::{Catalog, CatalogEntry, CatalogListing};
use crate::errors::{CatalogError, DeleteError};
use crate::storage::ArtifactId;
use tracing::{debug, info};

/// Where the viewer stands after a deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerStep {
    /// Showing the entry at this index
    Showing(usize),
    /// Nothing left to show; the session should be closed
    Finished,
}

/// Changes made during a viewer session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerOutcome {
    /// Deleted artifacts, in deletion order
    pub deleted: Vec<ArtifactId>,
    /// Final favourite state of every artifact toggled
    pub favorites: Vec<(ArtifactId, bool)>,
}

impl ViewerOutcome {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.favorites.is_empty()
    }
}

pub struct ViewerSession {
    catalog: Catalog,
    entries: Vec<CatalogEntry>,
    index: usize,
    outcome: ViewerOutcome,
}

impl ViewerSession {
    /// Open on `entries` at `start_index` (clamped); `None` for an empty list
    pub fn open(catalog: Catalog, entries: Vec<CatalogEntry>, start_index: usize) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        let index = start_index.min(entries.len() - 1);
        debug!(index, count = entries.len(), "Viewer opened");
        Some(Self {
            catalog,
            entries,
            index,
            outcome: ViewerOutcome::default(),
        })
    }

    pub fn current(&self) -> Option<&CatalogEntry> {
        self.entries.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move forward; returns false at the last entry
    pub fn next(&mut self) -> bool {
        if self.index + 1 < self.entries.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Move back; returns false at the first entry
    pub fn previous(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Delete the entry on screen
    ///
    /// The viewer stays at the same position, which now shows the following
    /// entry, or the new last one if the deleted entry was last. An artifact
    /// that was already gone is removed the same way. On `DeleteFailed` the
    /// entry stays.
    pub fn delete_current(&mut self) -> Result<ViewerStep, DeleteError> {
        let Some(entry) = self.entries.get(self.index) else {
            return Ok(ViewerStep::Finished);
        };
        let id = entry.id.clone();

        match self.catalog.delete(&id) {
            Ok(()) => {}
            Err(DeleteError::NotFound(_)) => {
                info!(id = %id, "Artifact was already deleted");
            }
            Err(e) => return Err(e),
        }

        self.entries.remove(self.index);
        self.outcome.favorites.retain(|(fav, _)| fav != &id);
        self.outcome.deleted.push(id);

        if self.entries.is_empty() {
            debug!("Viewer has no more entries");
            return Ok(ViewerStep::Finished);
        }
        self.index = self.index.min(self.entries.len() - 1);
        Ok(ViewerStep::Showing(self.index))
    }

    /// Flip the favourite flag of the entry on screen; returns the new state
    pub fn toggle_favorite_current(&mut self) -> Option<bool> {
        let entry = self.entries.get_mut(self.index)?;
        let favorite = self.catalog.toggle_favorite(&entry.id);
        entry.is_favorite = favorite;

        match self
            .outcome
            .favorites
            .iter_mut()
            .find(|(id, _)| id == &entry.id)
        {
            Some((_, state)) => *state = favorite,
            None => self.outcome.favorites.push((entry.id.clone(), favorite)),
        }
        Some(favorite)
    }

    /// End the session and report what changed
    pub fn close(self) -> ViewerOutcome {
        debug!(
            deleted = self.outcome.deleted.len(),
            favorites = self.outcome.favorites.len(),
            "Viewer closed"
        );
        self.outcome
    }
}

/// How [`CatalogView::resume`] brought the list up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeAction {
    /// The outcome was applied to the existing list
    Targeted,
    /// The list was re-enumerated from storage
    Reloaded,
}

/// The gallery list screen
pub struct CatalogView {
    catalog: Catalog,
    entries: Vec<CatalogEntry>,
}

impl CatalogView {
    /// A view with nothing loaded yet; call [`CatalogView::refresh`]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            entries: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Reload from storage
    pub fn refresh(&mut self) -> Result<(), CatalogError> {
        self.entries = self.catalog.load()?.into_entries();
        Ok(())
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn listing(&self) -> CatalogListing {
        if self.entries.is_empty() {
            CatalogListing::Empty
        } else {
            CatalogListing::Entries(self.entries.clone())
        }
    }

    /// Open the viewer on the entry at `index`
    pub fn open_viewer(&self, index: usize) -> Option<ViewerSession> {
        ViewerSession::open(self.catalog.clone(), self.entries.clone(), index)
    }

    /// Bring the list up to date after a viewer session
    ///
    /// Without an outcome, or with one that names entries this list does not
    /// have, the list is reloaded.
    pub fn resume(&mut self, outcome: Option<ViewerOutcome>) -> Result<ResumeAction, CatalogError> {
        let Some(outcome) = outcome else {
            debug!("Viewer closed without outcome, reloading");
            self.refresh()?;
            return Ok(ResumeAction::Reloaded);
        };

        if self.apply(&outcome) {
            Ok(ResumeAction::Targeted)
        } else {
            debug!("Viewer outcome does not match the list, reloading");
            self.refresh()?;
            Ok(ResumeAction::Reloaded)
        }
    }

    fn apply(&mut self, outcome: &ViewerOutcome) -> bool {
        let known = |id: &ArtifactId| self.entries.iter().any(|e| &e.id == id);
        let matches = outcome.deleted.iter().all(known)
            && outcome.favorites.iter().all(|(id, _)| known(id));
        if !matches {
            return false;
        }

        for id in &outcome.deleted {
            if let Some(pos) = self.entries.iter().position(|e| &e.id == id) {
                self.entries.remove(pos);
            }
        }
        for (id, favorite) in &outcome.favorites {
            if let Some(entry) = self.entries.iter_mut().find(|e| &e.id == id) {
                entry.is_favorite = *favorite;
            }
        }
        true
    }

    /// Delete from the list screen; an already missing artifact leaves the list too
    pub fn delete(&mut self, id: &ArtifactId) -> Result<(), DeleteError> {
        let result = self.catalog.delete(id);
        if matches!(result, Ok(()) | Err(DeleteError::NotFound(_))) {
            self.entries.retain(|e| &e.id != id);
        }
        result
    }

    /// Toggle from the list screen; returns the new state
    pub fn toggle_favorite(&mut self, id: &ArtifactId) -> bool {
        let favorite = self.catalog.toggle_favorite(id);
        if let Some(entry) = self.entries.iter_mut().find(|e| &e.id == id) {
            entry.is_favorite = favorite;
        }
        favorite
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::FavoritesStore;
    use crate::storage::{MemoryStorage, Storage};
    use std::sync::Arc;

    fn view_with(names: &[&str]) -> (CatalogView, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        // Saved oldest first so the list reads in the given order
        for name in names.iter().rev() {
            let pending = storage.reserve(name, "image/jpeg", "Album").unwrap();
            storage.finalize(pending).unwrap();
        }
        let mut view = CatalogView::new(Catalog::new(
            storage.clone(),
            "Album",
            FavoritesStore::in_memory(),
        ));
        view.refresh().unwrap();
        (view, storage)
    }

    fn names(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.name()).collect()
    }

    #[test]
    fn test_navigation_is_clamped() {
        let (view, _) = view_with(&["a.jpg", "b.jpg"]);
        let mut session = view.open_viewer(7).unwrap();
        assert_eq!(session.index(), 1);
        assert!(!session.next());
        assert!(session.previous());
        assert!(!session.previous());
        assert_eq!(session.current().unwrap().id.name(), "a.jpg");
    }

    #[test]
    fn test_delete_last_entry_moves_back() {
        let (view, _) = view_with(&["a.jpg", "b.jpg"]);
        let mut session = view.open_viewer(1).unwrap();
        assert_eq!(session.delete_current(), Ok(ViewerStep::Showing(0)));
        assert_eq!(session.current().unwrap().id.name(), "a.jpg");
        assert_eq!(session.delete_current(), Ok(ViewerStep::Finished));
        assert!(session.current().is_none());
        assert_eq!(session.close().deleted.len(), 2);
    }

    #[test]
    fn test_already_deleted_entry_is_removed() {
        let (view, storage) = view_with(&["a.jpg", "b.jpg"]);
        let mut session = view.open_viewer(0).unwrap();
        storage.delete(&session.current().unwrap().id).unwrap();

        assert_eq!(session.delete_current(), Ok(ViewerStep::Showing(0)));
        assert_eq!(session.close().deleted[0].name(), "a.jpg");
    }

    #[test]
    fn test_favorite_toggles_reported_once() {
        let (mut view, _) = view_with(&["a.jpg"]);
        let mut session = view.open_viewer(0).unwrap();
        assert_eq!(session.toggle_favorite_current(), Some(true));
        assert_eq!(session.toggle_favorite_current(), Some(false));
        assert_eq!(session.toggle_favorite_current(), Some(true));
        let outcome = session.close();
        assert_eq!(outcome.favorites.len(), 1);
        assert!(outcome.favorites[0].1);

        assert_eq!(view.resume(Some(outcome)).unwrap(), ResumeAction::Targeted);
        assert!(view.entries()[0].is_favorite);
    }

    #[test]
    fn test_resume_without_outcome_reloads() {
        let (mut view, storage) = view_with(&["a.jpg", "b.jpg"]);
        let pending = storage.reserve("c.jpg", "image/jpeg", "Album").unwrap();
        storage.finalize(pending).unwrap();

        let session = view.open_viewer(0).unwrap();
        drop(session);
        assert_eq!(view.resume(None).unwrap(), ResumeAction::Reloaded);
        assert_eq!(names(view.entries()), vec!["c.jpg", "a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_resume_with_unknown_id_reloads() {
        let (mut view, _) = view_with(&["a.jpg"]);
        let outcome = ViewerOutcome {
            deleted: vec![ArtifactId::in_namespace("Album", "zzz.jpg")],
            favorites: Vec::new(),
        };
        assert_eq!(view.resume(Some(outcome)).unwrap(), ResumeAction::Reloaded);
        assert_eq!(names(view.entries()), vec!["a.jpg"]);
    }
}
