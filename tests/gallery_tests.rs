// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the gallery: deletion, favorites and the
//! list/viewer round trip

use filtercam::errors::{DeleteError, MetadataError, StorageError};
use filtercam::gallery::{
    Catalog, CatalogListing, CatalogView, FavoritesStore, ResumeAction, ViewerStep,
};
use filtercam::pipelines::photo::ArtifactMetadata;
use filtercam::storage::{
    ArtifactId, ArtifactRecord, FsStorage, MemoryStorage, MetadataWriter, PendingId, Storage,
};
use std::sync::Arc;
use std::time::Duration;

const NAMESPACE: &str = "FilterCam";

fn save(storage: &dyn Storage, name: &str) -> ArtifactId {
    let pending = storage.reserve(name, "image/jpeg", NAMESPACE).unwrap();
    storage.write(&pending, &[0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
    storage.finalize(pending).unwrap()
}

/// Saves oldest first, pausing so creation times differ
fn save_all(storage: &dyn Storage, names: &[&str]) -> Vec<ArtifactId> {
    names
        .iter()
        .map(|name| {
            let id = save(storage, name);
            std::thread::sleep(Duration::from_millis(15));
            id
        })
        .collect()
}

fn names(view: &CatalogView) -> Vec<String> {
    view.entries()
        .iter()
        .map(|e| e.id.name().to_string())
        .collect()
}

#[test]
fn test_delete_twice_reports_not_found() {
    let storage = Arc::new(MemoryStorage::new());
    let id = save(storage.as_ref(), "a.jpg");
    let catalog = Catalog::new(storage, NAMESPACE, FavoritesStore::in_memory());

    assert_eq!(catalog.delete(&id), Ok(()));
    assert_eq!(catalog.delete(&id), Err(DeleteError::NotFound(id.clone())));
    assert!(catalog.load().unwrap().is_empty());
}

#[test]
fn test_deleted_favorite_never_reappears() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FsStorage::new(dir.path().join("pictures")));
    let favorites_path = dir.path().join("favorites.json");
    let ids = save_all(storage.as_ref(), &["a.jpg", "b.jpg"]);

    let catalog = Catalog::new(
        storage.clone(),
        NAMESPACE,
        FavoritesStore::open(&favorites_path),
    );
    assert!(catalog.toggle_favorite(&ids[0]));
    catalog.delete(&ids[0]).unwrap();

    // A fresh process sees neither the artifact nor its flag
    let reopened = Catalog::new(storage, NAMESPACE, FavoritesStore::open(&favorites_path));
    let entries = reopened.load().unwrap().into_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, ids[1]);
    assert!(!entries[0].is_favorite);
    assert!(!reopened.is_favorite(&ids[0]));
}

#[test]
fn test_favorite_of_externally_removed_artifact_is_swept() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FsStorage::new(dir.path()));
    let ids = save_all(storage.as_ref(), &["a.jpg", "b.jpg"]);
    let catalog = Catalog::new(storage.clone(), NAMESPACE, FavoritesStore::in_memory());
    catalog.toggle_favorite(&ids[0]);
    catalog.toggle_favorite(&ids[1]);

    std::fs::remove_file(storage.namespace_dir(NAMESPACE).join("a.jpg")).unwrap();

    let entries = catalog.load().unwrap().into_entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_favorite);
    assert!(!catalog.is_favorite(&ids[0]));
}

#[test]
fn test_viewer_delete_round_trip() {
    let storage = Arc::new(MemoryStorage::new());
    save_all(storage.as_ref(), &["c.jpg", "b.jpg", "a.jpg"]);
    let mut view = CatalogView::new(Catalog::new(
        storage.clone(),
        NAMESPACE,
        FavoritesStore::in_memory(),
    ));
    view.refresh().unwrap();
    assert_eq!(names(&view), ["a.jpg", "b.jpg", "c.jpg"]);

    let mut session = view.open_viewer(1).unwrap();
    assert_eq!(session.current().unwrap().id.name(), "b.jpg");
    assert_eq!(session.delete_current(), Ok(ViewerStep::Showing(1)));
    assert_eq!(session.current().unwrap().id.name(), "c.jpg");

    let outcome = session.close();
    assert_eq!(outcome.deleted.len(), 1);
    assert_eq!(outcome.deleted[0].name(), "b.jpg");

    assert_eq!(view.resume(Some(outcome)).unwrap(), ResumeAction::Targeted);
    assert_eq!(names(&view), ["a.jpg", "c.jpg"]);

    // The targeted update matches what storage now holds
    let reloaded: Vec<String> = view
        .catalog()
        .load()
        .unwrap()
        .into_entries()
        .iter()
        .map(|e| e.id.name().to_string())
        .collect();
    assert_eq!(names(&view), reloaded);
}

#[test]
fn test_viewer_deleting_everything_finishes() {
    let storage = Arc::new(MemoryStorage::new());
    save_all(storage.as_ref(), &["b.jpg", "a.jpg"]);
    let mut view = CatalogView::new(Catalog::new(storage, NAMESPACE, FavoritesStore::in_memory()));
    view.refresh().unwrap();

    let mut session = view.open_viewer(0).unwrap();
    assert_eq!(session.delete_current(), Ok(ViewerStep::Showing(0)));
    assert_eq!(session.delete_current(), Ok(ViewerStep::Finished));

    view.resume(Some(session.close())).unwrap();
    assert!(view.is_empty());
    assert!(matches!(view.listing(), CatalogListing::Empty));
}

#[test]
fn test_viewer_favorite_reflected_in_list() {
    let storage = Arc::new(MemoryStorage::new());
    save_all(storage.as_ref(), &["b.jpg", "a.jpg"]);
    let mut view = CatalogView::new(Catalog::new(storage, NAMESPACE, FavoritesStore::in_memory()));
    view.refresh().unwrap();

    let mut session = view.open_viewer(0).unwrap();
    assert!(session.next());
    assert_eq!(session.toggle_favorite_current(), Some(true));
    let outcome = session.close();

    assert_eq!(view.resume(Some(outcome)).unwrap(), ResumeAction::Targeted);
    let flags: Vec<bool> = view.entries().iter().map(|e| e.is_favorite).collect();
    assert_eq!(flags, [false, true]);
}

#[test]
fn test_list_delete_of_missing_artifact_removes_entry() {
    let storage = Arc::new(MemoryStorage::new());
    let ids = save_all(storage.as_ref(), &["b.jpg", "a.jpg"]);
    let mut view = CatalogView::new(Catalog::new(
        storage.clone(),
        NAMESPACE,
        FavoritesStore::in_memory(),
    ));
    view.refresh().unwrap();

    storage.delete(&ids[0]).unwrap();
    assert_eq!(view.delete(&ids[0]), Err(DeleteError::NotFound(ids[0].clone())));
    assert_eq!(names(&view), ["a.jpg"]);
}

#[test]
fn test_fs_storage_hides_pending_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FsStorage::new(dir.path()));
    let catalog = Catalog::new(storage.clone(), NAMESPACE, FavoritesStore::in_memory());

    let pending = storage.reserve("a.jpg", "image/jpeg", NAMESPACE).unwrap();
    storage.write(&pending, &[1, 2, 3]).unwrap();
    assert!(catalog.load().unwrap().is_empty());

    storage.finalize(pending).unwrap();
    assert_eq!(catalog.load().unwrap().len(), 1);
}

#[test]
fn test_delete_never_leaves_the_album() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FsStorage::new(dir.path()));
    let catalog = Catalog::new(storage.clone(), NAMESPACE, FavoritesStore::in_memory());

    let vacation = storage.namespace_dir("Vacation");
    std::fs::create_dir_all(&vacation).unwrap();
    std::fs::write(vacation.join("IMG_0001.jpg"), b"holiday").unwrap();
    let album = storage.namespace_dir(NAMESPACE);
    std::fs::create_dir_all(&album).unwrap();
    std::fs::write(album.join("notes.txt"), b"notes").unwrap();

    let foreign = ArtifactId::in_namespace("Vacation", "IMG_0001.jpg");
    assert_eq!(catalog.delete(&foreign), Err(DeleteError::NotFound(foreign.clone())));
    assert!(vacation.join("IMG_0001.jpg").exists());

    let notes = ArtifactId::in_namespace(NAMESPACE, "notes.txt");
    assert_eq!(catalog.delete(&notes), Err(DeleteError::NotFound(notes.clone())));
    assert!(album.join("notes.txt").exists());

    let bare = ArtifactId::new("IMG_0001.jpg");
    assert_eq!(catalog.delete(&bare), Err(DeleteError::NotFound(bare.clone())));
}

/// MemoryStorage whose deletes always fail
#[derive(Default)]
struct ReadOnlyStorage {
    inner: MemoryStorage,
}

impl Storage for ReadOnlyStorage {
    fn reserve(&self, name: &str, mime_type: &str, namespace: &str) -> Result<PendingId, StorageError> {
        self.inner.reserve(name, mime_type, namespace)
    }

    fn write(&self, pending: &PendingId, bytes: &[u8]) -> Result<(), StorageError> {
        self.inner.write(pending, bytes)
    }

    fn finalize(&self, pending: PendingId) -> Result<ArtifactId, StorageError> {
        self.inner.finalize(pending)
    }

    fn abort(&self, pending: PendingId) -> Result<(), StorageError> {
        self.inner.abort(pending)
    }

    fn delete(&self, _: &ArtifactId) -> Result<bool, StorageError> {
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only album",
        )))
    }

    fn list(&self, namespace: &str) -> Result<Vec<ArtifactRecord>, StorageError> {
        self.inner.list(namespace)
    }

    fn read(&self, id: &ArtifactId) -> Result<Vec<u8>, StorageError> {
        self.inner.read(id)
    }
}

impl MetadataWriter for ReadOnlyStorage {
    fn attach(&self, id: &ArtifactId, metadata: &ArtifactMetadata) -> Result<(), MetadataError> {
        self.inner.attach(id, metadata)
    }

    fn read_metadata(&self, id: &ArtifactId) -> Result<Option<ArtifactMetadata>, MetadataError> {
        self.inner.read_metadata(id)
    }
}

fn read_only_view(names: &[&str]) -> (CatalogView, Vec<ArtifactId>) {
    let storage = Arc::new(ReadOnlyStorage::default());
    let ids = save_all(storage.as_ref(), names);
    let mut view = CatalogView::new(Catalog::new(storage, NAMESPACE, FavoritesStore::in_memory()));
    view.refresh().unwrap();
    (view, ids)
}

#[test]
fn test_failed_delete_keeps_entry_everywhere() {
    let (mut view, ids) = read_only_view(&["b.jpg", "a.jpg"]);
    assert!(view.catalog().toggle_favorite(&ids[0]));

    let result = view.catalog().delete(&ids[0]);
    assert!(matches!(result, Err(DeleteError::DeleteFailed(_))));
    assert!(view.catalog().is_favorite(&ids[0]));

    assert!(matches!(view.delete(&ids[0]), Err(DeleteError::DeleteFailed(_))));
    assert_eq!(names(&view), ["a.jpg", "b.jpg"]);
    assert_eq!(view.catalog().load().unwrap().len(), 2);
}

#[test]
fn test_failed_delete_keeps_viewer_position() {
    let (mut view, _) = read_only_view(&["c.jpg", "b.jpg", "a.jpg"]);

    let mut session = view.open_viewer(1).unwrap();
    assert!(matches!(session.delete_current(), Err(DeleteError::DeleteFailed(_))));
    assert_eq!(session.current().unwrap().id.name(), "b.jpg");
    assert_eq!(session.index(), 1);
    assert_eq!(session.len(), 3);

    let outcome = session.close();
    assert!(outcome.deleted.is_empty());
    assert_eq!(view.resume(Some(outcome)).unwrap(), ResumeAction::Targeted);
    assert_eq!(names(&view), ["a.jpg", "b.jpg", "c.jpg"]);
}
