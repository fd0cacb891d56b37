// Integration tests for media storage
//
// These verify output allocation and the recordings catalogue kept by the
// directory-backed store.

use anyhow::Result;
use camera_session::storage::{
    ContentDescriptor, DirectoryMediaStore, MediaCollection, MediaStore, MemoryMediaStore,
    SavedRecording, CATALOGUE_FILE, VIDEO_MIME_TYPE,
};
use chrono::{TimeZone, Utc};
use std::time::Duration;
use tempfile::TempDir;

fn saved(store: &dyn MediaStore, millis: i64, secs: u64) -> Result<SavedRecording> {
    let at = Utc.timestamp_millis_opt(millis).unwrap();
    let descriptor = ContentDescriptor::for_recording("CameraX", at);
    let output_uri = store.allocate(&descriptor)?;
    Ok(SavedRecording {
        descriptor,
        output_uri,
        duration: Duration::from_secs(secs),
        saved_at: at,
    })
}

#[test]
fn test_descriptor_for_recording() {
    let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    let descriptor = ContentDescriptor::for_recording("CameraX", at);

    assert_eq!(descriptor.display_name, "CameraX-recording-1700000000123.mp4");
    assert_eq!(descriptor.mime_type, VIDEO_MIME_TYPE);
    assert_eq!(descriptor.collection, MediaCollection::ExternalVideo);
}

#[test]
fn test_directory_store_creates_root() -> Result<()> {
    let temp = TempDir::new()?;
    let root = temp.path().join("nested").join("videos");

    let store = DirectoryMediaStore::new(&root)?;

    assert!(root.is_dir(), "Root directory should be created");
    assert_eq!(store.root(), root.as_path());
    assert!(store.list()?.is_empty(), "New store should have no recordings");

    Ok(())
}

#[test]
fn test_directory_store_allocates_file_uri() -> Result<()> {
    let temp = TempDir::new()?;
    let store = DirectoryMediaStore::new(temp.path())?;

    let recording = saved(&store, 1_700_000_000_000, 1)?;

    let expected = temp.path().join("CameraX-recording-1700000000000.mp4");
    assert_eq!(recording.output_uri, format!("file://{}", expected.display()));
    assert!(expected.is_file(), "Allocated output should exist on disk");

    // Allocation alone does not catalogue anything
    assert!(store.list()?.is_empty());

    Ok(())
}

#[test]
fn test_directory_store_catalogue() -> Result<()> {
    let temp = TempDir::new()?;
    let store = DirectoryMediaStore::new(temp.path())?;

    let first = saved(&store, 1_700_000_000_000, 21)?;
    let second = saved(&store, 1_700_000_100_000, 7)?;
    store.persist(&first)?;
    store.persist(&second)?;

    assert!(temp.path().join(CATALOGUE_FILE).exists());

    let listed = store.list()?;
    assert_eq!(listed, vec![first.clone(), second]);

    // A second store over the same directory sees the same catalogue
    let reopened = DirectoryMediaStore::new(temp.path())?;
    assert_eq!(reopened.list()?[0], first);

    Ok(())
}

#[test]
fn test_memory_store() -> Result<()> {
    let store = MemoryMediaStore::new();

    let recording = saved(&store, 1_700_000_000_000, 3)?;
    assert_eq!(
        recording.output_uri,
        "memory://videos/CameraX-recording-1700000000000.mp4"
    );

    store.persist(&recording)?;
    assert_eq!(store.list()?, vec![recording]);

    Ok(())
}
