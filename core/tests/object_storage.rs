//! Object storage adapter integration tests against an in-memory store.

use std::sync::Arc;

use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload};
use storage_navigator_core::backends::ObjectStorageAdapter;
use storage_navigator_core::{AdapterError, StorageAdapter};

async fn bucket(keys: &[&str]) -> Arc<dyn ObjectStore> {
    let store = InMemory::new();
    for key in keys {
        store
            .put(&Path::from(*key), PutPayload::from(key.as_bytes().to_vec()))
            .await
            .expect("put object");
    }
    Arc::new(store)
}

#[tokio::test]
async fn prefix_listing_shows_one_level() {
    let adapter = ObjectStorageAdapter::new(bucket(&["docs/readme.md", "docs/img/logo.png"]).await);

    let listing = adapter.listing("docs/").await.unwrap();
    let directories: Vec<_> = listing.directories().map(|d| d.name.as_str()).collect();
    let files: Vec<_> = listing.files().map(|f| f.name.as_str()).collect();
    assert_eq!(directories, ["img"]);
    assert_eq!(files, ["readme.md"]);
}

#[tokio::test]
async fn root_listing_and_existence() {
    let adapter = ObjectStorageAdapter::new(bucket(&["a/b.txt", "a/c/d.txt", "e.txt"]).await);

    let listing = adapter.listing("").await.unwrap();
    let names: Vec<_> = listing.iter().map(|e| e.name()).collect();
    assert_eq!(names, ["a", "e.txt"]);

    assert!(adapter.exists("a/c").await.unwrap());
    assert!(adapter.exists("a/c/d.txt").await.unwrap());
    assert!(!adapter.exists("a/d").await.unwrap());
}

#[tokio::test]
async fn download_missing_key() {
    let adapter = ObjectStorageAdapter::new(bucket(&["e.txt"]).await);
    assert!(matches!(
        adapter.download("f.txt").await,
        Err(AdapterError::NotFound(_))
    ));
    let download = adapter.download("e.txt").await.unwrap();
    assert_eq!(download.into_bytes().await.unwrap(), b"e.txt");
}
