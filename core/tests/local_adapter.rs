//! Local filesystem adapter integration tests.
//!
//! Runs against temporary directory trees; no external services needed.

mod common;

use common::temp_tree;
use storage_navigator_core::backends::LocalAdapter;
use storage_navigator_core::{AdapterError, StorageAdapter};

// ── Listing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn listing_separates_files_and_directories() {
    let dir = temp_tree(&[("file1.txt", "test"), ("dir1/inner.txt", "x")]);
    let adapter = LocalAdapter::new(dir.path()).expect("base directory exists");

    let listing = adapter.listing("").await.expect("root listing");
    let directories: Vec<_> = listing.directories().collect();
    let files: Vec<_> = listing.files().collect();

    assert_eq!(directories.len(), 1);
    assert_eq!(directories[0].name, "dir1");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "file1.txt");
    assert_eq!(files[0].byte_size, 4);
    assert_eq!(files[0].extension, "txt");
    assert!(files[0].last_modified.is_some());
}

#[tokio::test]
async fn listing_is_one_level_deep() {
    let dir = temp_tree(&[("a/b/c/deep.txt", "deep"), ("a/top.txt", "top")]);
    let adapter = LocalAdapter::new(dir.path()).unwrap();

    let listing = adapter.listing("/a/").await.unwrap();
    let names: Vec<_> = listing.iter().map(|e| e.name()).collect();
    assert_eq!(names, ["b", "top.txt"]);
    assert_eq!(listing.files().next().unwrap().directory_path, "a/");
}

#[tokio::test]
async fn listing_missing_directory_is_unavailable() {
    let dir = temp_tree(&[]);
    let adapter = LocalAdapter::new(dir.path()).unwrap();
    assert!(matches!(
        adapter.listing("nope").await,
        Err(AdapterError::ListingUnavailable(_))
    ));
}

#[tokio::test]
async fn parent_segments_never_resolve() {
    let dir = temp_tree(&[("inner/file.txt", "x")]);
    let adapter = LocalAdapter::new(dir.path().join("inner")).unwrap();
    assert!(!adapter.exists("../inner/file.txt").await.unwrap());
    assert!(adapter.listing("..").await.is_err());
    assert!(adapter.download("../inner/file.txt").await.is_err());
}

// ── Download ────────────────────────────────────────────────────────

#[tokio::test]
async fn download_streams_file_content() {
    let dir = temp_tree(&[("docs/readme.md", "# Readme\n")]);
    let adapter = LocalAdapter::new(dir.path()).unwrap();

    let download = adapter.download("docs/readme.md").await.expect("download");
    assert_eq!(download.name, "readme.md");
    assert_eq!(download.size, 9);
    assert_eq!(download.mime_type.as_deref(), Some("text/markdown"));
    assert_eq!(download.into_bytes().await.unwrap(), b"# Readme\n");
}

#[tokio::test]
async fn construction_requires_directory() {
    let dir = temp_tree(&[("file.txt", "x")]);
    assert!(matches!(
        LocalAdapter::new(dir.path().join("file.txt")),
        Err(AdapterError::Connection(_))
    ));
    assert!(matches!(
        LocalAdapter::new(dir.path().join("missing")),
        Err(AdapterError::Connection(_))
    ));
}
