//! End-to-end navigator tests: adapter, form action source and renderer
//! wired together the way a front end does it.

mod common;

use common::{temp_tree, zip_archive, RecordingRenderer};
use storage_navigator_core::backends::{ArchiveAdapter, LocalAdapter, NullAdapter};
use storage_navigator_core::files::FilterBuilder;
use storage_navigator_core::{
    BrowserConfig, NavigatorError, NavigatorResponse, RequestContext, StorageNavigator,
};

// ── Construction ────────────────────────────────────────────────────

#[tokio::test]
async fn missing_root_is_invalid() {
    let dir = temp_tree(&[("file1.txt", "test")]);
    let renderer = RecordingRenderer::new();
    let calls = renderer.calls();

    let err = StorageNavigator::new(
        Box::new(LocalAdapter::new(dir.path()).unwrap()),
        Box::new(renderer),
        "missing",
        BrowserConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, NavigatorError::InvalidRoot(_)));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_configuration_fails_fast() {
    let err = BrowserConfig::from_json(r#"{"ignore_filenames": ["a/b"]}"#).unwrap_err();
    assert!(matches!(
        err,
        NavigatorError::InvalidConfiguration { ref key, .. } if key == "ignore_filenames"
    ));
}

// ── Dispatch ────────────────────────────────────────────────────────

#[tokio::test]
async fn browse_local_tree_through_form_requests() {
    let dir = temp_tree(&[
        ("file1.txt", "test"),
        ("dir1/nested.txt", "nested"),
        ("dir1/.DS_Store", ""),
        ("dir1/debug.LOG", "log"),
    ]);
    let config = BrowserConfig::from_value(&serde_json::json!({
        "date_format": "%d.%m.%Y",
        "ignore_filenames": [".DS_Store"],
        "ignore_extensions": ["log"],
    }))
    .expect("valid configuration");

    let renderer = RecordingRenderer::new();
    let calls = renderer.calls();
    let navigator = StorageNavigator::new(
        Box::new(LocalAdapter::new(dir.path()).unwrap()),
        Box::new(renderer),
        "",
        config,
    )
    .await
    .expect("root exists");

    navigator.handle(&RequestContext::get()).await.unwrap();
    navigator
        .handle(&RequestContext::post([
            ("action", "changePath"),
            ("path", "dir1"),
        ]))
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].names, ["dir1", "file1.txt"]);
    assert_eq!(calls[1].current_path, "dir1");
    assert_eq!(calls[1].root_path, "");
    assert_eq!(calls[1].names, ["nested.txt"]);
}

#[tokio::test]
async fn download_through_form_request() {
    let dir = temp_tree(&[("file1.txt", "test")]);
    let navigator = StorageNavigator::new(
        Box::new(LocalAdapter::new(dir.path()).unwrap()),
        Box::new(RecordingRenderer::new()),
        "/",
        BrowserConfig::default(),
    )
    .await
    .unwrap();

    let response = navigator
        .handle(&RequestContext::post([
            ("action", "downloadFile"),
            ("file", "file1.txt"),
        ]))
        .await
        .unwrap();
    let NavigatorResponse::Download(download) = response else {
        panic!("expected a download");
    };
    assert_eq!(download.size, 4);
    assert_eq!(download.into_bytes().await.unwrap(), b"test");

    let missing = navigator
        .handle(&RequestContext::post([
            ("action", "downloadFile"),
            ("file", "file2.txt"),
        ]))
        .await;
    assert!(matches!(missing, Err(NavigatorError::NotFound(_))));
}

#[tokio::test]
async fn archive_root_confines_navigation() {
    let dir = temp_tree(&[]);
    let path = zip_archive(
        dir.path(),
        "site.zip",
        &[("public/index.html", "<html>"), ("private/key.pem", "secret")],
    );
    let renderer = RecordingRenderer::new();
    let calls = renderer.calls();
    let navigator = StorageNavigator::new(
        Box::new(ArchiveAdapter::open(&path).await.unwrap()),
        Box::new(renderer),
        "public",
        BrowserConfig::default(),
    )
    .await
    .unwrap();

    navigator.handle(&RequestContext::get()).await.unwrap();
    for (action, field, target) in [
        ("changePath", "path", "private"),
        ("changePath", "path", "public/../private"),
        ("downloadFile", "file", "private/key.pem"),
    ] {
        let result = navigator
            .handle(&RequestContext::post([("action", action), (field, target)]))
            .await;
        assert!(
            matches!(result, Err(NavigatorError::PathOutsideRoot { .. })),
            "{action} {target} should be rejected"
        );
    }

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].names, ["index.html"]);
}

#[tokio::test]
async fn extra_filters_apply_to_every_listing() {
    let navigator = StorageNavigator::new(
        Box::new(NullAdapter::new()),
        Box::new(RecordingRenderer::new()),
        "/",
        BrowserConfig::default(),
    )
    .await
    .unwrap()
    .with_filters(FilterBuilder::new().is_directory().build());

    let listing = navigator.listing("/").await.unwrap();
    assert!(listing.is_empty());
}

#[tokio::test]
async fn archive_locations_with_dot_and_doubled_separators() {
    let dir = temp_tree(&[]);
    let path = zip_archive(
        dir.path(),
        "site.zip",
        &[("public/index.html", "<html>"), ("public/docs/img/logo.png", "png")],
    );
    let renderer = RecordingRenderer::new();
    let calls = renderer.calls();
    let navigator = StorageNavigator::new(
        Box::new(ArchiveAdapter::open(&path).await.unwrap()),
        Box::new(renderer),
        "./public/",
        BrowserConfig::default(),
    )
    .await
    .unwrap();

    for target in ["public/./", "public//docs//img"] {
        navigator
            .handle(&RequestContext::post([("action", "changePath"), ("path", target)]))
            .await
            .unwrap();
    }
    let response = navigator
        .handle(&RequestContext::post([
            ("action", "downloadFile"),
            ("file", "./public//index.html"),
        ]))
        .await
        .unwrap();
    let NavigatorResponse::Download(download) = response else {
        panic!("expected a download");
    };
    assert_eq!(download.into_bytes().await.unwrap(), b"<html>");

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].names, ["docs", "index.html"]);
    assert_eq!(calls[1].names, ["logo.png"]);
}
