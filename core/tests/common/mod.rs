//! Shared fixtures for storage navigator integration tests.
//!
//! Builds directory trees and archives in temporary directories, and a
//! renderer that records what it was asked to render.

// Each integration test is compiled as its own crate, so not every test file
// uses every function from this shared module. Suppress dead_code warnings.
#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use storage_navigator_core::navigation::{ActionSource, FormActionSource};
use storage_navigator_core::{NavigatorError, RenderData, Renderer};
use tempfile::TempDir;

/// Write `files` (relative path, content) below `root`, creating parents.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let path = root.join(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent directories");
        }
        std::fs::write(&path, content).expect("write fixture file");
    }
}

/// A temporary directory holding `files`.
pub fn temp_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    write_tree(dir.path(), files);
    dir
}

/// Create `name` in `dir` as a ZIP archive of `files`.
///
/// Names ending in `/` become explicit directory records.
pub fn zip_archive(dir: &Path, name: &str, files: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let mut zip = zip::ZipWriter::new(File::create(&path).expect("create zip"));
    let options = zip::write::FileOptions::default();
    for (entry, content) in files {
        if entry.ends_with('/') {
            zip.add_directory(*entry, options).expect("add zip directory");
        } else {
            zip.start_file(*entry, options).expect("start zip entry");
            zip.write_all(content.as_bytes()).expect("write zip entry");
        }
    }
    zip.finish().expect("finish zip");
    path
}

fn append_tar<W: Write>(builder: &mut tar::Builder<W>, files: &[(&str, &str)], mtime: u64) {
    for (entry, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        header.set_cksum();
        builder
            .append_data(&mut header, entry, content.as_bytes())
            .expect("append tar entry");
    }
}

/// Create `name` in `dir` as a plain TAR archive of `files`.
pub fn tar_archive(dir: &Path, name: &str, files: &[(&str, &str)], mtime: u64) -> PathBuf {
    let path = dir.join(name);
    let mut builder = tar::Builder::new(File::create(&path).expect("create tar"));
    append_tar(&mut builder, files, mtime);
    builder.finish().expect("finish tar");
    path
}

/// Create `name` in `dir` as a gzip-compressed TAR archive of `files`.
pub fn tar_gz_archive(dir: &Path, name: &str, files: &[(&str, &str)], mtime: u64) -> PathBuf {
    let path = dir.join(name);
    let encoder = flate2::write::GzEncoder::new(
        File::create(&path).expect("create tar.gz"),
        flate2::Compression::default(),
    );
    let mut builder = tar::Builder::new(encoder);
    append_tar(&mut builder, files, mtime);
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip");
    path
}

/// One call to [`RecordingRenderer::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub current_path: String,
    pub root_path: String,
    pub names: Vec<String>,
}

/// Renderer that records every listing it receives and classifies requests
/// as form submissions.
#[derive(Default)]
pub struct RecordingRenderer {
    source: FormActionSource,
    calls: Arc<Mutex<Vec<Rendered>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the recorded calls, usable after the renderer is boxed.
    pub fn calls(&self) -> Arc<Mutex<Vec<Rendered>>> {
        self.calls.clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, data: &RenderData<'_>) -> Result<(), NavigatorError> {
        let rendered = Rendered {
            current_path: data.current_path.to_string(),
            root_path: data.root_path.to_string(),
            names: data.listing.iter().map(|e| e.name().to_string()).collect(),
        };
        self.calls
            .lock()
            .map_err(|e| NavigatorError::Render(e.to_string()))?
            .push(rendered);
        Ok(())
    }

    fn action_source(&self) -> &dyn ActionSource {
        &self.source
    }
}
