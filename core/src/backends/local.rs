//! Local filesystem adapter.
//!
//! Locations are resolved beneath a fixed base directory. Metadata calls
//! run on the blocking pool; downloads stream straight from the file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::AdapterError;
use crate::files::browser::{run_blocking, stream_file};
use crate::files::path::{location_prefix, segments};
use crate::files::utils::datetime_from_system_time;
use crate::files::{DirectoryEntry, Download, FileEntry, Listing, ListingBuilder, StorageAdapter};

/// Browses a directory tree on the local disk.
#[derive(Debug, Clone)]
pub struct LocalAdapter {
    base: PathBuf,
}

impl LocalAdapter {
    /// Create an adapter rooted at `base`, which must be an existing directory.
    pub fn new(base: impl Into<PathBuf>) -> Result<Self, AdapterError> {
        let base = base.into();
        if !base.is_dir() {
            return Err(AdapterError::Connection(format!(
                "{} is not a directory",
                base.display()
            )));
        }
        debug!(base = %base.display(), "Opened local adapter");
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Map a location onto the disk, refusing anything that climbs out of
    /// the base directory.
    fn resolve(&self, location: &str) -> Option<PathBuf> {
        let parts = segments(location)?;
        let mut path = self.base.clone();
        path.extend(parts);
        Some(path)
    }
}

fn list_dir_sync(dir: &Path, parent: &str) -> Result<Listing, AdapterError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        AdapterError::ListingUnavailable(format!("read_dir {} failed: {e}", dir.display()))
    })?;

    let mut builder = ListingBuilder::new();
    for entry in entries {
        let entry = entry.map_err(|e| AdapterError::ListingUnavailable(e.to_string()))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name == "." || name == ".." {
            continue;
        }

        // Follow symlinks, falling back to the link itself if the target is gone.
        let metadata = fs::metadata(entry.path()).or_else(|_| entry.metadata());
        let metadata = match metadata {
            Ok(m) => m,
            Err(e) => {
                debug!(name = %name, error = %e, "No metadata, listing as file");
                builder.add_file(FileEntry::new(parent, name, 0, None));
                continue;
            }
        };
        let modified = metadata.modified().ok().and_then(datetime_from_system_time);

        if metadata.is_dir() {
            builder.add_directory(DirectoryEntry::new(name, parent, modified));
        } else {
            builder.add_file(FileEntry::new(parent, name, metadata.len(), modified));
        }
    }
    Ok(builder.sort_by_name().build())
}

#[async_trait::async_trait]
impl StorageAdapter for LocalAdapter {
    async fn exists(&self, location: &str) -> Result<bool, AdapterError> {
        let Some(path) = self.resolve(location) else {
            return Ok(false);
        };
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AdapterError::BackendUnavailable(format!("stat failed: {e}")))
    }

    async fn listing(&self, location: &str) -> Result<Listing, AdapterError> {
        let dir = self.resolve(location).ok_or_else(|| {
            AdapterError::ListingUnavailable(format!("Invalid location: {location}"))
        })?;
        let parent = location_prefix(location);
        let result = run_blocking(move || list_dir_sync(&dir, &parent)).await;
        match &result {
            Ok(listing) => debug!(location, entries = listing.len(), "Listed local directory"),
            Err(e) => warn!(location, error = %e, "Local listing failed"),
        }
        result
    }

    async fn download(&self, path: &str) -> Result<Download, AdapterError> {
        let full = self
            .resolve(path)
            .ok_or_else(|| AdapterError::NotFound(path.to_string()))?;
        let name = crate::files::path::base_name(path).to_string();
        let path = path.to_string();
        let (file, size) = run_blocking(move || {
            let metadata = fs::metadata(&full).map_err(|_| AdapterError::NotFound(path.clone()))?;
            if !metadata.is_file() {
                return Err(AdapterError::NotFound(path));
            }
            let file = fs::File::open(&full)?;
            Ok((file, metadata.len()))
        })
        .await?;
        Ok(Download::new(name, size, stream_file(file)))
    }
}
