//! Adapter over a generic virtual filesystem.
//!
//! Any hierarchical filesystem abstraction can be browsed by implementing
//! [`VirtualFilesystem`]; [`MemoryFilesystem`] is the in-process one used
//! for dry runs and tests.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::stream;
use tracing::{debug, warn};

use crate::errors::AdapterError;
use crate::files::path::{base_name, location_prefix, segments};
use crate::files::{
    DirectoryEntry, Download, DownloadStream, FileEntry, Listing, ListingBuilder, StorageAdapter,
};

/// Metadata returned by [`VirtualFilesystem::stat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsMetadata {
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Directory entry returned by [`VirtualFilesystem::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsDirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// A hierarchical filesystem addressed by `/`-separated relative paths.
#[async_trait::async_trait]
pub trait VirtualFilesystem: Send + Sync {
    /// Check if a path exists.
    async fn exists(&self, path: &str) -> Result<bool, AdapterError>;

    /// Direct children of a directory.
    async fn read_dir(&self, path: &str) -> Result<Vec<VfsDirEntry>, AdapterError>;

    /// Metadata for a path.
    async fn stat(&self, path: &str) -> Result<VfsMetadata, AdapterError>;

    /// Open a file for streaming.
    async fn open(&self, path: &str) -> Result<DownloadStream, AdapterError>;
}

/// Browses a [`VirtualFilesystem`].
#[derive(Debug)]
pub struct VfsAdapter<V> {
    vfs: V,
}

impl<V: VirtualFilesystem> VfsAdapter<V> {
    pub fn new(vfs: V) -> Self {
        Self { vfs }
    }

    pub fn inner(&self) -> &V {
        &self.vfs
    }
}

#[async_trait::async_trait]
impl<V: VirtualFilesystem> StorageAdapter for VfsAdapter<V> {
    async fn exists(&self, location: &str) -> Result<bool, AdapterError> {
        self.vfs.exists(location).await
    }

    async fn listing(&self, location: &str) -> Result<Listing, AdapterError> {
        let entries = self.vfs.read_dir(location).await.map_err(|e| {
            warn!(location, error = %e, "VFS listing failed");
            match e {
                AdapterError::ListingUnavailable(_) => e,
                other => AdapterError::ListingUnavailable(other.to_string()),
            }
        })?;

        let parent = location_prefix(location);
        let mut builder = ListingBuilder::new();
        for entry in entries {
            if entry.name == "." || entry.name == ".." {
                continue;
            }
            let child = format!("{parent}{}", entry.name);
            let metadata = match self.vfs.stat(&child).await {
                Ok(m) => Some(m),
                Err(e) => {
                    debug!(path = %child, error = %e, "stat failed");
                    None
                }
            };
            let modified = metadata.as_ref().and_then(|m| m.modified);
            if entry.is_dir {
                builder.add_directory(DirectoryEntry::new(entry.name, parent.as_str(), modified));
            } else {
                let size = metadata.map(|m| m.size).unwrap_or(0);
                builder.add_file(FileEntry::new(parent.as_str(), entry.name, size, modified));
            }
        }
        Ok(builder.sort_by_name().build())
    }

    async fn download(&self, path: &str) -> Result<Download, AdapterError> {
        let metadata = match self.vfs.stat(path).await {
            Ok(m) if !m.is_dir => m,
            _ => return Err(AdapterError::NotFound(path.to_string())),
        };
        let stream = self.vfs.open(path).await?;
        Ok(Download::new(base_name(path), metadata.size, stream))
    }
}

#[derive(Debug, Clone)]
enum Node {
    Dir(Option<DateTime<Utc>>),
    File(Bytes, Option<DateTime<Utc>>),
}

static ROOT: Node = Node::Dir(None);

/// An in-memory [`VirtualFilesystem`].
///
/// Paths are normalized on insertion and parent directories are created
/// implicitly. The root always exists.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    nodes: BTreeMap<String, Node>,
}

fn normalize(path: &str) -> Result<String, AdapterError> {
    segments(path)
        .map(|s| s.join("/"))
        .ok_or_else(|| AdapterError::NotFound(path.to_string()))
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_parents(&mut self, path: &str) {
        let mut current = String::new();
        let parts: Vec<&str> = path.split('/').collect();
        for part in &parts[..parts.len().saturating_sub(1)] {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(part);
            self.nodes.entry(current.clone()).or_insert(Node::Dir(None));
        }
    }

    /// Add a directory (and its parents).
    pub fn with_dir(mut self, path: &str) -> Self {
        if let Ok(path) = normalize(path) {
            if !path.is_empty() {
                self.add_parents(&path);
                self.nodes.insert(path, Node::Dir(None));
            }
        }
        self
    }

    /// Add a file (and its parent directories).
    pub fn with_file(
        mut self,
        path: &str,
        content: impl Into<Bytes>,
        modified: Option<DateTime<Utc>>,
    ) -> Self {
        if let Ok(path) = normalize(path) {
            if !path.is_empty() {
                self.add_parents(&path);
                self.nodes.insert(path, Node::File(content.into(), modified));
            }
        }
        self
    }

    fn node(&self, path: &str) -> Result<Option<&Node>, AdapterError> {
        let path = normalize(path)?;
        if path.is_empty() {
            return Ok(Some(&ROOT));
        }
        Ok(self.nodes.get(&path))
    }
}

#[async_trait::async_trait]
impl VirtualFilesystem for MemoryFilesystem {
    async fn exists(&self, path: &str) -> Result<bool, AdapterError> {
        Ok(matches!(self.node(path), Ok(Some(_))))
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<VfsDirEntry>, AdapterError> {
        let dir = normalize(path).map_err(|e| AdapterError::ListingUnavailable(e.to_string()))?;
        if !dir.is_empty() && !matches!(self.nodes.get(&dir), Some(Node::Dir(_))) {
            return Err(AdapterError::ListingUnavailable(format!(
                "{path} is not a directory"
            )));
        }
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };
        Ok(self
            .nodes
            .iter()
            .filter_map(|(key, node)| {
                let rest = key.strip_prefix(&prefix)?;
                (!rest.is_empty() && !rest.contains('/')).then(|| VfsDirEntry {
                    name: rest.to_string(),
                    is_dir: matches!(node, Node::Dir(_)),
                })
            })
            .collect())
    }

    async fn stat(&self, path: &str) -> Result<VfsMetadata, AdapterError> {
        match self.node(path)? {
            Some(Node::Dir(modified)) => Ok(VfsMetadata {
                is_dir: true,
                size: 0,
                modified: *modified,
            }),
            Some(Node::File(data, modified)) => Ok(VfsMetadata {
                is_dir: false,
                size: data.len() as u64,
                modified: *modified,
            }),
            None => Err(AdapterError::NotFound(path.to_string())),
        }
    }

    async fn open(&self, path: &str) -> Result<DownloadStream, AdapterError> {
        match self.node(path)? {
            Some(Node::File(data, _)) => {
                let data = data.clone();
                Ok(Box::pin(stream::once(async move { Ok(data) })))
            }
            _ => Err(AdapterError::NotFound(path.to_string())),
        }
    }
}
