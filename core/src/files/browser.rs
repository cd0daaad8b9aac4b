//! The storage adapter contract shared by every backend.
//!
//! Adapters take backend-relative locations (`""` or `/` is the backend's
//! root) and answer existence queries, one-level listings and downloads.
//! Blocking backends offload their calls with [`run_blocking`].

use std::fmt;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{stream, Stream, StreamExt, TryStreamExt};
use tokio_util::io::ReaderStream;

use crate::errors::AdapterError;
use crate::files::Listing;

/// A download body, read chunk by chunk.
pub type DownloadStream = Pin<Box<dyn Stream<Item = Result<Bytes, AdapterError>> + Send>>;

/// A file transfer: metadata plus the byte stream.
pub struct Download {
    /// Base name of the downloaded file.
    pub name: String,
    pub size: u64,
    pub mime_type: Option<String>,
    pub stream: DownloadStream,
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

impl Download {
    /// Build a download, guessing the MIME type from `name`.
    pub fn new(name: impl Into<String>, size: u64, stream: DownloadStream) -> Self {
        let name = name.into();
        let mime_type = super::utils::mime_type_for(&name);
        Self {
            name,
            size,
            mime_type,
            stream,
        }
    }

    /// A download served from memory.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let size = data.len() as u64;
        Self::new(name, size, Box::pin(stream::once(async move { Ok(data) })))
    }

    /// Override the guessed MIME type with one reported by the backend.
    pub fn with_mime_type(mut self, mime_type: Option<String>) -> Self {
        if mime_type.is_some() {
            self.mime_type = mime_type;
        }
        self
    }

    /// Drain the stream into memory.
    pub async fn into_bytes(self) -> Result<Vec<u8>, AdapterError> {
        let capacity = (self.size as usize).min(1 << 20);
        self.stream
            .try_fold(Vec::with_capacity(capacity), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
    }
}

/// Uniform access to one storage backend.
#[async_trait::async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Whether a file or directory exists at `location`.
    async fn exists(&self, location: &str) -> Result<bool, AdapterError>;

    /// Direct children of `location`, never recursive.
    ///
    /// Fails with [`AdapterError::ListingUnavailable`] when the backend
    /// cannot list the location.
    async fn listing(&self, location: &str) -> Result<Listing, AdapterError>;

    /// Open `path` for download.
    ///
    /// Fails with [`AdapterError::NotFound`] when the file is absent.
    async fn download(&self, path: &str) -> Result<Download, AdapterError>;
}

/// Run a blocking backend call on the blocking thread pool.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, AdapterError>
where
    F: FnOnce() -> Result<T, AdapterError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AdapterError::BackendUnavailable(format!("Task join failed: {e}")))?
}

/// Spool data into an anonymous temporary file and rewind it.
///
/// `fill` returns the number of bytes written. The file has no name on
/// disk, so it disappears once the last handle is dropped, whether the
/// transfer finishes or fails.
pub(crate) fn spool<F>(fill: F) -> Result<(File, u64), AdapterError>
where
    F: FnOnce(&mut File) -> Result<u64, AdapterError>,
{
    let mut file = tempfile::tempfile()?;
    let size = fill(&mut file)?;
    file.seek(SeekFrom::Start(0))?;
    Ok((file, size))
}

/// Stream an open file chunk by chunk.
pub(crate) fn stream_file(file: File) -> DownloadStream {
    let file = tokio::fs::File::from_std(file);
    Box::pin(ReaderStream::new(file).map(|chunk| chunk.map_err(AdapterError::from)))
}
