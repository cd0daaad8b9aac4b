//! Concrete [`StorageAdapter`](crate::files::StorageAdapter) implementations.
//!
//! Network clients (FTP, SFTP, S3) depend on optional libraries and are
//! gated behind cargo features; the adapters themselves are always built
//! and can be driven by any client implementing their call contract.

pub mod archive;
pub mod ftp;
pub mod local;
pub mod null;
pub mod object_storage;
pub mod sftp;
pub mod vfs;

use std::sync::{Arc, Mutex};

use crate::errors::AdapterError;
use crate::files::browser::run_blocking;

pub use archive::{ArchiveAdapter, ArchiveFormat};
pub use ftp::{FtpAdapter, FtpClient};
pub use local::LocalAdapter;
pub use null::NullAdapter;
pub use object_storage::ObjectStorageAdapter;
pub use sftp::{RemoteStat, SftpAdapter, SftpClient};
pub use vfs::{MemoryFilesystem, VfsAdapter, VirtualFilesystem};

/// A blocking, connection-holding client shared by one adapter.
///
/// Calls run on the blocking pool one at a time; the connection closes when
/// the last handle is dropped.
pub(crate) struct SharedClient<C: ?Sized> {
    inner: Arc<Mutex<Box<C>>>,
    label: &'static str,
}

impl<C: ?Sized + Send + 'static> SharedClient<C> {
    pub(crate) fn new(client: Box<C>, label: &'static str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
            label,
        }
    }

    pub(crate) async fn call<T, F>(&self, f: F) -> Result<T, AdapterError>
    where
        F: FnOnce(&mut C) -> Result<T, AdapterError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        let label = self.label;
        run_blocking(move || {
            let mut guard = inner.lock().map_err(|e| {
                AdapterError::BackendUnavailable(format!("Failed to lock {label} client: {e}"))
            })?;
            f(&mut **guard)
        })
        .await
    }
}
