//! FTP adapter.
//!
//! FTP name listings carry no type information, so every entry is probed
//! with a directory change to tell directories from files. Size and
//! modification time come from `SIZE` / `MDTM` and degrade to unknown when
//! the server refuses them. Downloads are spooled to a temporary file
//! because the control connection is busy until the transfer completes.

use std::io::Write;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::errors::AdapterError;
use crate::files::browser::{spool, stream_file};
use crate::files::path::{base_name, join, location_prefix};
use crate::files::{DirectoryEntry, Download, FileEntry, Listing, ListingBuilder, StorageAdapter};

use super::SharedClient;

/// Blocking call contract of an FTP connection.
///
/// Paths passed in are absolute server paths.
pub trait FtpClient: Send {
    /// Names (or paths) returned by `NLST` for `dir`.
    fn list_names(&mut self, dir: &str) -> Result<Vec<String>, AdapterError>;

    /// Whether `path` can be entered as a directory. The working directory
    /// is restored afterwards.
    fn is_directory(&mut self, path: &str) -> bool;

    fn size(&mut self, path: &str) -> Option<u64>;

    fn modified(&mut self, path: &str) -> Option<DateTime<Utc>>;

    /// Copy the file at `path` into `out`, returning the byte count.
    fn retrieve(&mut self, path: &str, out: &mut dyn Write) -> Result<u64, AdapterError>;
}

/// Browses an FTP server below a root directory.
pub struct FtpAdapter {
    client: SharedClient<dyn FtpClient>,
    root_dir: String,
}

impl FtpAdapter {
    pub fn new(client: Box<dyn FtpClient>, root_dir: impl Into<String>) -> Self {
        Self {
            client: SharedClient::new(client, "FTP"),
            root_dir: root_dir.into(),
        }
    }

    /// Connect and log in with `config`, failing with
    /// [`AdapterError::Connection`] on a bad host or credentials.
    #[cfg(feature = "ftp")]
    pub async fn connect(config: &crate::config::FtpConfig) -> Result<Self, AdapterError> {
        let config = config.clone();
        let root_dir = config.root_dir.clone();
        let client =
            crate::files::browser::run_blocking(move || suppaftp_client::connect(&config)).await?;
        Ok(Self::new(Box::new(client), root_dir))
    }

    fn absolute(&self, location: &str) -> String {
        join(&self.root_dir, location)
    }
}

fn list_sync(
    client: &mut dyn FtpClient,
    dir: &str,
    parent: &str,
) -> Result<Listing, AdapterError> {
    let names = client.list_names(dir)?;
    let mut builder = ListingBuilder::new();
    for raw in names {
        let name = base_name(&raw).to_string();
        if name.is_empty() || name == "." || name == ".." {
            continue;
        }
        let child = join(dir, &name);
        let modified = client.modified(&child);
        if modified.is_none() {
            debug!(path = %child, "MDTM unavailable");
        }

        if client.is_directory(&child) {
            builder.add_directory(DirectoryEntry::new(name, parent, modified));
        } else {
            let size = client.size(&child).unwrap_or_else(|| {
                debug!(path = %child, "SIZE unavailable");
                0
            });
            builder.add_file(FileEntry::new(parent, name, size, modified));
        }
    }
    Ok(builder.sort_by_name().build())
}

#[async_trait::async_trait]
impl StorageAdapter for FtpAdapter {
    async fn exists(&self, location: &str) -> Result<bool, AdapterError> {
        let path = self.absolute(location);
        self.client
            .call(move |ftp| Ok(ftp.is_directory(&path) || ftp.size(&path).is_some()))
            .await
    }

    async fn listing(&self, location: &str) -> Result<Listing, AdapterError> {
        let dir = self.absolute(location);
        let parent = location_prefix(location);
        let result = self
            .client
            .call(move |ftp| list_sync(ftp, &dir, &parent))
            .await;
        match &result {
            Ok(listing) => debug!(location, entries = listing.len(), "Listed FTP directory"),
            Err(e) => warn!(location, error = %e, "FTP listing failed"),
        }
        result
    }

    async fn download(&self, path: &str) -> Result<Download, AdapterError> {
        let remote = self.absolute(path);
        let name = base_name(path).to_string();
        let missing = path.to_string();
        let (file, size) = self
            .client
            .call(move |ftp| {
                if ftp.is_directory(&remote) {
                    return Err(AdapterError::NotFound(missing));
                }
                spool(|out| ftp.retrieve(&remote, out))
            })
            .await?;
        debug!(path, size, "Spooled FTP download");
        Ok(Download::new(name, size, stream_file(file)))
    }
}

#[cfg(feature = "ftp")]
mod suppaftp_client {
    use std::io::Write;

    use chrono::{DateTime, Utc};
    use suppaftp::types::FileType;
    use suppaftp::{FtpError, FtpStream, Mode, Status};
    use tracing::{debug, info};

    use super::FtpClient;
    use crate::config::FtpConfig;
    use crate::errors::AdapterError;

    pub(super) struct SuppaFtpClient {
        stream: FtpStream,
    }

    pub(super) fn connect(config: &FtpConfig) -> Result<SuppaFtpClient, AdapterError> {
        let addr = format!("{}:{}", config.host, config.port);
        let mut stream = FtpStream::connect(&addr)
            .map_err(|e| AdapterError::Connection(format!("Could not connect to {addr}: {e}")))?;
        stream
            .login(&config.username, &config.password)
            .map_err(|e| AdapterError::Connection(format!("FTP login failed: {e}")))?;
        stream.set_mode(if config.passive {
            Mode::Passive
        } else {
            Mode::Active
        });
        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| AdapterError::Connection(format!("Binary mode refused: {e}")))?;
        info!(host = %config.host, port = config.port, "FTP connected");
        Ok(SuppaFtpClient { stream })
    }

    fn is_missing(err: &FtpError) -> bool {
        matches!(err, FtpError::UnexpectedResponse(resp) if resp.status == Status::FileUnavailable)
    }

    impl FtpClient for SuppaFtpClient {
        fn list_names(&mut self, dir: &str) -> Result<Vec<String>, AdapterError> {
            self.stream
                .nlst(Some(dir))
                .map_err(|e| AdapterError::ListingUnavailable(format!("NLST {dir} failed: {e}")))
        }

        fn is_directory(&mut self, path: &str) -> bool {
            let Ok(original) = self.stream.pwd() else {
                return false;
            };
            if self.stream.cwd(path).is_err() {
                return false;
            }
            if let Err(e) = self.stream.cwd(&original) {
                debug!(path, original = %original, error = %e, "Could not restore working directory");
            }
            true
        }

        fn size(&mut self, path: &str) -> Option<u64> {
            self.stream.size(path).ok().map(|s| s as u64)
        }

        fn modified(&mut self, path: &str) -> Option<DateTime<Utc>> {
            self.stream.mdtm(path).ok().map(|dt| dt.and_utc())
        }

        fn retrieve(&mut self, path: &str, out: &mut dyn Write) -> Result<u64, AdapterError> {
            let mut data = self.stream.retr_as_stream(path).map_err(|e| {
                if is_missing(&e) {
                    AdapterError::NotFound(path.to_string())
                } else {
                    AdapterError::BackendUnavailable(format!("RETR {path} failed: {e}"))
                }
            })?;
            let copied = std::io::copy(&mut data, out)?;
            self.stream
                .finalize_retr_stream(data)
                .map_err(|e| AdapterError::BackendUnavailable(format!("RETR {path} failed: {e}")))?;
            Ok(copied)
        }
    }

    impl Drop for SuppaFtpClient {
        fn drop(&mut self) {
            let _ = self.stream.quit();
        }
    }
}
