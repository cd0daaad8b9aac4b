//! SFTP adapter.
//!
//! Directory reads usually carry attributes; entries without them are
//! probed with a separate `stat`. A failed probe lists the entry as a file
//! of unknown size. Blocking calls run on the blocking pool through the
//! adapter's shared client.

use std::io::Write;

use tracing::{debug, warn};

use crate::errors::AdapterError;
use crate::files::browser::{spool, stream_file};
use crate::files::path::{base_name, join, location_prefix};
use crate::files::utils::datetime_from_epoch;
use crate::files::{DirectoryEntry, Download, FileEntry, Listing, ListingBuilder, StorageAdapter};

use super::SharedClient;

/// Unix file-type bits of `st_mode`.
const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;

/// The subset of SFTP file attributes the adapter uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteStat {
    pub size: Option<u64>,
    /// Seconds since the Unix epoch.
    pub mtime: Option<u64>,
    /// Unix permission and type bits.
    pub mode: Option<u32>,
}

impl RemoteStat {
    pub fn is_dir(&self) -> bool {
        self.mode.is_some_and(|m| m & S_IFMT == S_IFDIR)
    }
}

/// Blocking call contract of an SFTP session.
///
/// Paths passed in are absolute server paths.
pub trait SftpClient: Send {
    /// Entries of `dir` with their attributes when the server sent them.
    fn read_dir(&mut self, dir: &str) -> Result<Vec<(String, Option<RemoteStat>)>, AdapterError>;

    /// Attributes of `path`, or `None` if it cannot be stat'ed.
    fn stat(&mut self, path: &str) -> Option<RemoteStat>;

    /// Copy the file at `path` into `out`, returning the byte count.
    fn retrieve(&mut self, path: &str, out: &mut dyn Write) -> Result<u64, AdapterError>;
}

/// Browses an SFTP server below a root directory.
pub struct SftpAdapter {
    client: SharedClient<dyn SftpClient>,
    root_dir: String,
}

impl SftpAdapter {
    pub fn new(client: Box<dyn SftpClient>, root_dir: impl Into<String>) -> Self {
        Self {
            client: SharedClient::new(client, "SFTP"),
            root_dir: root_dir.into(),
        }
    }

    /// Open an authenticated SFTP session with `config`.
    #[cfg(feature = "sftp")]
    pub async fn connect(config: &crate::config::SftpConfig) -> Result<Self, AdapterError> {
        let config = config.clone();
        let root_dir = config.root_dir.clone();
        let client =
            crate::files::browser::run_blocking(move || ssh2_client::connect(&config)).await?;
        Ok(Self::new(Box::new(client), root_dir))
    }

    fn absolute(&self, location: &str) -> String {
        join(&self.root_dir, location)
    }
}

fn list_sync(
    client: &mut dyn SftpClient,
    dir: &str,
    parent: &str,
) -> Result<Listing, AdapterError> {
    let entries = client.read_dir(dir)?;
    let mut builder = ListingBuilder::new();
    for (raw, stat) in entries {
        let name = base_name(&raw).to_string();
        if name.is_empty() || name == "." || name == ".." {
            continue;
        }
        let stat = stat.or_else(|| client.stat(&join(dir, &name)));
        let Some(stat) = stat else {
            debug!(name = %name, "stat failed, listing as file");
            builder.add_file(FileEntry::new(parent, name, 0, None));
            continue;
        };
        let modified = stat.mtime.and_then(datetime_from_epoch);
        if stat.is_dir() {
            builder.add_directory(DirectoryEntry::new(name, parent, modified));
        } else {
            builder.add_file(FileEntry::new(parent, name, stat.size.unwrap_or(0), modified));
        }
    }
    Ok(builder.sort_by_name().build())
}

#[async_trait::async_trait]
impl StorageAdapter for SftpAdapter {
    async fn exists(&self, location: &str) -> Result<bool, AdapterError> {
        let path = self.absolute(location);
        self.client.call(move |sftp| Ok(sftp.stat(&path).is_some())).await
    }

    async fn listing(&self, location: &str) -> Result<Listing, AdapterError> {
        let dir = self.absolute(location);
        let parent = location_prefix(location);
        let result = self
            .client
            .call(move |sftp| list_sync(sftp, &dir, &parent))
            .await;
        match &result {
            Ok(listing) => debug!(location, entries = listing.len(), "Listed SFTP directory"),
            Err(e) => warn!(location, error = %e, "SFTP listing failed"),
        }
        result
    }

    async fn download(&self, path: &str) -> Result<Download, AdapterError> {
        let remote = self.absolute(path);
        let name = base_name(path).to_string();
        let missing = path.to_string();
        let (file, size) = self
            .client
            .call(move |sftp| {
                match sftp.stat(&remote) {
                    Some(stat) if !stat.is_dir() => {}
                    _ => return Err(AdapterError::NotFound(missing)),
                }
                spool(|out| sftp.retrieve(&remote, out))
            })
            .await?;
        debug!(path, size, "Spooled SFTP download");
        Ok(Download::new(name, size, stream_file(file)))
    }
}

#[cfg(feature = "sftp")]
mod ssh2_client {
    use std::io::Write;
    use std::net::TcpStream;
    use std::path::{Path, PathBuf};

    use tracing::info;

    use super::{RemoteStat, SftpClient};
    use crate::config::expand::expand_tilde;
    use crate::config::SftpConfig;
    use crate::errors::AdapterError;

    pub(super) struct Ssh2Sftp {
        _session: ssh2::Session,
        sftp: ssh2::Sftp,
    }

    /// Connect to an SSH server, perform handshake, and authenticate.
    fn connect_and_authenticate(config: &SftpConfig) -> Result<ssh2::Session, AdapterError> {
        let addr = format!("{}:{}", config.host, config.port);
        let tcp = TcpStream::connect(&addr)
            .map_err(|e| AdapterError::Connection(format!("Connection failed: {e}")))?;

        let mut session =
            ssh2::Session::new().map_err(|e| AdapterError::Connection(e.to_string()))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| AdapterError::Connection(format!("Handshake failed: {e}")))?;

        match config.auth_method.as_str() {
            "agent" => {
                session
                    .userauth_agent(&config.username)
                    .map_err(|e| AdapterError::Connection(format!("Agent auth failed: {e}")))?;
            }
            "key" => {
                let key_path = config
                    .key_path
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .unwrap_or("~/.ssh/id_rsa");
                let key_path = PathBuf::from(expand_tilde(key_path));
                session
                    .userauth_pubkey_file(
                        &config.username,
                        None,
                        &key_path,
                        config.password.as_deref(),
                    )
                    .map_err(|e| AdapterError::Connection(format!("Key auth failed: {e}")))?;
            }
            _ => {
                let password = config.password.as_deref().unwrap_or("");
                session
                    .userauth_password(&config.username, password)
                    .map_err(|e| AdapterError::Connection(format!("Password auth failed: {e}")))?;
            }
        }

        if !session.authenticated() {
            return Err(AdapterError::Connection("Authentication failed".to_string()));
        }
        Ok(session)
    }

    pub(super) fn connect(config: &SftpConfig) -> Result<Ssh2Sftp, AdapterError> {
        let session = connect_and_authenticate(config)?;
        session.set_blocking(true);
        let sftp = session
            .sftp()
            .map_err(|e| AdapterError::Connection(format!("SFTP init failed: {e}")))?;
        info!(host = %config.host, port = config.port, "SFTP connected");
        Ok(Ssh2Sftp {
            _session: session,
            sftp,
        })
    }

    fn convert(stat: &ssh2::FileStat) -> RemoteStat {
        RemoteStat {
            size: stat.size,
            mtime: stat.mtime,
            mode: stat.perm,
        }
    }

    impl SftpClient for Ssh2Sftp {
        fn read_dir(
            &mut self,
            dir: &str,
        ) -> Result<Vec<(String, Option<RemoteStat>)>, AdapterError> {
            let entries = self
                .sftp
                .readdir(Path::new(dir))
                .map_err(|e| AdapterError::ListingUnavailable(format!("readdir failed: {e}")))?;
            Ok(entries
                .into_iter()
                .map(|(path, stat)| {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    (name, Some(convert(&stat)))
                })
                .collect())
        }

        fn stat(&mut self, path: &str) -> Option<RemoteStat> {
            self.sftp.stat(Path::new(path)).ok().map(|s| convert(&s))
        }

        fn retrieve(&mut self, path: &str, out: &mut dyn Write) -> Result<u64, AdapterError> {
            let mut remote = self
                .sftp
                .open(Path::new(path))
                .map_err(|_| AdapterError::NotFound(path.to_string()))?;
            Ok(std::io::copy(&mut remote, out)?)
        }
    }
}
