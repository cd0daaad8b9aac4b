//! Archive container adapter (ZIP, TAR, gzip-compressed TAR).
//!
//! The entry index is read once when the archive is opened; listings are
//! synthesized from it with the shared one-level collapse. Entries cannot
//! be streamed straight out of the container, so downloads are extracted
//! into an anonymous temporary file first.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::errors::AdapterError;
use crate::files::browser::{run_blocking, spool, stream_file};
use crate::files::collapse::{collapse_one_level, location_exists, FlatKey};
use crate::files::path::{base_name, trim_location};
use crate::files::utils::datetime_from_epoch;
use crate::files::{Download, Listing, StorageAdapter};

/// Supported container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
}

impl ArchiveFormat {
    /// Detect the format from a file name's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".tar") {
            Some(Self::Tar)
        } else {
            None
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zip" => Ok(Self::Zip),
            "tar" => Ok(Self::Tar),
            "tar.gz" | "tgz" => Ok(Self::TarGz),
            other => Err(AdapterError::Connection(format!(
                "Unsupported archive format: {other}"
            ))),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zip => write!(f, "zip"),
            Self::Tar => write!(f, "tar"),
            Self::TarGz => write!(f, "tar.gz"),
        }
    }
}

/// Browses the contents of an archive file.
#[derive(Debug, Clone)]
pub struct ArchiveAdapter {
    path: PathBuf,
    format: ArchiveFormat,
    index: Arc<Vec<FlatKey>>,
}

impl ArchiveAdapter {
    /// Open an archive, detecting its format from the file name.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AdapterError> {
        let path = path.into();
        let format = ArchiveFormat::from_path(&path).ok_or_else(|| {
            AdapterError::Connection(format!(
                "Cannot detect archive format of {}",
                path.display()
            ))
        })?;
        Self::open_as(path, format).await
    }

    /// Open an archive with an explicit format.
    pub async fn open_as(
        path: impl Into<PathBuf>,
        format: ArchiveFormat,
    ) -> Result<Self, AdapterError> {
        let path = path.into();
        let index = {
            let path = path.clone();
            run_blocking(move || read_index(&path, format)).await
        }
        .map_err(|e| {
            AdapterError::Connection(format!("Failed to open archive {}: {e}", path.display()))
        })?;

        info!(path = %path.display(), %format, entries = index.len(), "Archive opened");
        Ok(Self {
            path,
            format,
            index: Arc::new(index),
        })
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Unpack the whole archive into `destination`.
    pub async fn extract_all(&self, destination: impl Into<PathBuf>) -> Result<(), AdapterError> {
        let destination = destination.into();
        let path = self.path.clone();
        let format = self.format;
        run_blocking(move || {
            std::fs::create_dir_all(&destination)?;
            match format {
                ArchiveFormat::Zip => {
                    let mut zip = open_zip(&path)?;
                    zip.extract(&destination).map_err(zip_error)?;
                }
                ArchiveFormat::Tar | ArchiveFormat::TarGz => {
                    open_tar(&path, format)?.unpack(&destination)?;
                }
            }
            info!(destination = %destination.display(), "Archive extracted");
            Ok(())
        })
        .await
    }

    fn find_file(&self, path: &str) -> Option<&FlatKey> {
        let wanted = trim_location(path);
        self.index
            .iter()
            .find(|flat| !flat.key.ends_with('/') && flat.key == wanted)
    }
}

#[async_trait::async_trait]
impl StorageAdapter for ArchiveAdapter {
    async fn exists(&self, location: &str) -> Result<bool, AdapterError> {
        Ok(location_exists(
            location,
            self.index.iter().map(|flat| flat.key.as_str()),
        ))
    }

    async fn listing(&self, location: &str) -> Result<Listing, AdapterError> {
        let listing = collapse_one_level(location, self.index.iter().cloned())
            .sort_by_name()
            .build();
        debug!(location, entries = listing.len(), "Listed archive location");
        Ok(listing)
    }

    async fn download(&self, path: &str) -> Result<Download, AdapterError> {
        let key = self
            .find_file(path)
            .ok_or_else(|| AdapterError::NotFound(path.to_string()))?
            .key
            .clone();

        let archive = self.path.clone();
        let format = self.format;
        let (file, size) = run_blocking(move || extract_entry(&archive, format, &key)).await?;
        Ok(Download::new(base_name(path), size, stream_file(file)))
    }
}

/// Normalize a stored entry name: `/` separators, no leading `./` or `/`.
fn normalize_key(raw: &str) -> String {
    let key = raw.replace('\\', "/");
    let key = key.trim_start_matches("./").trim_start_matches('/');
    key.to_string()
}

fn zip_error(e: zip::result::ZipError) -> AdapterError {
    match e {
        zip::result::ZipError::Io(e) => AdapterError::Io(e),
        other => AdapterError::BackendUnavailable(other.to_string()),
    }
}

fn open_zip(path: &Path) -> Result<zip::ZipArchive<File>, AdapterError> {
    zip::ZipArchive::new(File::open(path)?).map_err(zip_error)
}

fn open_tar(path: &Path, format: ArchiveFormat) -> io::Result<tar::Archive<Box<dyn Read>>> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = match format {
        ArchiveFormat::TarGz => Box::new(GzDecoder::new(file)),
        _ => Box::new(file),
    };
    Ok(tar::Archive::new(reader))
}

/// Zip timestamps carry no zone; they are read as UTC.
fn zip_datetime(dt: zip::DateTime) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(dt.year().into(), dt.month().into(), dt.day().into())?
        .and_hms_opt(dt.hour().into(), dt.minute().into(), dt.second().into())
        .map(|naive| naive.and_utc())
}

fn index_key(raw: &str, is_dir: bool) -> Option<String> {
    let mut key = normalize_key(raw);
    if key.is_empty() || key == "." {
        return None;
    }
    if is_dir && !key.ends_with('/') {
        key.push('/');
    }
    Some(key)
}

fn read_index(path: &Path, format: ArchiveFormat) -> Result<Vec<FlatKey>, AdapterError> {
    let mut index = Vec::new();
    match format {
        ArchiveFormat::Zip => {
            let mut zip = open_zip(path)?;
            for i in 0..zip.len() {
                let entry = zip.by_index(i).map_err(zip_error)?;
                let Some(key) = index_key(entry.name(), entry.is_dir()) else {
                    continue;
                };
                let size = if entry.is_dir() { 0 } else { entry.size() };
                index.push(FlatKey::new(key, size, zip_datetime(entry.last_modified())));
            }
        }
        ArchiveFormat::Tar | ArchiveFormat::TarGz => {
            let mut tar = open_tar(path, format)?;
            for entry in tar.entries()? {
                let entry = entry?;
                let header = entry.header();
                let is_dir = header.entry_type().is_dir();
                let raw = entry.path()?.to_string_lossy().into_owned();
                let Some(key) = index_key(&raw, is_dir) else {
                    continue;
                };
                let size = if is_dir { 0 } else { header.size()? };
                let modified = header.mtime().ok().and_then(datetime_from_epoch);
                index.push(FlatKey::new(key, size, modified));
            }
        }
    }
    Ok(index)
}

fn extract_entry(
    path: &Path,
    format: ArchiveFormat,
    key: &str,
) -> Result<(File, u64), AdapterError> {
    match format {
        ArchiveFormat::Zip => {
            let mut zip = open_zip(path)?;
            for i in 0..zip.len() {
                let mut entry = zip.by_index(i).map_err(zip_error)?;
                if entry.is_dir() || normalize_key(entry.name()) != key {
                    continue;
                }
                return spool(|out| Ok(io::copy(&mut entry, out)?));
            }
        }
        ArchiveFormat::Tar | ArchiveFormat::TarGz => {
            let mut tar = open_tar(path, format)?;
            for entry in tar.entries()? {
                let mut entry = entry?;
                if entry.header().entry_type().is_dir() {
                    continue;
                }
                if normalize_key(&entry.path()?.to_string_lossy()) != key {
                    continue;
                }
                return spool(|out| Ok(io::copy(&mut entry, out)?));
            }
        }
    }
    Err(AdapterError::NotFound(key.to_string()))
}
