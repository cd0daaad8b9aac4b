pub mod browser;
pub mod collapse;
pub mod filter;
pub mod listing;
pub mod path;
pub mod utils;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use browser::{Download, DownloadStream, StorageAdapter};
pub use filter::{FilterBuilder, FilterSet, Predicate};
pub use listing::{Listing, ListingBuilder};

/// A file as seen by the navigator, regardless of the backend it came from.
///
/// `directory_path` is the normalized parent path (see
/// [`path::normalized_parent`]): it ends in `/`, or is empty for the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub directory_path: String,
    pub name: String,
    pub extension: String,
    pub byte_size: u64,
    /// `None` when the backend cannot report a modification time.
    pub last_modified: Option<DateTime<Utc>>,
}

impl FileEntry {
    /// Build a file entry, deriving the extension from `name`.
    pub fn new(
        directory_path: impl Into<String>,
        name: impl Into<String>,
        byte_size: u64,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        let name = name.into();
        let extension = path::extension_of(&name).to_string();
        Self {
            directory_path: directory_path.into(),
            name,
            extension,
            byte_size,
            last_modified,
        }
    }

    /// Backend-relative path of the file (`directory_path` + `name`).
    pub fn full_path(&self) -> String {
        format!("{}{}", self.directory_path, self.name)
    }
}

/// A directory as seen by the navigator.
///
/// Many backends cannot date directories (object storage has no real
/// directories at all), hence the optional `last_modified`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub name: String,
    /// Normalized parent path of the directory.
    pub path: String,
    pub last_modified: Option<DateTime<Utc>>,
}

impl DirectoryEntry {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            last_modified,
        }
    }

    /// Backend-relative path of the directory itself, without trailing `/`.
    pub fn full_path(&self) -> String {
        format!("{}{}", self.path, self.name)
    }
}

/// One listing entry, tagged by kind.
///
/// Serializes with a `type` tag of `file` or `dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Entry {
    #[serde(rename = "file")]
    File(FileEntry),
    #[serde(rename = "dir")]
    Directory(DirectoryEntry),
}

impl Entry {
    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File(_))
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Entry::Directory(_))
    }

    /// File or directory name.
    pub fn name(&self) -> &str {
        match self {
            Entry::File(file) => &file.name,
            Entry::Directory(dir) => &dir.name,
        }
    }

    /// Normalized parent path of the entry.
    pub fn parent_path(&self) -> &str {
        match self {
            Entry::File(file) => &file.directory_path,
            Entry::Directory(dir) => &dir.path,
        }
    }

    /// File extension; `None` for directories.
    pub fn extension(&self) -> Option<&str> {
        match self {
            Entry::File(file) => Some(&file.extension),
            Entry::Directory(_) => None,
        }
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        match self {
            Entry::File(file) => file.last_modified,
            Entry::Directory(dir) => dir.last_modified,
        }
    }

    pub fn as_file(&self) -> Option<&FileEntry> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryEntry> {
        match self {
            Entry::File(_) => None,
            Entry::Directory(dir) => Some(dir),
        }
    }
}

impl From<FileEntry> for Entry {
    fn from(file: FileEntry) -> Self {
        Entry::File(file)
    }
}

impl From<DirectoryEntry> for Entry {
    fn from(dir: DirectoryEntry) -> Self {
        Entry::Directory(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_entry_derives_extension() {
        let file = FileEntry::new("docs/", "readme.MD", 12, None);
        assert_eq!(file.extension, "MD");
        assert_eq!(file.full_path(), "docs/readme.MD");

        let file = FileEntry::new("", "Makefile", 0, None);
        assert_eq!(file.extension, "");
    }

    #[test]
    fn entry_accessors() {
        let file: Entry = FileEntry::new("a/", "b.txt", 3, None).into();
        assert!(file.is_file());
        assert!(!file.is_directory());
        assert_eq!(file.name(), "b.txt");
        assert_eq!(file.parent_path(), "a/");
        assert_eq!(file.extension(), Some("txt"));

        let dir: Entry = DirectoryEntry::new("c", "a/", None).into();
        assert!(dir.is_directory());
        assert_eq!(dir.extension(), None);
        assert_eq!(dir.as_directory().unwrap().full_path(), "a/c");
    }

    #[test]
    fn entry_serializes_with_type_tag() {
        let file: Entry = FileEntry::new("", "e.txt", 4, None).into();
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["name"], "e.txt");
        assert_eq!(json["directoryPath"], "");
        assert_eq!(json["byteSize"], 4);
        assert!(json["lastModified"].is_null());

        let dir: Entry = DirectoryEntry::new("a", "", None).into();
        let json = serde_json::to_value(&dir).unwrap();
        assert_eq!(json["type"], "dir");
        assert_eq!(json["path"], "");
    }
}
