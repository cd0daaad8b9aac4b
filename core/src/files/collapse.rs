//! One-level directory synthesis over flat key spaces.
//!
//! Object stores and archives have no directories, only full keys such as
//! `docs/img/logo.png`. [`collapse_one_level`] turns the keys under a
//! location into that location's direct children: keys one segment deep
//! become files, deeper keys contribute their first segment as a directory,
//! deduplicated. Nothing below the first level is ever emitted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::path::{location_prefix, trim_location};
use super::{DirectoryEntry, FileEntry, ListingBuilder};

/// One stored key with whatever metadata the backend reports for it.
///
/// A key ending in `/` is an explicit directory record (zip directory
/// entries, object-store common prefixes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatKey {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl FlatKey {
    pub fn new(key: impl Into<String>, size: u64, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified,
        }
    }

    /// A directory marker for `prefix`, which gains a trailing `/` if missing.
    pub fn directory(prefix: impl Into<String>) -> Self {
        let mut key = prefix.into();
        if !key.ends_with('/') {
            key.push('/');
        }
        Self::new(key, 0, None)
    }
}

/// The part of `key` below `prefix`, or `None` if `key` is not beneath it.
///
/// `prefix` must already be trimmed of separators; matching is by whole
/// segments, so `test` is not a prefix of `test-file.txt`.
pub fn relative_key<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    let key = key.trim_start_matches('/');
    if prefix.is_empty() {
        return Some(key);
    }
    key.strip_prefix(prefix)?.strip_prefix('/')
}

/// Whether any key equals `location` or lies beneath it.
pub fn location_exists<'a>(location: &str, mut keys: impl Iterator<Item = &'a str>) -> bool {
    let prefix = trim_location(location);
    if prefix.is_empty() {
        return true;
    }
    keys.any(|key| {
        let key = key.replace('\\', "/");
        let key = key.trim_matches('/');
        key == prefix || relative_key(key, &prefix).is_some()
    })
}

/// Synthesize the direct children of `location` from a flat key space.
///
/// Returned unsorted so the caller can choose between sorted and native order.
pub fn collapse_one_level(
    location: &str,
    keys: impl IntoIterator<Item = FlatKey>,
) -> ListingBuilder {
    let prefix = trim_location(location);
    let parent = location_prefix(location);

    let mut builder = ListingBuilder::new();
    let mut directories: BTreeMap<String, Option<DateTime<Utc>>> = BTreeMap::new();
    let mut directory_order: Vec<String> = Vec::new();

    for flat in keys {
        let key = flat.key.replace('\\', "/");
        let Some(relative) = relative_key(&key, &prefix) else {
            continue;
        };
        let is_marker = relative.ends_with('/');
        let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
        let Some(first) = segments.first() else {
            continue;
        };

        if segments.len() == 1 && !is_marker {
            builder.add_file(FileEntry::new(
                parent.clone(),
                *first,
                flat.size,
                flat.last_modified,
            ));
            continue;
        }

        match directories.get_mut(*first) {
            Some(modified) => {
                if flat.last_modified > *modified {
                    *modified = flat.last_modified;
                }
            }
            None => {
                directories.insert(first.to_string(), flat.last_modified);
                directory_order.push(first.to_string());
            }
        }
    }

    for name in directory_order {
        let modified = directories.get(&name).copied().flatten();
        builder.add_directory(DirectoryEntry::new(name, parent.clone(), modified));
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::{Entry, Listing};

    fn keys(names: &[&str]) -> Vec<FlatKey> {
        names.iter().map(|n| FlatKey::new(*n, 1, None)).collect()
    }

    fn summary(listing: &Listing) -> Vec<(bool, &str)> {
        listing.iter().map(|e| (e.is_directory(), e.name())).collect()
    }

    #[test]
    fn collapses_root_to_one_level() {
        let listing = collapse_one_level("", keys(&["a/b.txt", "a/c/d.txt", "e.txt"]))
            .sort_by_name()
            .build();
        assert_eq!(summary(&listing), [(true, "a"), (false, "e.txt")]);
        assert!(listing.iter().all(|e| e.name() != "c"));
    }

    #[test]
    fn nested_location_strips_prefix() {
        let listing = collapse_one_level(
            "/docs/",
            keys(&["docs/readme.md", "docs/img/logo.png", "other/x.txt"]),
        )
        .sort_by_name()
        .build();
        assert_eq!(summary(&listing), [(true, "img"), (false, "readme.md")]);
        let file = listing.files().next().unwrap();
        assert_eq!(file.directory_path, "docs/");
        assert_eq!(file.full_path(), "docs/readme.md");
        assert_eq!(listing.directories().next().unwrap().path, "docs/");
    }

    #[test]
    fn prefix_match_is_segment_aware() {
        let listing = collapse_one_level("test", keys(&["test-file.txt", "test/inner.txt"])).build();
        assert_eq!(summary(&listing), [(false, "inner.txt")]);
    }

    #[test]
    fn directory_markers_become_directories() {
        let listing = collapse_one_level("", vec![FlatKey::directory("empty"), FlatKey::new("f", 2, None)])
            .build();
        assert_eq!(summary(&listing), [(false, "f"), (true, "empty")]);

        // the location's own marker is not a child
        let listing = collapse_one_level("empty", vec![FlatKey::directory("empty")]).build();
        assert!(listing.is_empty());
    }

    #[test]
    fn directory_keeps_latest_known_time() {
        let early = DateTime::from_timestamp(1_000, 0);
        let late = DateTime::from_timestamp(2_000, 0);
        let listing = collapse_one_level(
            "",
            vec![
                FlatKey::new("a/1", 1, early),
                FlatKey::new("a/2", 1, None),
                FlatKey::new("a/3", 1, late),
            ],
        )
        .build();
        assert_eq!(listing.len(), 1);
        match &listing.entries()[0] {
            Entry::Directory(dir) => assert_eq!(dir.last_modified, late),
            other => panic!("unexpected entry {other:?}"),
        }
    }

    #[test]
    fn backslash_keys_are_normalized() {
        let listing = collapse_one_level("", keys(&[r"win\file.txt"])).build();
        assert_eq!(summary(&listing), [(true, "win")]);
    }

    #[test]
    fn existence_by_prefix_or_exact_key() {
        let stored = ["test-file.txt", "test-dir/empty.txt"];
        assert!(location_exists("", stored.iter().copied()));
        assert!(location_exists("/", stored.iter().copied()));
        assert!(location_exists("test-dir", stored.iter().copied()));
        assert!(location_exists("test-dir/", stored.iter().copied()));
        assert!(location_exists("test-dir/empty.txt", stored.iter().copied()));
        assert!(location_exists("test-file.txt", stored.iter().copied()));
        assert!(!location_exists("test", stored.iter().copied()));
        assert!(!location_exists("missing", stored.iter().copied()));
    }

    #[test]
    fn relative_key_behaviour() {
        assert_eq!(relative_key("docs/a.md", "docs"), Some("a.md"));
        assert_eq!(relative_key("/docs/a.md", "docs"), Some("a.md"));
        assert_eq!(relative_key("docs", "docs"), None);
        assert_eq!(relative_key("docsx/a", "docs"), None);
        assert_eq!(relative_key("a.md", ""), Some("a.md"));
    }
}
