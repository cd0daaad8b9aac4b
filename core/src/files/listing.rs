use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use super::path::is_path;
use super::{DirectoryEntry, Entry, FileEntry};

/// Immutable, ordered result of listing one location.
///
/// Built through [`ListingBuilder`]; within one listing no two entries share
/// kind, parent path and name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Listing {
    entries: Vec<Entry>,
}

impl Listing {
    pub fn builder() -> ListingBuilder {
        ListingBuilder::new()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter().filter_map(Entry::as_file)
    }

    pub fn directories(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.iter().filter_map(Entry::as_directory)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Reopen the listing as a builder, e.g. to re-sort it.
    pub fn into_builder(self) -> ListingBuilder {
        ListingBuilder {
            entries: self.entries,
        }
    }
}

impl IntoIterator for Listing {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Listing {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Accumulates entries for a [`Listing`].
#[derive(Debug, Clone, Default)]
pub struct ListingBuilder {
    entries: Vec<Entry>,
}

impl ListingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, file: FileEntry) -> &mut Self {
        self.entries.push(Entry::File(file));
        self
    }

    pub fn add_directory(&mut self, dir: DirectoryEntry) -> &mut Self {
        self.entries.push(Entry::Directory(dir));
        self
    }

    pub fn add(&mut self, entry: impl Into<Entry>) -> &mut Self {
        self.entries.push(entry.into());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Directories first, then files; each group by byte-wise name order.
    ///
    /// The sort is stable, so equal names keep insertion order.
    pub fn sort_by_name(&mut self) -> &mut Self {
        self.entries.sort_by(|a, b| {
            b.is_directory()
                .cmp(&a.is_directory())
                .then_with(|| a.name().cmp(b.name()))
        });
        self
    }

    /// Finish the listing.
    ///
    /// Entries with an empty name or a name containing a separator are
    /// skipped, as are repeats of an entry already added.
    pub fn build(&mut self) -> Listing {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(self.entries.len());
        for entry in std::mem::take(&mut self.entries) {
            if entry.name().is_empty() || is_path(entry.name()) {
                debug!(name = entry.name(), "Skipping entry with invalid name");
                continue;
            }
            let key = (
                entry.is_directory(),
                entry.parent_path().to_string(),
                entry.name().to_string(),
            );
            if !seen.insert(key) {
                debug!(name = entry.name(), "Skipping duplicate entry");
                continue;
            }
            entries.push(entry);
        }
        Listing { entries }
    }
}

impl FromIterator<Entry> for ListingBuilder {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(listing: &Listing) -> Vec<&str> {
        listing.iter().map(Entry::name).collect()
    }

    fn mixed_builder() -> ListingBuilder {
        let mut builder = ListingBuilder::new();
        builder
            .add_file(FileEntry::new("", "b.txt", 1, None))
            .add_directory(DirectoryEntry::new("zeta", "", None))
            .add_file(FileEntry::new("", "B.txt", 2, None))
            .add_file(FileEntry::new("", "a.txt", 3, None))
            .add_directory(DirectoryEntry::new("Alpha", "", None));
        builder
    }

    #[test]
    fn unsorted_build_keeps_insertion_order() {
        let listing = mixed_builder().build();
        assert_eq!(names(&listing), ["b.txt", "zeta", "B.txt", "a.txt", "Alpha"]);
    }

    #[test]
    fn sort_puts_directories_first_case_sensitive() {
        let listing = mixed_builder().sort_by_name().build();
        assert_eq!(names(&listing), ["Alpha", "zeta", "B.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn sort_is_idempotent() {
        let once = mixed_builder().sort_by_name().build();
        let twice = once.clone().into_builder().sort_by_name().build();
        assert_eq!(once, twice);
    }

    #[test]
    fn sort_is_stable_for_equal_names() {
        let mut builder = ListingBuilder::new();
        builder
            .add_file(FileEntry::new("x/", "same", 1, None))
            .add_file(FileEntry::new("y/", "same", 2, None));
        let listing = builder.sort_by_name().build();
        let sizes: Vec<u64> = listing.files().map(|f| f.byte_size).collect();
        assert_eq!(sizes, [1, 2]);
    }

    #[test]
    fn build_drops_duplicates_of_same_kind() {
        let mut builder = ListingBuilder::new();
        builder
            .add_directory(DirectoryEntry::new("a", "", None))
            .add_directory(DirectoryEntry::new("a", "", None))
            .add_file(FileEntry::new("", "a", 0, None));
        let listing = builder.build();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing.directories().count(), 1);
        assert_eq!(listing.files().count(), 1);
    }

    #[test]
    fn build_skips_invalid_names() {
        let mut builder = ListingBuilder::new();
        builder
            .add_file(FileEntry::new("", "", 0, None))
            .add_file(FileEntry::new("", "a/b", 0, None))
            .add_directory(DirectoryEntry::new(r"c\d", "", None))
            .add_file(FileEntry::new("", "ok", 0, None));
        let listing = builder.build();
        assert_eq!(names(&listing), ["ok"]);
    }

    #[test]
    fn views_and_serialization() {
        let listing = mixed_builder().sort_by_name().build();
        assert_eq!(listing.files().count(), 3);
        assert_eq!(listing.directories().count(), 2);
        assert!(!listing.is_empty());

        let json = serde_json::to_value(&listing).unwrap();
        let array = json.as_array().unwrap();
        assert_eq!(array.len(), 5);
        assert_eq!(array[0]["type"], "dir");
        assert_eq!(array[4]["name"], "b.txt");
    }

    #[test]
    fn empty_listing() {
        let listing = Listing::empty();
        assert!(listing.is_empty());
        assert_eq!(listing.into_iter().count(), 0);
    }
}
