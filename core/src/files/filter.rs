//! Predicate-based narrowing of listings.
//!
//! A [`FilterSet`] is an ordered list of predicates combined by logical AND.
//! Applying it keeps the entries every predicate accepts, in input order.

use std::fmt;
use std::sync::Arc;

use super::{Entry, Listing};

/// A pure, shareable test on one entry.
pub type Predicate = Arc<dyn Fn(&Entry) -> bool + Send + Sync>;

/// Accumulates predicates through composable factories.
#[derive(Clone, Default)]
pub struct FilterBuilder {
    filters: Vec<Predicate>,
}

impl fmt::Debug for FilterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterBuilder")
            .field("filters", &self.filters.len())
            .finish()
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn lowered(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_ascii_lowercase()).collect()
}

fn file_extension(entry: &Entry) -> Option<String> {
    entry.extension().map(str::to_ascii_lowercase)
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an arbitrary predicate.
    pub fn predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(predicate));
        self
    }

    pub fn is_file(self) -> Self {
        self.predicate(Entry::is_file)
    }

    pub fn is_directory(self) -> Self {
        self.predicate(Entry::is_directory)
    }

    /// Keep entries whose name is one of `names`.
    pub fn name_equals(self, names: &[&str]) -> Self {
        let names = owned(names);
        self.predicate(move |e| names.iter().any(|n| n == e.name()))
    }

    /// Keep entries whose name is none of `names`.
    pub fn name_not_equals(self, names: &[&str]) -> Self {
        let names = owned(names);
        self.predicate(move |e| names.iter().all(|n| n != e.name()))
    }

    /// Keep entries whose name contains any of `needles`.
    pub fn name_contains(self, needles: &[&str]) -> Self {
        let needles = owned(needles);
        self.predicate(move |e| needles.iter().any(|n| e.name().contains(n.as_str())))
    }

    /// Keep entries whose name contains none of `needles`.
    pub fn name_not_contains(self, needles: &[&str]) -> Self {
        let needles = owned(needles);
        self.predicate(move |e| !needles.iter().any(|n| e.name().contains(n.as_str())))
    }

    // Extension predicates reject directories and compare ASCII case-insensitively.

    pub fn extension_equals(self, extensions: &[&str]) -> Self {
        let extensions = lowered(extensions);
        self.predicate(move |e| {
            file_extension(e).is_some_and(|ext| extensions.iter().any(|x| *x == ext))
        })
    }

    pub fn extension_not_equals(self, extensions: &[&str]) -> Self {
        let extensions = lowered(extensions);
        self.predicate(move |e| {
            file_extension(e).is_some_and(|ext| extensions.iter().all(|x| *x != ext))
        })
    }

    pub fn extension_contains(self, needles: &[&str]) -> Self {
        let needles = lowered(needles);
        self.predicate(move |e| {
            file_extension(e).is_some_and(|ext| needles.iter().any(|n| ext.contains(n.as_str())))
        })
    }

    pub fn extension_not_contains(self, needles: &[&str]) -> Self {
        let needles = lowered(needles);
        self.predicate(move |e| {
            file_extension(e).is_some_and(|ext| !needles.iter().any(|n| ext.contains(n.as_str())))
        })
    }

    /// The predicates accumulated so far, in insertion order.
    pub fn filters(&self) -> &[Predicate] {
        &self.filters
    }

    pub fn build(self) -> FilterSet {
        FilterSet {
            filters: self.filters,
        }
    }
}

/// An ordered, AND-combined set of predicates.
#[derive(Clone, Default)]
pub struct FilterSet {
    filters: Vec<Predicate>,
}

impl fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSet")
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl FilterSet {
    /// The identity filter.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn filters(&self) -> &[Predicate] {
        &self.filters
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        self.filters.iter().all(|p| p(entry))
    }

    /// Keep the entries every predicate accepts, preserving order.
    pub fn apply(&self, listing: &Listing) -> Listing {
        if self.is_empty() {
            return listing.clone();
        }
        listing
            .iter()
            .filter(|e| self.matches(e))
            .cloned()
            .collect::<super::ListingBuilder>()
            .build()
    }

    /// Union of both predicate lists.
    pub fn combine(&self, other: &FilterSet) -> FilterSet {
        let mut filters = self.filters.clone();
        filters.extend(other.filters.iter().cloned());
        FilterSet { filters }
    }

    pub fn extend(&mut self, other: FilterSet) {
        self.filters.extend(other.filters);
    }
}

impl From<FilterBuilder> for FilterSet {
    fn from(builder: FilterBuilder) -> Self {
        builder.build()
    }
}
