//! No-op adapter for dry runs and tests.

use crate::errors::AdapterError;
use crate::files::{Download, Listing, StorageAdapter};

/// An adapter with nothing in it.
///
/// Every location exists unless built with [`NullAdapter::with_exists`];
/// listings are always empty and downloads always fail.
#[derive(Debug, Clone, Copy)]
pub struct NullAdapter {
    exists: bool,
}

impl NullAdapter {
    pub fn new() -> Self {
        Self { exists: true }
    }

    /// Choose what [`StorageAdapter::exists`] answers.
    pub fn with_exists(exists: bool) -> Self {
        Self { exists }
    }
}

impl Default for NullAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl StorageAdapter for NullAdapter {
    async fn exists(&self, _location: &str) -> Result<bool, AdapterError> {
        Ok(self.exists)
    }

    async fn listing(&self, _location: &str) -> Result<Listing, AdapterError> {
        Ok(Listing::empty())
    }

    async fn download(&self, path: &str) -> Result<Download, AdapterError> {
        Err(AdapterError::NotFound(path.to_string()))
    }
}
