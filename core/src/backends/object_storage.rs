//! Object storage adapter over any `object_store` backend.
//!
//! Listings use a delimiter-scoped prefix listing: common prefixes become
//! directories and exact keys become files, fed through the shared
//! one-level collapse. Downloads stream the object body directly.

use std::sync::Arc;

use futures_util::StreamExt;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore, ObjectStoreExt};
use percent_encoding::percent_decode_str;
use tracing::{debug, warn};

use crate::errors::AdapterError;
use crate::files::collapse::{collapse_one_level, FlatKey};
use crate::files::path::{base_name, trim_location};
use crate::files::{Download, Listing, StorageAdapter};

/// Browses a bucket (or any other object store) as a directory tree.
#[derive(Clone)]
pub struct ObjectStorageAdapter {
    store: Arc<dyn ObjectStore>,
    sorted: bool,
}

impl std::fmt::Debug for ObjectStorageAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorageAdapter")
            .field("store", &self.store.to_string())
            .field("sorted", &self.sorted)
            .finish()
    }
}

impl ObjectStorageAdapter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            sorted: true,
        }
    }

    /// Keep the order the backend lists entries in instead of sorting.
    pub fn with_native_order(mut self) -> Self {
        self.sorted = false;
        self
    }

    /// Build an S3 (or S3-compatible) adapter from `config`.
    ///
    /// Settings not given fall back to the `AWS_*` environment variables.
    #[cfg(feature = "s3")]
    pub fn s3(config: &crate::config::S3Config) -> Result<Self, AdapterError> {
        use object_store::aws::AmazonS3Builder;

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(config.bucket.clone());
        if let Some(region) = &config.region {
            builder = builder.with_region(region.clone());
        }
        if let Some(endpoint) = &config.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }
        if let Some(key) = &config.access_key_id {
            builder = builder.with_access_key_id(key.clone());
        }
        if let Some(secret) = &config.secret_access_key {
            builder = builder.with_secret_access_key(secret.clone());
        }

        let store = builder
            .build()
            .map_err(|e| AdapterError::Connection(e.to_string()))?;
        tracing::info!(bucket = %config.bucket, "S3 store configured");
        Ok(Self::new(Arc::new(store)))
    }

    async fn has_children(&self, prefix: &Path) -> Result<bool, AdapterError> {
        let result = self
            .store
            .list_with_delimiter(Some(prefix))
            .await
            .map_err(|e| AdapterError::BackendUnavailable(e.to_string()))?;
        Ok(!result.objects.is_empty() || !result.common_prefixes.is_empty())
    }
}

/// Object path for a location given in listed (decoded) form.
fn object_path(key: &str) -> Path {
    Path::from(key)
}

/// Listed form of an object path: the raw key, with the escaping
/// `object_store` applies to each segment undone.
fn display_key(path: &Path) -> String {
    path.parts()
        .map(|part| {
            percent_decode_str(part.as_ref())
                .decode_utf8_lossy()
                .into_owned()
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait::async_trait]
impl StorageAdapter for ObjectStorageAdapter {
    async fn exists(&self, location: &str) -> Result<bool, AdapterError> {
        let key = trim_location(location);
        if key.is_empty() {
            return Ok(true);
        }
        let path = object_path(&key);
        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => self.has_children(&path).await,
            Err(e) => Err(AdapterError::BackendUnavailable(e.to_string())),
        }
    }

    async fn listing(&self, location: &str) -> Result<Listing, AdapterError> {
        let prefix = trim_location(location);
        let prefix = (!prefix.is_empty()).then(|| object_path(&prefix));
        let result = self
            .store
            .list_with_delimiter(prefix.as_ref())
            .await
            .map_err(|e| {
                warn!(location, error = %e, "Object listing failed");
                AdapterError::ListingUnavailable(e.to_string())
            })?;

        let directories = result
            .common_prefixes
            .iter()
            .map(|p| FlatKey::directory(display_key(p)));
        let files = result
            .objects
            .iter()
            .map(|meta| FlatKey::new(display_key(&meta.location), meta.size, Some(meta.last_modified)));

        let mut builder = collapse_one_level(location, directories.chain(files));
        if self.sorted {
            builder.sort_by_name();
        }
        let listing = builder.build();
        debug!(location, entries = listing.len(), "Listed object prefix");
        Ok(listing)
    }

    async fn download(&self, path: &str) -> Result<Download, AdapterError> {
        let key = trim_location(path);
        if key.is_empty() {
            return Err(AdapterError::NotFound(path.to_string()));
        }
        let result = self
            .store
            .get(&object_path(&key))
            .await
            .map_err(|e| match e {
                ObjectStoreError::NotFound { .. } => AdapterError::NotFound(path.to_string()),
                other => AdapterError::BackendUnavailable(other.to_string()),
            })?;

        let size = result.meta.size;
        let stream = result
            .into_stream()
            .map(|chunk| chunk.map_err(|e| AdapterError::BackendUnavailable(e.to_string())));
        Ok(Download::new(base_name(path), size, Box::pin(stream)))
    }
}
