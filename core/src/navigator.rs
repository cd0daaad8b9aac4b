//! The browser facade.
//!
//! [`StorageNavigator`] ties one storage adapter to one renderer. Each
//! request is classified by the renderer's action source, confined to the
//! configured root, and then answered with a rendered listing or a
//! download stream.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::errors::{AdapterError, NavigatorError};
use crate::files::path::{is_within_root, trim_location};
use crate::files::{Download, FilterSet, Listing, StorageAdapter};
use crate::navigation::{ActionSource, NavigationRequest, NullActionSource, RequestContext};

/// Everything a renderer receives for one listing.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderData<'a> {
    pub current_path: &'a str,
    pub root_path: &'a str,
    pub listing: &'a Listing,
    pub config: &'a BrowserConfig,
}

/// Output strategy of the navigator.
///
/// The navigator never inspects what a renderer produces.
pub trait Renderer: Send + Sync {
    fn render(&self, data: &RenderData<'_>) -> Result<(), NavigatorError>;

    /// The source used to classify requests for this renderer.
    fn action_source(&self) -> &dyn ActionSource;
}

/// Renders nothing and never requests navigation.
#[derive(Debug, Default)]
pub struct NullRenderer {
    source: NullActionSource,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for NullRenderer {
    fn render(&self, _data: &RenderData<'_>) -> Result<(), NavigatorError> {
        Ok(())
    }

    fn action_source(&self) -> &dyn ActionSource {
        &self.source
    }
}

/// Outcome of one handled request.
#[derive(Debug)]
pub enum NavigatorResponse {
    /// A listing of `location` was handed to the renderer.
    Rendered { location: String, entries: usize },
    /// A file transfer for the caller to deliver.
    Download(Download),
}

/// Browses one backend below a fixed root location.
pub struct StorageNavigator {
    adapter: Box<dyn StorageAdapter>,
    renderer: Box<dyn Renderer>,
    root: String,
    config: BrowserConfig,
    filters: FilterSet,
}

impl std::fmt::Debug for StorageNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageNavigator")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

impl StorageNavigator {
    /// Create a navigator rooted at `root`.
    ///
    /// Fails with [`NavigatorError::InvalidRoot`] if the adapter does not
    /// report `root` as existing; nothing is rendered in that case.
    pub async fn new(
        adapter: Box<dyn StorageAdapter>,
        renderer: Box<dyn Renderer>,
        root: impl Into<String>,
        config: BrowserConfig,
    ) -> Result<Self, NavigatorError> {
        let root = root.into();
        if !adapter.exists(&trim_location(&root)).await? {
            warn!(root = %root, "Root location does not exist");
            return Err(NavigatorError::InvalidRoot(root));
        }
        info!(root = %root, "Navigator ready");
        let filters = config.visibility_filter();
        Ok(Self {
            adapter,
            renderer,
            root,
            config,
            filters,
        })
    }

    /// Add filters applied to every rendered listing, after the
    /// configuration's visibility filter. Downloads are never filtered.
    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Classify `request` with the renderer's action source and answer it.
    pub async fn handle(
        &self,
        request: &RequestContext,
    ) -> Result<NavigatorResponse, NavigatorError> {
        let action = self.renderer.action_source().classify(request);
        self.navigate(action).await
    }

    /// Answer an already classified request.
    pub async fn navigate(
        &self,
        action: NavigationRequest,
    ) -> Result<NavigatorResponse, NavigatorError> {
        debug!(?action, "Dispatching navigation request");
        match action {
            NavigationRequest::None => self.render(&self.root).await,
            NavigationRequest::ChangePath(path) => {
                self.confine(&path)?;
                self.render(&path).await
            }
            NavigationRequest::DownloadFile(path) => {
                self.confine(&path)?;
                self.download(&path).await.map(NavigatorResponse::Download)
            }
        }
    }

    /// The filtered listing of `location`, without rendering it.
    pub async fn listing(&self, location: &str) -> Result<Listing, NavigatorError> {
        self.confine(location)?;
        let listing = self.adapter.listing(&trim_location(location)).await?;
        Ok(self.filters.apply(&listing))
    }

    fn confine(&self, path: &str) -> Result<(), NavigatorError> {
        if is_within_root(path, &self.root) {
            return Ok(());
        }
        warn!(path, root = %self.root, "Rejected path outside of root");
        Err(NavigatorError::PathOutsideRoot {
            path: path.to_string(),
            root: self.root.clone(),
        })
    }

    async fn render(&self, location: &str) -> Result<NavigatorResponse, NavigatorError> {
        let listing = self.listing(location).await?;
        self.renderer.render(&RenderData {
            current_path: location,
            root_path: &self.root,
            listing: &listing,
            config: &self.config,
        })?;
        debug!(location, entries = listing.len(), "Rendered listing");
        Ok(NavigatorResponse::Rendered {
            location: location.to_string(),
            entries: listing.len(),
        })
    }

    async fn download(&self, path: &str) -> Result<Download, NavigatorError> {
        let key = trim_location(path);
        if !self.adapter.exists(&key).await? {
            return Err(NavigatorError::NotFound(path.to_string()));
        }
        let download = self.adapter.download(&key).await.map_err(|e| match e {
            AdapterError::NotFound(_) => NavigatorError::NotFound(path.to_string()),
            other => NavigatorError::Adapter(other),
        })?;
        info!(path, size = download.size, "Starting download");
        Ok(download)
    }
}
