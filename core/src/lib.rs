pub mod backends;
pub mod config;
pub mod errors;
pub mod files;
pub mod navigation;
pub mod navigator;

pub use config::BrowserConfig;
pub use errors::{AdapterError, NavigatorError};
pub use files::{DirectoryEntry, Download, Entry, FileEntry, Listing, StorageAdapter};
pub use navigation::{NavigationRequest, RequestContext};
pub use navigator::{NavigatorResponse, RenderData, Renderer, StorageNavigator};
