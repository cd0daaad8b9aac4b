//! Error types for the storage navigator core.
//!
//! Adapters report [`AdapterError`]; the navigator facade wraps those in
//! [`NavigatorError`] together with its own construction and dispatch
//! failures. Front ends map navigator errors onto their own transport.

use thiserror::Error;

/// Errors raised by a storage adapter.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The backend could not be opened or authenticated against.
    ///
    /// Only raised while constructing an adapter; it is fatal.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A backend call (existence probe, transfer) failed.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend failed to produce a listing for a location.
    #[error("Listing unavailable: {0}")]
    ListingUnavailable(String),

    /// The requested file or directory does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A low-level I/O error while reading or spooling data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the navigator facade.
#[derive(Error, Debug)]
pub enum NavigatorError {
    /// The configured root location does not exist on the backend.
    #[error("Location: [{0}] does not exist")]
    InvalidRoot(String),

    /// The requested file does not exist.
    #[error("File [{0}] does not exist")]
    NotFound(String),

    /// The requested path escapes the configured root.
    #[error("Path [{path}] is outside of root [{root}]")]
    PathOutsideRoot { path: String, root: String },

    /// A configuration key or value was rejected.
    #[error("Invalid configuration - {key}: {reason}")]
    InvalidConfiguration { key: String, reason: String },

    /// The renderer failed to produce its output.
    #[error("Render failed: {0}")]
    Render(String),

    /// An adapter call failed.
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),
}

impl NavigatorError {
    pub(crate) fn invalid_configuration(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
