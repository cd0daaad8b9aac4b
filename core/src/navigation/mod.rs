//! Navigation action sources.
//!
//! An [`ActionSource`] classifies one inbound request into a
//! [`NavigationRequest`]. The request data is passed in explicitly as a
//! [`RequestContext`]; sources never read ambient state.

mod form;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use form::FormActionSource;

/// What a request asks the navigator to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "path", rename_all = "camelCase")]
pub enum NavigationRequest {
    /// Render the root location.
    None,
    /// Render the listing of another location.
    ChangePath(String),
    /// Transfer a file.
    DownloadFile(String),
}

/// The transport-independent part of an inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub method: String,
    pub form: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            form: HashMap::new(),
        }
    }

    /// A `GET` request without form data.
    pub fn get() -> Self {
        Self::new("GET")
    }

    /// A `POST` request carrying `fields`.
    pub fn post<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut ctx = Self::new("POST");
        ctx.form = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        ctx
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.form.get(key).map(String::as_str)
    }

    pub fn is_post(&self) -> bool {
        self.method.eq_ignore_ascii_case("POST")
    }
}

/// Classifies inbound requests.
pub trait ActionSource: Send + Sync {
    fn classify(&self, request: &RequestContext) -> NavigationRequest;
}

/// Never requests anything; the navigator always renders the root.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullActionSource;

impl ActionSource for NullActionSource {
    fn classify(&self, _request: &RequestContext) -> NavigationRequest {
        NavigationRequest::None
    }
}
