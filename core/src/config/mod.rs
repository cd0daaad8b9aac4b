pub mod expand;
pub mod validation;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::NavigatorError;
use crate::files::{FilterBuilder, FilterSet};

pub use validation::{validate_browser_config, ValidationError};

/// Display and visibility settings shared by the navigator and renderers.
///
/// - `date_format`: chrono strftime pattern used when rendering timestamps.
/// - `ignore_filenames`: entries with one of these names are hidden.
/// - `ignore_extensions`: files with one of these extensions are hidden
///   (compared lowercased).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    #[serde(default = "default_date_format", alias = "date_format")]
    pub date_format: String,
    #[serde(default, alias = "ignore_filenames")]
    pub ignore_filenames: Vec<String>,
    #[serde(default, alias = "ignore_extensions")]
    pub ignore_extensions: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            ignore_filenames: Vec::new(),
            ignore_extensions: Vec::new(),
        }
    }
}

impl BrowserConfig {
    /// Validate and build a configuration from a JSON object.
    ///
    /// Fails with [`NavigatorError::InvalidConfiguration`] naming the first
    /// offending key.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, NavigatorError> {
        if let Some(error) = validate_browser_config(value).into_iter().next() {
            return Err(NavigatorError::invalid_configuration(
                error.field,
                error.message,
            ));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| NavigatorError::invalid_configuration("config", e.to_string()))
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, NavigatorError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| NavigatorError::invalid_configuration("config", e.to_string()))?;
        Self::from_value(&value)
    }

    /// Filter set hiding the configured names and extensions.
    ///
    /// Empty when nothing is configured.
    pub fn visibility_filter(&self) -> FilterSet {
        let mut builder = FilterBuilder::new();
        if !self.ignore_filenames.is_empty() {
            let names: Vec<&str> = self.ignore_filenames.iter().map(String::as_str).collect();
            builder = builder.name_not_equals(&names);
        }
        if !self.ignore_extensions.is_empty() {
            let extensions: Vec<String> = self
                .ignore_extensions
                .iter()
                .map(|e| e.to_ascii_lowercase())
                .collect();
            builder = builder.predicate(move |entry| match entry.extension() {
                Some(ext) => !extensions.contains(&ext.to_ascii_lowercase()),
                None => true,
            });
        }
        builder.build()
    }

    /// Render a timestamp with `date_format`.
    pub fn format_datetime(&self, datetime: &DateTime<Utc>) -> String {
        datetime.format(&self.date_format).to_string()
    }
}

/// FTP connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpConfig {
    pub host: String,
    #[serde(default = "default_ftp_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_passive")]
    pub passive: bool,
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_ftp_port(),
            username: String::new(),
            password: String::new(),
            passive: default_passive(),
            root_dir: default_root_dir(),
        }
    }
}

/// SFTP connection settings.
///
/// - `auth_method`: `"password"` (default), `"key"` or `"agent"`.
/// - `password`: the password, or the key passphrase for key auth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SftpConfig {
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub username: String,
    #[serde(default = "default_auth_method")]
    pub auth_method: String,
    pub password: Option<String>,
    pub key_path: Option<String>,
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
}

impl Default for SftpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_ssh_port(),
            username: String::new(),
            auth_method: default_auth_method(),
            password: None,
            key_path: None,
            root_dir: default_root_dir(),
        }
    }
}

/// S3-compatible object storage settings.
///
/// Credentials fall back to the usual `AWS_*` environment variables when
/// not given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    pub bucket: String,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services (MinIO etc.).
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

// --- Expand methods ---

impl FtpConfig {
    /// Return a copy with all `${env:...}` placeholders expanded.
    pub fn expand(mut self) -> Self {
        self.host = expand::expand_env_placeholders(&self.host);
        self.username = expand::expand_env_placeholders(&self.username);
        self.password = expand::expand_env_placeholders(&self.password);
        self
    }
}

impl SftpConfig {
    /// Return a copy with all `${env:...}` placeholders and `~` expanded.
    pub fn expand(mut self) -> Self {
        self.host = expand::expand_env_placeholders(&self.host);
        self.username = expand::expand_env_placeholders(&self.username);
        self.key_path = self.key_path.map(|s| {
            // Strip surrounding quotes from pasted paths
            let stripped = s.trim().trim_matches('"').trim_matches('\'');
            expand::expand_tilde(&expand::expand_env_placeholders(stripped))
        });
        self.password = self.password.map(|s| expand::expand_env_placeholders(&s));
        self
    }
}

impl S3Config {
    /// Return a copy with all `${env:...}` placeholders expanded.
    pub fn expand(mut self) -> Self {
        self.bucket = expand::expand_env_placeholders(&self.bucket);
        self.endpoint_url = self
            .endpoint_url
            .map(|s| expand::expand_env_placeholders(&s));
        self.access_key_id = self
            .access_key_id
            .map(|s| expand::expand_env_placeholders(&s));
        self.secret_access_key = self
            .secret_access_key
            .map(|s| expand::expand_env_placeholders(&s));
        self
    }
}

// --- Default value functions ---

fn default_date_format() -> String {
    "%b %d %Y %H:%M".to_string()
}

fn default_ftp_port() -> u16 {
    21
}

fn default_ssh_port() -> u16 {
    22
}

fn default_passive() -> bool {
    true
}

fn default_root_dir() -> String {
    "/".to_string()
}

fn default_auth_method() -> String {
    "password".to_string()
}
