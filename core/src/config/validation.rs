//! Validation of raw browser configuration values.
//!
//! Use [`validate_browser_config`] on a `serde_json::Value` before
//! deserializing it into a [`BrowserConfig`](super::BrowserConfig).

use chrono::format::{Item, StrftimeItems};
use serde_json::Value;

/// A single validation error for a configuration key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The offending key (e.g. `"ignore_filenames"`).
    pub field: String,
    /// Human-readable error message.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Keys accepted in snake_case or camelCase.
const DATE_FORMAT: [&str; 2] = ["date_format", "dateFormat"];
const IGNORE_FILENAMES: [&str; 2] = ["ignore_filenames", "ignoreFilenames"];
const IGNORE_EXTENSIONS: [&str; 2] = ["ignore_extensions", "ignoreExtensions"];

const INVALID_FILENAME_CHARS: [char; 9] = ['/', ':', '*', '?', '"', '<', '>', '|', '\\'];

/// Validate a browser configuration object.
///
/// Returns every problem found; an empty list means the value is valid.
pub fn validate_browser_config(config: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let Some(object) = config.as_object() else {
        errors.push(ValidationError::new(
            "config",
            "configuration must be an object",
        ));
        return errors;
    };

    for (key, value) in object {
        let key = key.as_str();
        if DATE_FORMAT.contains(&key) {
            validate_date_format(key, value, &mut errors);
        } else if IGNORE_FILENAMES.contains(&key) {
            validate_filenames(key, value, &mut errors);
        } else if IGNORE_EXTENSIONS.contains(&key) {
            validate_extensions(key, value, &mut errors);
        } else {
            errors.push(ValidationError::new(
                key,
                format!("Configuration key is invalid: [{key}]"),
            ));
        }
    }
    errors
}

fn validate_date_format(key: &str, value: &Value, errors: &mut Vec<ValidationError>) {
    let Some(format) = value.as_str() else {
        errors.push(ValidationError::new(key, format!("{key} must be a string")));
        return;
    };
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        errors.push(ValidationError::new(
            key,
            format!("[{format}] is not a valid date format"),
        ));
    }
}

fn string_list<'a>(
    key: &str,
    value: &'a Value,
    errors: &mut Vec<ValidationError>,
) -> Option<Vec<&'a str>> {
    let Some(items) = value.as_array() else {
        errors.push(ValidationError::new(key, format!("{key} must be an array")));
        return None;
    };
    let strings: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
    if strings.is_none() {
        errors.push(ValidationError::new(
            key,
            format!("{key} must contain only strings"),
        ));
    }
    strings
}

fn is_valid_filename(name: &str) -> bool {
    !name.is_empty() && !name.contains(INVALID_FILENAME_CHARS)
}

fn is_valid_extension(extension: &str) -> bool {
    extension
        .split('.')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn validate_filenames(key: &str, value: &Value, errors: &mut Vec<ValidationError>) {
    let Some(names) = string_list(key, value, errors) else {
        return;
    };
    let invalid: Vec<&str> = names.into_iter().filter(|n| !is_valid_filename(n)).collect();
    if !invalid.is_empty() {
        errors.push(ValidationError::new(
            key,
            format!("[{}] containing invalid characters in {key}", invalid.join(", ")),
        ));
    }
}

fn validate_extensions(key: &str, value: &Value, errors: &mut Vec<ValidationError>) {
    let Some(extensions) = string_list(key, value, errors) else {
        return;
    };
    let invalid: Vec<&str> = extensions
        .into_iter()
        .filter(|e| !is_valid_extension(e))
        .collect();
    if !invalid.is_empty() {
        errors.push(ValidationError::new(
            key,
            format!("[{}] containing invalid characters in {key}", invalid.join(", ")),
        ));
    }
}
