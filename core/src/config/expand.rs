//! Placeholder expansion for connection settings.
//!
//! `${env:NAME}` is replaced by the environment variable `NAME` and a
//! leading `~` by the user's home directory. Placeholders naming an unset
//! variable are kept verbatim.

use tracing::debug;

/// Replace every `${env:NAME}` placeholder in `input`.
pub fn expand_env_placeholders(input: &str) -> String {
    const OPEN: &str = "${env:";
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &after[..end];
        match std::env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) => {
                debug!(name, "Environment variable not set, keeping placeholder");
                out.push_str(&rest[start..start + OPEN.len() + end + 1]);
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn home_dir() -> Option<String> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .filter(|h| !h.is_empty())
}

/// Expand a leading `~` or `~/` to the home directory.
pub fn expand_tilde(path: &str) -> String {
    let Some(home) = home_dir() else {
        return path.to_string();
    };
    if path == "~" {
        home
    } else if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        format!("{}/{rest}", home.trim_end_matches(['/', '\\']))
    } else {
        path.to_string()
    }
}
