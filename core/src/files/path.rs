//! Backend-independent path helpers.
//!
//! Every backend speaks `/`-separated, backend-relative paths. Windows
//! separators are folded to `/` before any other processing.

/// Canonical parent directory of `path`.
///
/// The result ends with exactly one `/`, except that a parent resolving to
/// the current directory (a bare name, `./name`) or an empty path yields the
/// empty string, which stands for the root.
///
/// ```
/// use storage_navigator_core::files::path::normalized_parent;
///
/// assert_eq!(normalized_parent("a/b/c.txt"), "a/b/");
/// assert_eq!(normalized_parent("c.txt"), "");
/// assert_eq!(normalized_parent("/c.txt"), "/");
/// assert_eq!(normalized_parent(r"a\b"), "a/");
/// ```
pub fn normalized_parent(path: &str) -> String {
    let path = path.replace('\\', "/");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.starts_with('/') {
            "/".to_string()
        } else {
            String::new()
        };
    }

    match trimmed.rfind('/') {
        None => String::new(),
        Some(idx) => {
            let parent = trimmed[..idx].trim_end_matches('/');
            if parent.is_empty() {
                "/".to_string()
            } else if parent == "." {
                String::new()
            } else {
                format!("{parent}/")
            }
        }
    }
}

/// Last path segment, ignoring trailing separators.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Extension of a file name: the text after the last `.`, possibly empty.
///
/// A leading dot counts (`.bashrc` has extension `bashrc`), matching the
/// usual `pathinfo` semantics.
pub fn extension_of(name: &str) -> &str {
    let name = base_name(name);
    match name.rfind('.') {
        Some(idx) => &name[idx + 1..],
        None => "",
    }
}

/// Whether `s` contains a path separator of either flavour.
pub fn is_path(s: &str) -> bool {
    s.contains('/') || s.contains('\\')
}

/// Canonical form of a location, folding `\` to `/`.
///
/// Leading, trailing and repeated separators are dropped along with `.`
/// segments. This is the form flat-key backends use as a key prefix; the
/// root is `""`.
pub fn trim_location(location: &str) -> String {
    location
        .replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Parent path shared by the direct children of `location`.
///
/// `""` for the root, otherwise the trimmed location plus one `/`; this is
/// what [`normalized_parent`] yields for any child of a relative location.
pub fn location_prefix(location: &str) -> String {
    let trimmed = trim_location(location);
    if trimmed.is_empty() {
        trimmed
    } else {
        format!("{trimmed}/")
    }
}

/// Join a location onto a base directory with exactly one `/` between them.
pub fn join(base: &str, location: &str) -> String {
    let location = location.replace('\\', "/");
    let location = location.trim_start_matches('/');
    let base = base.trim_end_matches('/');
    if location.is_empty() {
        if base.is_empty() {
            "/".to_string()
        } else {
            base.to_string()
        }
    } else {
        format!("{base}/{location}")
    }
}

/// Split a path into its meaningful segments.
///
/// Empty and `.` segments are dropped. Returns `None` if any segment is
/// `..`, since such a path cannot be confined without resolving it against
/// the backend.
pub fn segments(path: &str) -> Option<Vec<String>> {
    let path = path.replace('\\', "/");
    let mut out = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s => out.push(s.to_string()),
        }
    }
    Some(out)
}

/// Whether `target` equals `root` or lies beneath it, segment by segment.
pub fn is_within_root(target: &str, root: &str) -> bool {
    let (Some(target), Some(root)) = (segments(target), segments(root)) else {
        return false;
    };
    target.len() >= root.len() && target.iter().zip(root.iter()).all(|(t, r)| t == r)
}
