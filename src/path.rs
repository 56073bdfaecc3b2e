//! Path normalization.
//!
//! Every backend addresses its contents with a normalized key: forward
//! slashes, no `.`/`..` segments, no empty segments and no leading or trailing
//! slash. The root is the empty string. `..` that would climb past the root is
//! clamped at the root, so a normalized path always stays inside the tree.

/// Normalize a user supplied path. Never fails.
pub fn normalize(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for seg in path.split(['/', '\\']) {
        match seg {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            s => stack.push(s),
        }
    }
    stack.join("/")
}

pub fn is_root(normalized: &str) -> bool {
    normalized.is_empty()
}

/// Segments of a normalized path. Empty for the root.
pub fn segments(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split('/').filter(|s| !s.is_empty())
}

/// Split a normalized path into `(parent, name)`.
pub fn split(normalized: &str) -> (&str, &str) {
    match normalized.rsplit_once('/') {
        Some((parent, name)) => (parent, name),
        None => ("", normalized),
    }
}

pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// True when `path` equals `ancestor` or lies beneath it. Both normalized.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return true;
    }
    path == ancestor
        || (path.starts_with(ancestor) && path.as_bytes().get(ancestor.len()) == Some(&b'/'))
}
