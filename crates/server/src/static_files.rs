//! Mapping request paths onto the static bundle directory.

use std::path::{Path, PathBuf};

use crate::http::percent_decode;

/// Outcome of resolving a request path under the bundle root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// An existing regular file.
    File(PathBuf),
    /// Nothing servable at this path; the caller falls back to the entry document.
    NotFound,
    /// The path tried to climb out of the root.
    Forbidden,
    /// Bad percent-encoding or an embedded NUL.
    BadRequest,
}

/// Resolve a request path (query string already stripped).
///
/// Directories resolve to their `index_file`. Any `..` segment is forbidden.
/// Dotfile segments are never served.
pub fn resolve(root: &Path, request_path: &str, index_file: &str) -> Resolved {
    let decoded = match percent_decode(request_path) {
        Some(d) => d,
        None => return Resolved::BadRequest,
    };
    if decoded.contains('\0') {
        return Resolved::BadRequest;
    }

    let mut path = root.to_path_buf();
    for segment in decoded.split(|c: char| c == '/' || c == '\\') {
        match segment {
            "" | "." => continue,
            ".." => return Resolved::Forbidden,
            s if s.starts_with('.') => return Resolved::NotFound,
            s => path.push(s),
        }
    }

    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_file() => Resolved::File(path),
        Ok(meta) if meta.is_dir() => {
            let index = path.join(index_file);
            if index.is_file() {
                Resolved::File(index)
            } else {
                Resolved::NotFound
            }
        }
        _ => Resolved::NotFound,
    }
}
