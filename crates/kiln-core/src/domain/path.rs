//! Lexical path sanitizer.
//!
//! Every path that reaches a writer passes through [`sanitize`] first. The
//! check is purely lexical: it never touches the filesystem, so it cannot be
//! fooled by symlinks that do not exist yet and it behaves the same for the
//! in-memory and the local filesystem adapters.

use std::fmt;
use std::path::{Path, PathBuf};

use super::DomainError;

/// A slash-separated path guaranteed to stay under the root it is joined to.
///
/// Invariant: never empty, never absolute, contains no `.` or `..` segments.
/// The only way to build one is through [`sanitize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(String);

impl RelativePath {
    /// Borrow the normalized, slash-separated form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join this path under `root`, one component at a time.
    pub fn resolve_under(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        for segment in self.0.split('/') {
            out.push(segment);
        }
        out
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl AsRef<str> for RelativePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate and normalize an untrusted relative path.
///
/// Backslashes are treated as separators, repeated separators and `.`
/// segments collapse, and `..` segments pop the previous segment. Fails with
/// [`DomainError::PathTraversal`] when the input is empty, absolute, carries
/// a drive prefix, contains a NUL byte, or when a `..` would climb above the
/// root.
///
/// ```
/// use kiln_core::domain::sanitize;
///
/// assert_eq!(sanitize("a/b/../c").unwrap().as_str(), "a/c");
/// assert!(sanitize("../../etc/passwd").is_err());
/// ```
pub fn sanitize(raw: &str) -> Result<RelativePath, DomainError> {
    let reject = |reason: &'static str| DomainError::PathTraversal {
        path: raw.to_string(),
        reason,
    };

    if raw.trim().is_empty() {
        return Err(reject("path is empty"));
    }
    if raw.contains('\0') {
        return Err(reject("path contains a NUL byte"));
    }

    let unified = raw.replace('\\', "/");
    if unified.starts_with('/') || has_drive_prefix(&unified) {
        return Err(reject("absolute paths are not allowed"));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(reject("path escapes the project root"));
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(reject("path resolves to the project root"));
    }

    Ok(RelativePath(segments.join("/")))
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
