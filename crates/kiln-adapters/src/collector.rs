//! Scaffold collector.
//!
//! Walks an existing project tree (typically fresh output of a base
//! scaffolder) and turns it into [`FileEntry`] values that can be fed back
//! to a generator as context. Binary assets become placeholders so their
//! bytes never travel as text.

use std::path::Path;

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use kiln_core::{
    application::ApplicationError,
    domain::{FileEntry, MANIFEST_FILE},
    error::KilnResult,
};

const SKIP_DIRS: &[&str] = &["node_modules", ".git"];
const SKIP_FILES: &[&str] = &[MANIFEST_FILE, "package-lock.json", "yarn.lock", "pnpm-lock.yaml"];
const BINARY_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "avif"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ScaffoldCollector;

impl ScaffoldCollector {
    pub fn new() -> Self {
        Self
    }

    /// Collect every relevant file under `root`, sorted by path.
    ///
    /// Unreadable entries are logged and skipped.
    pub fn collect(&self, root: &Path) -> KilnResult<Vec<FileEntry>> {
        if !root.is_dir() {
            return Err(ApplicationError::FilesystemError {
                path: root.to_path_buf(),
                reason: "not a directory".into(),
            }
            .into());
        }

        let mut entries = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if SKIP_FILES.iter().any(|s| *s == name) {
                continue;
            }

            let Some(rel) = relative_slash_path(root, entry.path()) else {
                continue;
            };

            if is_binary(entry.path()) {
                entries.push(FileEntry::binary_placeholder(rel));
                continue;
            }

            match std::fs::read(entry.path()) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => entries.push(FileEntry::new(rel, text)),
                    Err(_) => {
                        debug!(path = %rel, "Non-UTF-8 file collected as binary placeholder");
                        entries.push(FileEntry::binary_placeholder(rel));
                    }
                },
                Err(e) => warn!(path = %rel, error = %e, "Skipping unreadable file"),
            }
        }

        debug!(root = %root.display(), files = entries.len(), "Scaffold collected");
        Ok(entries)
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIP_DIRS.contains(&name))
}

fn is_binary(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| BINARY_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn collects_text_and_marks_assets() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/main.ts", b"main");
        touch(dir.path(), "public/Logo.PNG", b"\x89PNG");
        touch(dir.path(), "blob.bin", &[0xff, 0xfe, 0x00]);
        touch(dir.path(), "package.json", b"{}");
        touch(dir.path(), "yarn.lock", b"");
        touch(dir.path(), "node_modules/x/index.js", b"x");
        touch(dir.path(), ".git/HEAD", b"ref");

        let entries = ScaffoldCollector::new().collect(dir.path()).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();

        assert_eq!(paths, vec!["blob.bin", "public/Logo.PNG", "src/main.ts"]);
        assert!(entries[0].is_binary_placeholder());
        assert!(entries[1].is_binary_placeholder());
        assert_eq!(entries[2].content, "main");
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(ScaffoldCollector::new().collect(&dir.path().join("nope")).is_err());
    }
}
