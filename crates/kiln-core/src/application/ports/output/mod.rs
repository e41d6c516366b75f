//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `kiln-adapters` crate provides implementations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::{Followup, StreamEvent};
use crate::error::KilnResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `kiln_adapters::filesystem::LocalFilesystem` (production)
/// - `kiln_adapters::filesystem::MemoryFilesystem` (testing, fault injection)
///
/// ## Design Notes
///
/// - Paths handed to the port are already sanitized and absolute.
/// - `write_file` must never leave a truncated file under `path`: it writes a
///   sibling temporary file and renames it into place.
/// - `rename` must be atomic when source and destination share a parent.
pub trait Filesystem: Send + Sync {
    /// Resolve `path` against the current directory if it is relative.
    fn absolutize(&self, path: &Path) -> KilnResult<PathBuf>;

    /// Check if anything occupies path, including a dangling symlink.
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> KilnResult<()>;

    /// Create a fresh, uniquely named directory inside `parent`.
    fn create_staging_dir(&self, parent: &Path, prefix: &str) -> KilnResult<PathBuf>;

    /// Write content to a file through a temporary sibling and a rename.
    fn write_file(&self, path: &Path, content: &str) -> KilnResult<()>;

    /// Read a whole file as UTF-8.
    fn read_file(&self, path: &Path) -> KilnResult<String>;

    /// Rename a file or directory.
    fn rename(&self, from: &Path, to: &Path) -> KilnResult<()>;

    /// Recursively copy the contents of `from` into `to` (created if needed).
    fn copy_dir_all(&self, from: &Path, to: &Path) -> KilnResult<()>;

    /// Remove a directory and all contents.
    fn remove_dir_all(&self, path: &Path) -> KilnResult<()>;
}

/// Port for the optional formatter hook.
///
/// Best-effort: `None` means "keep the original content", whether the tool
/// is missing, the file type is unknown, or formatting failed.
pub trait Formatter: Send + Sync {
    fn format(&self, path: &str, content: &str) -> Option<String>;
}

/// Formatter that never changes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    fn format(&self, _path: &str, _content: &str) -> Option<String> {
        None
    }
}

/// One open generation stream.
pub trait EventSource {
    /// Next event, `Ok(None)` at end of input, `Err` on a transport failure.
    fn next_event(&mut self) -> KilnResult<Option<StreamEvent>>;
}

/// Something that can (re)open a generation stream for a set of answers.
pub trait ContentSource {
    fn open(&mut self, answers: &BTreeMap<String, String>) -> KilnResult<Box<dyn EventSource + '_>>;
}

/// Answers followup questions, usually by prompting a human.
pub trait FollowupResponder {
    fn answer(&mut self, followups: &[Followup]) -> KilnResult<BTreeMap<String, String>>;
}

impl<R: FollowupResponder + ?Sized> FollowupResponder for Box<R> {
    fn answer(&mut self, followups: &[Followup]) -> KilnResult<BTreeMap<String, String>> {
        (**self).answer(followups)
    }
}
