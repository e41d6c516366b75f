//! Atomic Directory Writer - create-mode materialization.
//!
//! The writer never builds the project in place. Every file is written into a
//! staging directory that sits next to the target (same parent, so the same
//! filesystem), and the staging directory is then renamed onto the target
//! name in one step:
//!
//! ```text
//!   parent/
//!   ├── .tmp-my-app-Xq81zP/     ← staging, private to this operation
//!   │   ├── src/index.ts
//!   │   └── README.md
//!   └── my-app/                 ← appears only after the rename
//! ```
//!
//! Observers therefore see either no target at all or the complete batch.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::{
    application::{ApplicationError, ports::Filesystem},
    domain::{CancellationToken, FileBatch, FileEntry},
    error::{KilnError, KilnResult},
};

/// How the staging area reached its final name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// Single atomic rename.
    Renamed,
    /// Rename failed; contents were copied and the staging area removed.
    Copied,
}

/// What a successful `materialize` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeReport {
    pub target: PathBuf,
    pub written: Vec<String>,
    pub skipped_binary: Vec<String>,
    pub promotion: Promotion,
}

/// Create-mode writer: all-or-nothing, self-cleaning.
pub struct AtomicWriter {
    filesystem: Box<dyn Filesystem>,
    cancel: CancellationToken,
}

impl AtomicWriter {
    /// Create a new writer over the given filesystem adapter.
    pub fn new(filesystem: Box<dyn Filesystem>) -> Self {
        Self {
            filesystem,
            cancel: CancellationToken::new(),
        }
    }

    /// Share a cancellation token with the caller.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Materialize `entries` as a brand-new directory at `target`.
    ///
    /// Fails with `TargetExists` without touching anything when the target is
    /// already present, and with `PathTraversal` before any staging happens
    /// when an entry path is unsafe. Any later failure removes the staging
    /// area and leaves the target absent.
    #[instrument(skip_all, fields(target = %target.as_ref().display()))]
    pub fn materialize(
        &self,
        target: impl AsRef<Path>,
        entries: impl IntoIterator<Item = FileEntry>,
    ) -> KilnResult<MaterializeReport> {
        let fs = self.filesystem.as_ref();
        let target = fs.absolutize(target.as_ref())?;

        if fs.exists(&target) {
            return Err(ApplicationError::TargetExists { path: target }.into());
        }

        let batch = FileBatch::from_entries(entries)?;
        let (parent, name) = split_target(&target)?;

        let staging = StagingArea::create(fs, parent, &format!(".tmp-{name}-"))?;
        debug!(staging = %staging.path().display(), files = batch.len(), "Staging area created");

        let mut written = Vec::with_capacity(batch.len());
        for file in batch.writable() {
            if self.cancel.is_cancelled() {
                warn!("Cancelled while staging, discarding staging area");
                return Err(ApplicationError::Cancelled.into());
            }

            let dest = file.path.resolve_under(staging.path());
            write_one(fs, &dest, &file.content).map_err(|e| ApplicationError::WriteFailed {
                path: file.path.to_string(),
                reason: e.to_string(),
                written: Vec::new(),
            })?;
            written.push(file.path.to_string());
        }

        let skipped_binary: Vec<String> = batch.binary_placeholders().map(|p| p.to_string()).collect();
        if !skipped_binary.is_empty() {
            debug!(count = skipped_binary.len(), "Skipped binary placeholders");
        }

        // Last chance to back out; promotion is not interruptible.
        if self.cancel.is_cancelled() {
            warn!("Cancelled before promotion, discarding staging area");
            return Err(ApplicationError::Cancelled.into());
        }

        let promotion = staging.promote(&target)?;
        info!(files = written.len(), ?promotion, "Project materialized");

        Ok(MaterializeReport {
            target,
            written,
            skipped_binary,
            promotion,
        })
    }
}

/// Write one file, creating its parent directories first.
pub(crate) fn write_one(fs: &dyn Filesystem, dest: &Path, content: &str) -> KilnResult<()> {
    if let Some(parent) = dest.parent() {
        fs.create_dir_all(parent)?;
    }
    fs.write_file(dest, content)
}

fn split_target(target: &Path) -> KilnResult<(&Path, String)> {
    let parent = target.parent();
    let name = target.file_name().map(|n| n.to_string_lossy().into_owned());
    match (parent, name) {
        (Some(parent), Some(name)) => Ok((parent, name)),
        _ => Err(ApplicationError::FilesystemError {
            path: target.to_path_buf(),
            reason: "target must name a directory below an existing parent".into(),
        }
        .into()),
    }
}

// -----------------------------------------------------------------------------
// Staging area
// -----------------------------------------------------------------------------

/// An exclusively owned staging directory.
///
/// Removed on drop unless it was promoted, so every early return, `?` and
/// panic between creation and promotion cleans up after itself.
struct StagingArea<'a> {
    fs: &'a dyn Filesystem,
    path: PathBuf,
    armed: bool,
}

impl<'a> StagingArea<'a> {
    fn create(fs: &'a dyn Filesystem, parent: &Path, prefix: &str) -> KilnResult<Self> {
        let path = fs.create_staging_dir(parent, prefix)?;
        Ok(Self {
            fs,
            path,
            armed: true,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Move the staged tree onto `target`.
    ///
    /// Tries an atomic rename first, then a recursive copy. If both fail, a
    /// partially copied target is removed before the error is returned.
    fn promote(mut self, target: &Path) -> KilnResult<Promotion> {
        let rename_err = match self.fs.rename(&self.path, target) {
            Ok(()) => {
                self.armed = false;
                return Ok(Promotion::Renamed);
            }
            Err(e) => e,
        };

        warn!(error = %rename_err, "Atomic rename failed, falling back to copy");

        if let Err(copy_err) = self.fs.copy_dir_all(&self.path, target) {
            if self.fs.exists(target) {
                if let Err(e) = self.fs.remove_dir_all(target) {
                    warn!(error = %e, path = %target.display(), "Could not remove partial target");
                }
            }
            return Err(promotion_failed(target, &rename_err, &copy_err));
        }

        self.armed = false;
        if let Err(e) = self.fs.remove_dir_all(&self.path) {
            warn!(error = %e, path = %self.path.display(), "Could not remove staging area after copy");
        }
        Ok(Promotion::Copied)
    }
}

impl Drop for StagingArea<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.fs.remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Staging area removed"),
            Err(e) => warn!(error = %e, path = %self.path.display(), "Staging cleanup failed"),
        }
    }
}

fn promotion_failed(target: &Path, rename_err: &KilnError, copy_err: &KilnError) -> KilnError {
    ApplicationError::PromotionFailed {
        target: target.to_path_buf(),
        reason: format!("rename: {rename_err}; copy: {copy_err}"),
    }
    .into()
}
