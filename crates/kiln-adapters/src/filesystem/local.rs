//! Local filesystem adapter using std::fs.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use tracing::trace;
use walkdir::WalkDir;

use kiln_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{KilnError, KilnResult},
};

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn absolutize(&self, path: &Path) -> KilnResult<PathBuf> {
        std::path::absolute(path).map_err(|e| map_io_error(path, e, "resolve path"))
    }

    /// True for anything at `path`, dangling symlinks included.
    fn exists(&self, path: &Path) -> bool {
        std::fs::symlink_metadata(path).is_ok()
    }

    fn create_dir_all(&self, path: &Path) -> KilnResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn create_staging_dir(&self, parent: &Path, prefix: &str) -> KilnResult<PathBuf> {
        let dir = Builder::new()
            .prefix(prefix)
            .tempdir_in(parent)
            .map_err(|e| map_io_error(parent, e, "create staging directory"))?;
        // Ownership passes to the caller's staging guard.
        Ok(dir.keep())
    }

    fn write_file(&self, path: &Path, content: &str) -> KilnResult<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));

        let mut tmp = temp_file_for(path, parent)?;
        tmp.write_all(content.as_bytes())
            .and_then(|()| tmp.flush())
            .map_err(|e| map_io_error(path, e, "write file"))?;
        tmp.persist(path)
            .map_err(|e| map_io_error(path, e.error, "replace file"))?;

        trace!(path = %path.display(), bytes = content.len(), "File written");
        Ok(())
    }

    fn read_file(&self, path: &Path) -> KilnResult<String> {
        std::fs::read_to_string(path).map_err(|e| map_io_error(path, e, "read file"))
    }

    fn rename(&self, from: &Path, to: &Path) -> KilnResult<()> {
        std::fs::rename(from, to).map_err(|e| map_io_error(to, e, "rename"))
    }

    fn copy_dir_all(&self, from: &Path, to: &Path) -> KilnResult<()> {
        for entry in WalkDir::new(from) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(from).to_path_buf();
                map_io_error(&path, e.into(), "walk directory")
            })?;

            let rel = entry.path().strip_prefix(from).map_err(|e| KilnError::Internal {
                message: format!("walked outside copy root: {e}"),
            })?;
            let dest = to.join(rel);

            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest).map_err(|e| map_io_error(&dest, e, "create directory"))?;
            } else {
                std::fs::copy(entry.path(), &dest).map_err(|e| map_io_error(&dest, e, "copy file"))?;
            }
        }
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> KilnResult<()> {
        std::fs::remove_dir_all(path).map_err(|e| map_io_error(path, e, "remove directory"))
    }
}

/// Temp file beside `path` that will carry the destination's permissions.
///
/// New files get `0644` (less the umask), as `std::fs::write` would give
/// them. Replacing a file keeps its existing mode.
fn temp_file_for(path: &Path, parent: &Path) -> KilnResult<NamedTempFile> {
    let existing = std::fs::metadata(path).ok().map(|m| m.permissions());

    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(DEFAULT_FILE_MODE));
    }

    let tmp = builder
        .tempfile_in(parent)
        .map_err(|e| map_io_error(path, e, "create temp file"))?;

    #[cfg(unix)]
    if let Some(permissions) = existing {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|e| map_io_error(path, e, "copy permissions"))?;
    }
    #[cfg(not(unix))]
    let _ = existing;

    Ok(tmp)
}

#[cfg(unix)]
const DEFAULT_FILE_MODE: u32 = 0o644;

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> KilnError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {operation}: {e}"),
    }
    .into()
}
