//! Merge Writer - layering generated files onto an existing project.
//!
//! Unlike create mode this is not atomic across the batch: files land one by
//! one (each through its own temp-and-rename), and a failure part way through
//! reports which paths were already written.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::atomic_writer::write_one;
use crate::{
    application::{ApplicationError, ports::Filesystem},
    domain::{FileBatch, FileEntry, MANIFEST_FILE, PLACEHOLDER_VERSION, PackageManifest, sanitize},
    error::KilnResult,
};

/// What a successful `merge_into` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub target: PathBuf,
    pub written: Vec<String>,
    pub skipped_binary: Vec<String>,
    /// Dependency names newly added to the manifest, in request order.
    pub added_dependencies: Vec<String>,
}

/// Merge-mode writer.
pub struct MergeWriter {
    filesystem: Box<dyn Filesystem>,
    manifest_path: String,
    placeholder_version: String,
}

impl MergeWriter {
    pub fn new(filesystem: Box<dyn Filesystem>) -> Self {
        Self {
            filesystem,
            manifest_path: MANIFEST_FILE.to_string(),
            placeholder_version: PLACEHOLDER_VERSION.to_string(),
        }
    }

    /// Manifest location relative to the target root.
    pub fn with_manifest_path(mut self, path: impl Into<String>) -> Self {
        self.manifest_path = path.into();
        self
    }

    /// Version string recorded for dependencies the manifest lacks.
    pub fn with_placeholder_version(mut self, version: impl Into<String>) -> Self {
        self.placeholder_version = version.into();
        self
    }

    /// Write `entries` under `target`, overwriting same-named files, then add
    /// any missing `new_dependencies` to the manifest.
    ///
    /// Every path is validated before the first write, so a traversal attempt
    /// leaves the target untouched. Existing manifest entries keep their
    /// version.
    #[instrument(skip_all, fields(target = %target.as_ref().display(), deps = new_dependencies.len()))]
    pub fn merge_into(
        &self,
        target: impl AsRef<Path>,
        entries: impl IntoIterator<Item = FileEntry>,
        new_dependencies: &[String],
    ) -> KilnResult<MergeReport> {
        let fs = self.filesystem.as_ref();
        let target = fs.absolutize(target.as_ref())?;

        let batch = FileBatch::from_entries(entries)?;
        let manifest_rel = sanitize(&self.manifest_path)?;

        fs.create_dir_all(&target)?;

        let mut written: Vec<String> = Vec::with_capacity(batch.len());
        for file in batch.writable() {
            let dest = file.path.resolve_under(&target);
            if let Err(e) = write_one(fs, &dest, &file.content) {
                warn!(path = %file.path, written = written.len(), "Merge stopped part way");
                return Err(ApplicationError::WriteFailed {
                    path: file.path.to_string(),
                    reason: e.to_string(),
                    written,
                }
                .into());
            }
            debug!(path = %file.path, "Merged file");
            written.push(file.path.to_string());
        }

        let skipped_binary: Vec<String> = batch.binary_placeholders().map(|p| p.to_string()).collect();

        let mut added_dependencies = Vec::new();
        if !new_dependencies.is_empty() {
            let manifest_path = manifest_rel.resolve_under(&target);
            if !fs.exists(&manifest_path) {
                return Err(ApplicationError::ManifestMissing {
                    path: manifest_path,
                    written,
                }
                .into());
            }

            let raw = match fs.read_file(&manifest_path) {
                Ok(raw) => raw,
                Err(e) => return Err(manifest_invalid(manifest_path, e.to_string(), written)),
            };
            let mut manifest = match PackageManifest::parse(&raw) {
                Ok(m) => m,
                Err(e) => return Err(manifest_invalid(manifest_path, e.to_string(), written)),
            };

            added_dependencies = manifest.merge_dependencies(new_dependencies, &self.placeholder_version);
            if added_dependencies.is_empty() {
                debug!("All requested dependencies already present");
            } else {
                if let Err(e) = fs.write_file(&manifest_path, &manifest.to_pretty_string()) {
                    return Err(ApplicationError::WriteFailed {
                        path: manifest_rel.to_string(),
                        reason: e.to_string(),
                        written,
                    }
                    .into());
                }
                if !written.iter().any(|p| p == manifest_rel.as_str()) {
                    written.push(manifest_rel.to_string());
                }
            }
        }

        info!(
            files = written.len(),
            added = added_dependencies.len(),
            "Merge complete"
        );

        Ok(MergeReport {
            target,
            written,
            skipped_binary,
            added_dependencies,
        })
    }
}

fn manifest_invalid(path: PathBuf, reason: String, written: Vec<String>) -> crate::error::KilnError {
    ApplicationError::ManifestInvalid {
        path,
        reason,
        written,
    }
    .into()
}
