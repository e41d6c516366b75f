//! Application layer errors.
//!
//! These errors represent failures in orchestration, not business logic.
//! Business logic errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur while materializing or merging a project.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// Low-level filesystem failure reported by a `Filesystem` adapter.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// The create-mode target already exists; nothing was written.
    #[error("Target directory already exists: {path}")]
    TargetExists { path: PathBuf },

    /// Writing a file failed.
    ///
    /// `written` lists paths that were already written and left in place.
    /// It is always empty for create mode, which cleans up after itself.
    #[error("Failed to write '{path}': {reason}")]
    WriteFailed {
        path: String,
        reason: String,
        written: Vec<String>,
    },

    /// Neither the atomic rename nor the fallback copy could promote the
    /// staging area.
    #[error("Failed to promote staging area into {target}: {reason}")]
    PromotionFailed { target: PathBuf, reason: String },

    /// Dependencies were requested but the project has no manifest.
    #[error("Manifest not found at {path}")]
    ManifestMissing { path: PathBuf, written: Vec<String> },

    /// The manifest exists but cannot be parsed or has the wrong shape.
    #[error("Manifest at {path} is invalid: {reason}")]
    ManifestInvalid {
        path: PathBuf,
        reason: String,
        written: Vec<String>,
    },

    /// The caller cancelled before promotion; the staging area was removed.
    #[error("Operation cancelled before promotion")]
    Cancelled,

    /// The upstream stream broke and retries were exhausted.
    #[error("Generation stream failed after {attempts} attempt(s): {reason}")]
    StreamFailed { attempts: u32, reason: String },

    /// The generation service reported an error event.
    #[error("Generator reported an error: {message}")]
    Upstream { message: String },

    /// The service kept asking followups.
    #[error("Maximum followup rounds reached ({max_rounds})")]
    FollowupRoundsExceeded { max_rounds: u32 },

    /// A round finished with neither files nor followups.
    #[error("Generator returned no files and no followups")]
    NoFiles,

    /// Followups were asked but could not be answered.
    #[error("Followups could not be answered: {reason}")]
    FollowupsUnanswered { reason: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
                "Ensure the parent directory exists".into(),
            ],
            Self::TargetExists { path } => vec![
                format!("Directory already exists: {}", path.display()),
                "Choose a different target directory".into(),
                "Use merge mode to layer files onto an existing project".into(),
            ],
            Self::WriteFailed { written, .. } if written.is_empty() => vec![
                "No files were left behind; the target directory was not created".into(),
                "Check free disk space and permissions on the parent directory".into(),
            ],
            Self::WriteFailed { written, .. } => vec![
                format!(
                    "The target is now in a mixed state: {} file(s) were already written",
                    written.len()
                ),
                "Inspect the target directory before retrying".into(),
            ],
            Self::PromotionFailed { target, .. } => vec![
                format!("{} was not created", target.display()),
                "Check that the parent directory is writable".into(),
            ],
            Self::ManifestMissing { path, .. } => vec![
                format!("Expected a manifest at {}", path.display()),
                "Run the base scaffolder first, or drop the dependency list".into(),
            ],
            Self::ManifestInvalid { path, .. } => vec![
                format!("Fix the JSON in {}", path.display()),
                "Generated files were written; only the dependency merge was skipped".into(),
            ],
            Self::Cancelled => vec![
                "Operation was cancelled".into(),
                "No changes were made".into(),
            ],
            Self::StreamFailed { .. } => vec![
                "The connection to the generator dropped repeatedly".into(),
                "Try again in a moment".into(),
            ],
            Self::FollowupRoundsExceeded { .. } => vec![
                "The generator kept asking clarifying questions".into(),
                "Give a more detailed description and try again".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TargetExists { .. } => ErrorCategory::Conflict,
            Self::ManifestMissing { .. } => ErrorCategory::NotFound,
            Self::ManifestInvalid { .. } => ErrorCategory::Validation,
            Self::Cancelled => ErrorCategory::Validation,
            Self::FollowupsUnanswered { .. } => ErrorCategory::Validation,
            Self::FilesystemError { .. }
            | Self::WriteFailed { .. }
            | Self::PromotionFailed { .. } => ErrorCategory::Internal,
            Self::StreamFailed { .. }
            | Self::Upstream { .. }
            | Self::FollowupRoundsExceeded { .. }
            | Self::NoFiles => ErrorCategory::Upstream,
        }
    }

    /// Paths written before a merge-mode failure.
    pub fn written_paths(&self) -> &[String] {
        match self {
            Self::WriteFailed { written, .. }
            | Self::ManifestMissing { written, .. }
            | Self::ManifestInvalid { written, .. } => written,
            _ => &[],
        }
    }
}
