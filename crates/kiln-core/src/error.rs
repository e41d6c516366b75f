//! Unified error handling for Kiln Core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, with rich context and user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for Kiln Core operations.
///
/// This enum wraps all possible errors that can occur when using kiln-core,
/// providing a unified interface for error handling.
#[derive(Debug, Error, Clone)]
pub enum KilnError {
    /// Errors from the domain layer (unsafe paths, malformed payloads).
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (writes, promotion, streaming).
    #[error("{0}")]
    Application(#[from] ApplicationError),

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl KilnError {
    /// Short machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::PathTraversal { .. }) => "path-traversal",
            Self::Domain(DomainError::InvalidEvent { .. }) => "invalid-event",
            Self::Domain(DomainError::ManifestParse { .. } | DomainError::ManifestShape { .. }) => {
                "manifest-invalid"
            }
            Self::Application(e) => match e {
                ApplicationError::FilesystemError { .. } => "filesystem",
                ApplicationError::TargetExists { .. } => "target-exists",
                ApplicationError::WriteFailed { .. } => "write-failed",
                ApplicationError::PromotionFailed { .. } => "promotion-failed",
                ApplicationError::ManifestMissing { .. } => "manifest-missing",
                ApplicationError::ManifestInvalid { .. } => "manifest-invalid",
                ApplicationError::Cancelled => "cancelled",
                ApplicationError::StreamFailed { .. } => "stream-failed",
                ApplicationError::Upstream { .. } => "upstream",
                ApplicationError::FollowupRoundsExceeded { .. } => "followup-rounds-exceeded",
                ApplicationError::NoFiles => "no-files",
                ApplicationError::FollowupsUnanswered { .. } => "followups-unanswered",
            },
            Self::Internal { .. } => "internal",
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Internal { .. } => vec![
                "This appears to be a bug in Kiln".into(),
                "Please report this issue at: https://github.com/cosecruz/kiln/issues".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::Internal => ErrorCategory::Internal,
            },
            Self::Application(e) => e.category(),
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Application(
                ApplicationError::StreamFailed { .. } | ApplicationError::PromotionFailed { .. }
            )
        )
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Upstream,
    Internal,
}

/// Convenient result type alias.
pub type KilnResult<T> = Result<T, KilnError>;
