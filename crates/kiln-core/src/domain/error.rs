// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (for retry logic)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    /// An untrusted path escapes the root it is supposed to live under.
    #[error("Path traversal rejected for '{path}': {reason}")]
    PathTraversal { path: String, reason: &'static str },

    #[error("Invalid stream event '{kind}': {reason}")]
    InvalidEvent { kind: String, reason: String },

    // ========================================================================
    // Manifest Errors
    // ========================================================================
    #[error("Manifest is not valid JSON: {reason}")]
    ManifestParse { reason: String },

    #[error("Manifest field '{field}' has the wrong shape: expected {expected}")]
    ManifestShape {
        field: &'static str,
        expected: &'static str,
    },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::PathTraversal { path, .. } => vec![
                format!("The generator produced an unsafe path: {path}"),
                "Generated paths must be relative and stay inside the project".into(),
                "Nothing was written to the target directory".into(),
            ],
            Self::InvalidEvent { kind, .. } => vec![
                format!("The upstream stream sent a malformed '{kind}' event"),
                "Retry the generation; if it persists, report the generator output".into(),
            ],
            Self::ManifestParse { .. } | Self::ManifestShape { .. } => vec![
                "Check that package.json is a valid JSON object".into(),
                "The 'dependencies' field, if present, must be an object".into(),
            ],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PathTraversal { .. } => ErrorCategory::Validation,
            Self::InvalidEvent { .. } => ErrorCategory::Validation,
            Self::ManifestParse { .. } | Self::ManifestShape { .. } => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Internal,
}
