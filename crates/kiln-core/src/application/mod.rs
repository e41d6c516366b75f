//! Application layer for Kiln.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (AtomicWriter, MergeWriter, GenerationSession)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business logic itself. Path rules, chunk assembly and manifest merging
//! live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

pub use services::{
    AtomicWriter, GenerationOutcome, GenerationSession, MaterializeReport, MergeReport,
    MergeWriter, Promotion, SessionState,
};

pub use ports::{ContentSource, EventSource, Filesystem, FollowupResponder, Formatter};

pub use error::ApplicationError;
