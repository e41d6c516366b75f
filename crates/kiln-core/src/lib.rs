//! Kiln Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for Kiln, the
//! safe materializer for generated project trees, following hexagonal
//! (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             kiln-cli (CLI)              │
//! │       (Implements Driving Ports)        │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │          Application Services           │
//! │ (GenerationSession, Atomic/MergeWriter) │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │       Application Ports (Traits)        │
//! │ (Filesystem, ContentSource, Formatter)  │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     kiln-adapters (Infrastructure)      │
//! │ (LocalFilesystem, NdjsonEventSource...) │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │        Domain Layer (Pure Logic)        │
//! │ (sanitize, FileAssembler, PackageManifest)
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kiln_core::prelude::*;
//!
//! # fn demo(filesystem: Box<dyn Filesystem>) -> KilnResult<()> {
//! let writer = AtomicWriter::new(filesystem);
//! let report = writer.materialize(
//!     "./my-app",
//!     vec![FileEntry::new("src/index.ts", "export {};\n")],
//! )?;
//! println!("wrote {} file(s)", report.written.len());
//! # Ok(())
//! # }
//! ```

pub mod domain;

pub mod application;

pub mod error;

/// Public API - what external crates should use.
pub mod prelude {
    pub use crate::application::{
        AtomicWriter, GenerationOutcome, GenerationSession, MaterializeReport, MergeReport,
        MergeWriter, Promotion, SessionState,
        ports::{
            ContentSource, EventSource, Filesystem, FollowupResponder, Formatter, NoopFormatter,
        },
    };
    pub use crate::domain::{
        BINARY_ASSET_MARKER, CancellationToken, FileAssembler, FileEntry, Followup,
        GenerationBatch, MANIFEST_FILE, PLACEHOLDER_VERSION, PackageManifest, RelativePath,
        StreamEvent, sanitize,
    };
    pub use crate::error::{ErrorCategory, KilnError, KilnResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
