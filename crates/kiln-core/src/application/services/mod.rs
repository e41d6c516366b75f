//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish the three
//! high-level use cases: run a generation session, materialize a fresh
//! project, and merge files into an existing one.

pub mod atomic_writer;
pub mod merge_writer;
pub mod session;

pub use atomic_writer::{AtomicWriter, MaterializeReport, Promotion};
pub use merge_writer::{MergeReport, MergeWriter};
pub use session::{
    DEFAULT_MAX_RETRIES, DEFAULT_MAX_ROUNDS, GenerationOutcome, GenerationSession, SessionState,
};
