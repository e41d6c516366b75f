//! Infrastructure adapters for Kiln.
//!
//! This crate implements the ports defined in `kiln-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod cache;
pub mod collector;
pub mod filesystem;
pub mod formatter;
pub mod stream;

// Re-export commonly used adapters
pub use cache::{CachedResponder, JsonAnswerCache};
pub use collector::ScaffoldCollector;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use formatter::{CommandFormatter, FormatterRule};
pub use stream::{NdjsonEventSource, NdjsonReplaySource};
