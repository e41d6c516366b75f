//! Generation stream adapters.

mod ndjson;

pub use ndjson::{NdjsonEventSource, NdjsonReplaySource, STDIN_MARKER};
