//! Incremental file assembler.
//!
//! Rebuilds whole files from the `start` / `chunk` / `complete` events of a
//! single streaming attempt. The assembler is pure bookkeeping: it never
//! touches the filesystem and it is thrown away whenever the attempt ends.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::entities::{FileEntry, StreamEvent};

/// Per-path accumulation buffers for one streaming attempt.
#[derive(Debug, Default)]
pub struct FileAssembler {
    buffers: HashMap<String, String>,
}

impl FileAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or reset) the buffer for `path`.
    pub fn start(&mut self, path: &str) {
        if self.buffers.insert(path.to_string(), String::new()).is_some() {
            debug!(path, "duplicate file_start, buffer reset");
        }
    }

    /// Append `text` to the buffer for `path`, opening it if needed.
    ///
    /// A chunk may overtake its `start` across the network, so a missing
    /// buffer is created rather than treated as an error.
    pub fn chunk(&mut self, path: &str, text: &str) {
        match self.buffers.get_mut(path) {
            Some(buffer) => buffer.push_str(text),
            None => {
                trace!(path, "chunk before start, opening buffer implicitly");
                self.buffers.insert(path.to_string(), text.to_string());
            }
        }
    }

    /// Finalize the buffer for `path` into a [`FileEntry`].
    ///
    /// Returns `None` when nothing was ever received for `path`.
    pub fn complete(&mut self, path: &str) -> Option<FileEntry> {
        match self.buffers.remove(path) {
            Some(content) => Some(FileEntry::new(path, content)),
            None => {
                debug!(path, "file_complete without any content, skipped");
                None
            }
        }
    }

    /// Route a stream event; only file events are of interest here.
    pub fn apply(&mut self, event: &StreamEvent) -> Option<FileEntry> {
        match event {
            StreamEvent::FileStart { path } => {
                self.start(path);
                None
            }
            StreamEvent::FileChunk { path, chunk } => {
                self.chunk(path, chunk);
                None
            }
            StreamEvent::FileComplete { path } => self.complete(path),
            _ => None,
        }
    }

    /// Paths with an open buffer.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.buffers.keys().map(String::as_str)
    }

    /// End the session, dropping every buffer that never completed.
    ///
    /// Returns the abandoned paths (sorted) so callers can log them.
    pub fn finish(self) -> Vec<String> {
        let mut abandoned: Vec<String> = self.buffers.into_keys().collect();
        abandoned.sort();
        abandoned
    }
}
