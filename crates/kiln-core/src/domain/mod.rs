// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Kiln.
//!
//! Pure logic only: path sanitizing, wire-event normalization, chunk
//! assembly and manifest merging. Nothing in here performs I/O; the
//! application layer drives the filesystem through ports.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **Small dependency surface**: std, serde/serde_json, uuid, thiserror
//!
// Public API - what the world sees
pub mod assembler;
pub mod cancel;
pub mod entities;
pub mod error;
pub mod path;

// Re-exports for convenience
pub use assembler::FileAssembler;
pub use cancel::CancellationToken;
pub use entities::{
    BINARY_ASSET_MARKER, CheckedFile, FileBatch, FileEntry, Followup, GenerationBatch,
    MANIFEST_FILE, PLACEHOLDER_VERSION, PackageManifest, StreamEvent, WireEvent,
    assign_missing_ids, stable_question_id,
};
pub use error::{DomainError, ErrorCategory};
pub use path::{RelativePath, sanitize};

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Stream → assembler → batch, end to end without I/O
    // ========================================================================

    #[test]
    fn streamed_lines_assemble_into_a_safe_batch() {
        let lines = [
            r#"{"event":"file_chunk","payload":{"path":"src/index.ts","chunk":"export "}}"#,
            r#"{"event":"file_start","payload":{"path":"README.md"}}"#,
            r#"{"event":"file_chunk","payload":{"path":"src/index.ts","chunk":"{}"}}"#,
            r##"{"event":"file_chunk","payload":{"path":"README.md","chunk":"# demo"}}"##,
            r#"{"event":"file_complete","payload":{"path":"README.md"}}"#,
            r#"{"event":"file_complete","payload":{"path":"src/index.ts"}}"#,
            r#"{"event":"done"}"#,
        ];

        let mut assembler = FileAssembler::new();
        let entries: Vec<FileEntry> = lines
            .iter()
            .map(|l| StreamEvent::from_json_line(l).unwrap())
            .filter_map(|e| assembler.apply(&e))
            .collect();

        let batch = FileBatch::from_entries(entries).unwrap();
        let paths: Vec<_> = batch.writable().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "src/index.ts"]);
        assert_eq!(batch.writable().nth(1).unwrap().content, "export {}");
    }

    #[test]
    fn streamed_traversal_is_caught_by_the_batch() {
        let mut assembler = FileAssembler::new();
        assembler.chunk("../../.bashrc", "evil");
        let entry = assembler.complete("../../.bashrc").unwrap();

        assert!(matches!(
            FileBatch::from_entries([entry]),
            Err(DomainError::PathTraversal { .. })
        ));
    }
}
