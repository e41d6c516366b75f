//! Subcommand handlers.
//!
//! Each handler takes its parsed arguments, the loaded [`AppConfig`] and an
//! [`OutputManager`], wires adapters into core services and reports.
//!
//! [`AppConfig`]: crate::config::AppConfig
//! [`OutputManager`]: crate::output::OutputManager

use std::fs;
use std::io::{self, Read};

use serde::Deserialize;
use tracing::{debug, warn};

use kiln_adapters::stream::STDIN_MARKER;
use kiln_core::domain::{CancellationToken, FileEntry, GenerationBatch};

use crate::error::{CliError, CliResult, IntoCli};

pub mod collect;
pub mod completions;
pub mod config;
pub mod init;
pub mod materialize;
pub mod merge;
pub mod stream;

/// Exit status after a second Ctrl-C, as a shell reports SIGINT.
const INTERRUPTED_EXIT: i32 = 130;

/// Token cancelled by Ctrl-C, for writers about to touch the disk.
///
/// The first interrupt cancels the token so the writer can drop its staging
/// area. A second one exits at once.
pub(crate) fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let handle = token.clone();
    match ctrlc::set_handler(move || {
        if !on_interrupt(&handle) {
            std::process::exit(INTERRUPTED_EXIT);
        }
    }) {
        Ok(()) => debug!("Interrupt handler installed"),
        Err(e) => warn!(error = %e, "Ctrl-C will not clean up staged files"),
    }
    token
}

/// Cancel `token`; false when it was already cancelled.
fn on_interrupt(token: &CancellationToken) -> bool {
    if token.is_cancelled() {
        return false;
    }
    warn!("Interrupted; discarding staged files");
    token.cancel();
    true
}

/// A batch file: either a full generation response or a bare file list.
#[derive(Deserialize)]
#[serde(untagged)]
enum BatchInput {
    Batch(GenerationBatch),
    Files(Vec<FileEntry>),
}

/// Read a batch from `from`, a path or `-` for stdin.
pub(crate) fn read_batch(from: &str) -> CliResult<GenerationBatch> {
    let raw = if from == STDIN_MARKER {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .with_cli_context(|| "Failed to read batch from stdin")?;
        buf
    } else {
        fs::read_to_string(from).with_cli_context(|| format!("Failed to read batch file '{from}'"))?
    };
    parse_batch(&raw, from)
}

fn parse_batch(raw: &str, origin: &str) -> CliResult<GenerationBatch> {
    let input: BatchInput = serde_json::from_str(raw).map_err(|e| CliError::InvalidInput {
        message: format!("'{origin}' is not a valid batch: {e}"),
        source: Some(Box::new(e)),
    })?;

    Ok(match input {
        BatchInput::Batch(batch) => batch,
        BatchInput::Files(files) => GenerationBatch {
            files,
            ..GenerationBatch::default()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_full_response() {
        let batch = parse_batch(
            r#"{"project_name":"demo","files":[{"path":"a.ts","content":"x"}],"metadata":{"warnings":["w"]}}"#,
            "t",
        )
        .unwrap();
        assert_eq!(batch.project_name.as_deref(), Some("demo"));
        assert_eq!(batch.files.len(), 1);
        assert_eq!(batch.warnings(), vec!["w"]);
    }

    #[test]
    fn accepts_a_bare_file_list() {
        let batch = parse_batch(r#"[{"path":"a.ts","content":"x"}]"#, "t").unwrap();
        assert_eq!(batch.files, vec![FileEntry::new("a.ts", "x")]);
    }

    #[test]
    fn first_interrupt_cancels_second_exits() {
        let token = CancellationToken::new();
        assert!(on_interrupt(&token));
        assert!(token.is_cancelled());
        assert!(!on_interrupt(&token));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_batch("not json", "t"),
            Err(CliError::InvalidInput { .. })
        ));
    }
}
