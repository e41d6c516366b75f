//! Newline-delimited JSON event streams.
//!
//! One `{"event": ..., "payload": ...}` object per line. Blank lines are
//! skipped; lines that are not valid events are logged and skipped so a
//! single garbled line does not sink a long generation.

use std::collections::BTreeMap;
use std::io::{BufRead, Cursor, Read};
use std::path::PathBuf;

use tracing::{debug, warn};

use kiln_core::{
    application::{
        ApplicationError,
        ports::{ContentSource, EventSource},
    },
    domain::StreamEvent,
    error::KilnResult,
};

/// Input name that reads the stream from standard input.
pub const STDIN_MARKER: &str = "-";

/// Parses events from any buffered reader.
pub struct NdjsonEventSource<R> {
    reader: R,
    line: String,
    line_no: usize,
}

impl<R: BufRead> NdjsonEventSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> EventSource for NdjsonEventSource<R> {
    fn next_event(&mut self) -> KilnResult<Option<StreamEvent>> {
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| ApplicationError::StreamFailed {
                    attempts: 1,
                    reason: format!("read error after line {}: {e}", self.line_no),
                })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }

            match StreamEvent::from_json_line(line) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => warn!(line = self.line_no, error = %e, "Skipping malformed stream line"),
            }
        }
    }
}

/// Replays recorded streams, one input per round.
///
/// Reopening with the same answers replays the same round (a retry);
/// reopening with different answers moves on to the next input. Inputs are
/// read once and kept in memory, so stdin can be replayed too.
pub struct NdjsonReplaySource {
    inputs: Vec<String>,
    loaded: Vec<Option<String>>,
    current: Option<usize>,
    last_answers: Option<BTreeMap<String, String>>,
}

impl NdjsonReplaySource {
    /// `inputs` are file paths, or [`STDIN_MARKER`] for standard input.
    pub fn new(inputs: Vec<String>) -> Self {
        let loaded = vec![None; inputs.len()];
        Self {
            inputs,
            loaded,
            current: None,
            last_answers: None,
        }
    }

    /// Replay in-memory transcripts (useful in tests).
    pub fn from_transcripts(transcripts: Vec<String>) -> Self {
        let inputs = (0..transcripts.len()).map(|i| format!("<transcript {i}>")).collect();
        Self {
            inputs,
            loaded: transcripts.into_iter().map(Some).collect(),
            current: None,
            last_answers: None,
        }
    }

    fn load(&mut self, index: usize) -> KilnResult<&str> {
        if self.loaded[index].is_none() {
            let name = &self.inputs[index];
            let text = if name == STDIN_MARKER {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|e| ApplicationError::FilesystemError {
                        path: PathBuf::from("<stdin>"),
                        reason: e.to_string(),
                    })?;
                buf
            } else {
                std::fs::read_to_string(name).map_err(|e| ApplicationError::FilesystemError {
                    path: PathBuf::from(name),
                    reason: e.to_string(),
                })?
            };
            self.loaded[index] = Some(text);
        }
        Ok(self.loaded[index].as_deref().unwrap_or_default())
    }
}

impl ContentSource for NdjsonReplaySource {
    fn open(&mut self, answers: &BTreeMap<String, String>) -> KilnResult<Box<dyn EventSource + '_>> {
        let index = match (self.current, &self.last_answers) {
            (Some(i), Some(last)) if last == answers => i,
            (Some(i), _) => i + 1,
            (None, _) => 0,
        };

        if index >= self.inputs.len() {
            return Err(ApplicationError::FollowupsUnanswered {
                reason: format!(
                    "the generator asked followups but no recorded stream exists for round {}",
                    index + 1
                ),
            }
            .into());
        }

        self.current = Some(index);
        self.last_answers = Some(answers.clone());
        debug!(round = index + 1, input = %self.inputs[index], "Replaying recorded stream");

        let text = self.load(index)?;
        Ok(Box::new(NdjsonEventSource::new(Cursor::new(text.as_bytes()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(source: &mut dyn EventSource) -> Vec<StreamEvent> {
        let mut out = Vec::new();
        while let Some(e) = source.next_event().unwrap() {
            out.push(e);
        }
        out
    }

    #[test]
    fn skips_blank_and_malformed_lines() {
        let text = concat!(
            "{\"event\":\"file_start\",\"payload\":{\"path\":\"a\"}}\n",
            "\n",
            "not json\n",
            "{\"event\":\"done\"}\n",
        );
        let mut source = NdjsonEventSource::new(Cursor::new(text));

        let events = drain(&mut source);

        assert_eq!(events, vec![StreamEvent::FileStart { path: "a".into() }, StreamEvent::Done]);
    }

    #[test]
    fn replay_advances_only_when_answers_change() {
        let mut replay = NdjsonReplaySource::from_transcripts(vec![
            "{\"event\":\"warning\",\"payload\":\"one\"}\n".into(),
            "{\"event\":\"warning\",\"payload\":\"two\"}\n".into(),
        ]);
        let mut answers = BTreeMap::new();

        let first = drain(replay.open(&answers).unwrap().as_mut());
        let retry = drain(replay.open(&answers).unwrap().as_mut());
        answers.insert("r1_q0_x".to_string(), "yes".to_string());
        let second = drain(replay.open(&answers).unwrap().as_mut());

        assert_eq!(first, vec![StreamEvent::Warning("one".into())]);
        assert_eq!(retry, first);
        assert_eq!(second, vec![StreamEvent::Warning("two".into())]);

        answers.insert("r2_q0_y".to_string(), "no".to_string());
        assert!(replay.open(&answers).is_err());
    }
}
