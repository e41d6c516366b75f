//! Stream events emitted by the generation service.
//!
//! On the wire every event is one NDJSON line shaped
//! `{"event": "<kind>", "payload": <any>}`. The payload shape depends on the
//! kind, so parsing goes through a loose [`WireEvent`] first and is then
//! normalized into the tagged [`StreamEvent`].

use serde::{Deserialize, Serialize};

use super::followup::Followup;
use crate::domain::DomainError;

/// A raw event line before its payload has been interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// A normalized stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    FileStart { path: String },
    FileChunk { path: String, chunk: String },
    FileComplete { path: String },
    Followups(Vec<Followup>),
    NewDependencies(Vec<String>),
    Warning(String),
    Error(String),
    Done,
    /// Any kind this version does not understand.
    Other { kind: String },
}

impl StreamEvent {
    /// Parse one NDJSON line.
    pub fn from_json_line(line: &str) -> Result<Self, DomainError> {
        let wire: WireEvent =
            serde_json::from_str(line).map_err(|e| DomainError::InvalidEvent {
                kind: "<unparsed>".into(),
                reason: e.to_string(),
            })?;
        Self::try_from(wire)
    }

    /// Wire name of this event kind.
    pub fn kind(&self) -> &str {
        match self {
            Self::FileStart { .. } => "file_start",
            Self::FileChunk { .. } => "file_chunk",
            Self::FileComplete { .. } => "file_complete",
            Self::Followups(_) => "followups",
            Self::NewDependencies(_) => "new_dependencies",
            Self::Warning(_) => "warning",
            Self::Error(_) => "error",
            Self::Done => "done",
            Self::Other { kind } => kind,
        }
    }
}

impl TryFrom<WireEvent> for StreamEvent {
    type Error = DomainError;

    fn try_from(wire: WireEvent) -> Result<Self, DomainError> {
        let WireEvent { event, payload } = wire;

        let path = |kind: &str| -> Result<String, DomainError> {
            payload
                .get("path")
                .and_then(|p| p.as_str())
                .map(str::to_string)
                .ok_or_else(|| DomainError::InvalidEvent {
                    kind: kind.to_string(),
                    reason: "payload has no string 'path'".into(),
                })
        };

        let event = match event.as_str() {
            "file_start" => Self::FileStart {
                path: path("file_start")?,
            },
            "file_chunk" => Self::FileChunk {
                path: path("file_chunk")?,
                chunk: payload
                    .get("chunk")
                    .and_then(|c| c.as_str())
                    .unwrap_or_default()
                    .to_string(),
            },
            "file_complete" => Self::FileComplete {
                path: path("file_complete")?,
            },
            "followups" => Self::Followups(Followup::from_payload(&payload)),
            "new_dependencies" => Self::NewDependencies(dependency_names(&payload)),
            "warning" => Self::Warning(payload_text(&payload)),
            "error" => StreamEvent::Error(payload_text(&payload)),
            "done" => Self::Done,
            _ => Self::Other {
                kind: event.clone(),
            },
        };

        Ok(event)
    }
}

/// Dependency names arrive as strings or as `{"name": ...}` objects.
fn dependency_names(payload: &serde_json::Value) -> Vec<String> {
    payload
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s.trim().to_string()),
                    serde_json::Value::Object(map) => map
                        .get("name")
                        .and_then(|n| n.as_str())
                        .map(|n| n.trim().to_string()),
                    _ => None,
                })
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn payload_text(payload: &serde_json::Value) -> String {
    match payload {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_file_events() {
        let start = StreamEvent::from_json_line(r#"{"event":"file_start","payload":{"path":"src/a.ts"}}"#)
            .unwrap();
        assert_eq!(start, StreamEvent::FileStart { path: "src/a.ts".into() });

        let chunk = StreamEvent::from_json_line(
            r#"{"event":"file_chunk","payload":{"path":"src/a.ts","chunk":"let x","final":false}}"#,
        )
        .unwrap();
        assert_eq!(
            chunk,
            StreamEvent::FileChunk {
                path: "src/a.ts".into(),
                chunk: "let x".into()
            }
        );
    }

    #[test]
    fn file_event_without_path_is_invalid() {
        let err = StreamEvent::from_json_line(r#"{"event":"file_complete","payload":{}}"#).unwrap_err();
        assert!(matches!(err, DomainError::InvalidEvent { kind, .. } if kind == "file_complete"));
    }

    #[test]
    fn unknown_kinds_are_preserved_as_other() {
        let ev = StreamEvent::from_json_line(r#"{"event":"dependency_resolution","payload":[1,2]}"#)
            .unwrap();
        assert_eq!(ev.kind(), "dependency_resolution");
        assert!(matches!(ev, StreamEvent::Other { .. }));
    }

    #[test]
    fn done_needs_no_payload() {
        assert_eq!(StreamEvent::from_json_line(r#"{"event":"done"}"#).unwrap(), StreamEvent::Done);
    }

    #[test]
    fn new_dependencies_accepts_mixed_items() {
        let ev = StreamEvent::from_json_line(
            r#"{"event":"new_dependencies","payload":["zod", {"name":"clsx"}, 3, " "]}"#,
        )
        .unwrap();
        assert_eq!(ev, StreamEvent::NewDependencies(vec!["zod".into(), "clsx".into()]));
    }

    #[test]
    fn warning_payload_falls_back_to_json_text() {
        let ev = StreamEvent::from_json_line(r#"{"event":"warning","payload":{"code":1}}"#).unwrap();
        assert_eq!(ev, StreamEvent::Warning(r#"{"code":1}"#.into()));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(StreamEvent::from_json_line("{not json").is_err());
    }
}
