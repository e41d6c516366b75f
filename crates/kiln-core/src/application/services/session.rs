//! Generation Session - drives the streaming conversation with a generator.
//!
//! ```text
//!  Collecting ──▶ Streaming ──▶ Complete ──▶ Done
//!      ▲              │
//!      │              ▼
//!      └──────── Followups
//! ```
//!
//! Each round opens the content source with every answer gathered so far.
//! A round ends either with clarifying questions (answered, then another
//! round) or with a set of completed files. Transport failures are retried
//! with a fresh assembler, so partial buffers never leak between attempts.

use std::collections::BTreeMap;

use tracing::{debug, info, instrument, trace, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{ContentSource, FollowupResponder, Formatter, NoopFormatter},
    },
    domain::{FileAssembler, FileEntry, Followup, StreamEvent, assign_missing_ids},
    error::{ErrorCategory, KilnError, KilnResult},
};

/// Default cap on followup rounds.
pub const DEFAULT_MAX_ROUNDS: u32 = 20;

/// Default number of extra attempts per round after a transport failure.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Where the session currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Collecting,
    Streaming { round: u32, attempt: u32 },
    Followups(Vec<Followup>),
    Complete,
    Done,
}

/// Result of a finished session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub entries: Vec<FileEntry>,
    pub new_dependencies: Vec<String>,
    pub warnings: Vec<String>,
    pub answers: BTreeMap<String, String>,
    pub rounds: u32,
}

/// How one streaming attempt ended.
enum RoundOutcome {
    Files {
        entries: Vec<FileEntry>,
        new_dependencies: Vec<String>,
        warnings: Vec<String>,
    },
    Followups(Vec<Followup>),
    Empty,
}

/// Why an attempt stopped early.
enum AttemptFailure {
    /// The source broke; worth another attempt.
    Transport(KilnError),
    /// The generator itself gave up; retrying won't help.
    Fatal(KilnError),
}

impl AttemptFailure {
    /// Source errors are transport trouble unless they describe bad input.
    fn classify(e: KilnError) -> Self {
        match e.category() {
            ErrorCategory::Validation | ErrorCategory::Conflict | ErrorCategory::NotFound => {
                Self::Fatal(e)
            }
            ErrorCategory::Upstream | ErrorCategory::Internal => Self::Transport(e),
        }
    }
}

type FileObserver = Box<dyn Fn(&FileEntry) + Send>;

/// Streaming session state machine.
pub struct GenerationSession {
    formatter: Box<dyn Formatter>,
    on_file: Option<FileObserver>,
    max_rounds: u32,
    max_retries: u32,
    state: SessionState,
    answers: BTreeMap<String, String>,
}

impl Default for GenerationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationSession {
    pub fn new() -> Self {
        Self {
            formatter: Box::new(NoopFormatter),
            on_file: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_retries: DEFAULT_MAX_RETRIES,
            state: SessionState::Collecting,
            answers: BTreeMap::new(),
        }
    }

    pub fn with_formatter(mut self, formatter: Box<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Called once for every completed file, after formatting.
    pub fn on_file(mut self, observer: impl Fn(&FileEntry) + Send + 'static) -> Self {
        self.on_file = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Run rounds until the generator yields files.
    #[instrument(skip_all, fields(max_rounds = self.max_rounds, max_retries = self.max_retries))]
    pub fn run(
        &mut self,
        source: &mut dyn ContentSource,
        responder: &mut dyn FollowupResponder,
    ) -> KilnResult<GenerationOutcome> {
        let mut round = 0;

        loop {
            self.transition(SessionState::Collecting);
            round += 1;
            if round > self.max_rounds {
                return Err(ApplicationError::FollowupRoundsExceeded {
                    max_rounds: self.max_rounds,
                }
                .into());
            }

            match self.stream_round(source, round)? {
                RoundOutcome::Followups(mut followups) => {
                    assign_missing_ids(&mut followups, round);
                    info!(round, count = followups.len(), "Generator asked followups");
                    self.transition(SessionState::Followups(followups.clone()));

                    let answers = responder.answer(&followups)?;
                    self.answers.extend(answers);
                }
                RoundOutcome::Empty => return Err(ApplicationError::NoFiles.into()),
                RoundOutcome::Files {
                    entries,
                    new_dependencies,
                    warnings,
                } => {
                    self.transition(SessionState::Complete);
                    info!(round, files = entries.len(), deps = new_dependencies.len(), "Generation complete");
                    self.transition(SessionState::Done);

                    return Ok(GenerationOutcome {
                        entries,
                        new_dependencies,
                        warnings,
                        answers: self.answers.clone(),
                        rounds: round,
                    });
                }
            }
        }
    }

    fn stream_round(&mut self, source: &mut dyn ContentSource, round: u32) -> KilnResult<RoundOutcome> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.transition(SessionState::Streaming { round, attempt });

            match self.stream_attempt(source) {
                Ok(outcome) => return Ok(outcome),
                Err(AttemptFailure::Fatal(e)) => return Err(e),
                Err(AttemptFailure::Transport(e)) if attempt <= self.max_retries => {
                    warn!(round, attempt, error = %e, "Stream attempt failed, retrying");
                }
                Err(AttemptFailure::Transport(e)) => {
                    return Err(ApplicationError::StreamFailed {
                        attempts: attempt,
                        reason: e.to_string(),
                    }
                    .into());
                }
            }
        }
    }

    fn stream_attempt(&self, source: &mut dyn ContentSource) -> Result<RoundOutcome, AttemptFailure> {
        let mut stream = source.open(&self.answers).map_err(AttemptFailure::classify)?;
        let mut assembler = FileAssembler::new();

        let mut entries = Vec::new();
        let mut new_dependencies: Vec<String> = Vec::new();
        let mut warnings = Vec::new();

        while let Some(event) = stream.next_event().map_err(AttemptFailure::classify)? {
            match event {
                StreamEvent::Followups(followups) if !followups.is_empty() => {
                    let abandoned = assembler.finish();
                    if !abandoned.is_empty() {
                        debug!(?abandoned, "Dropping partial files in favour of followups");
                    }
                    return Ok(RoundOutcome::Followups(followups));
                }
                StreamEvent::Followups(_) => {}
                StreamEvent::NewDependencies(names) => {
                    for name in names {
                        if !new_dependencies.contains(&name) {
                            new_dependencies.push(name);
                        }
                    }
                }
                StreamEvent::Warning(message) => {
                    warn!(%message, "Generator warning");
                    warnings.push(message);
                }
                StreamEvent::Error(message) => {
                    return Err(AttemptFailure::Fatal(ApplicationError::Upstream { message }.into()));
                }
                StreamEvent::Done => break,
                StreamEvent::Other { kind } => trace!(%kind, "Ignoring unknown event"),
                file_event => {
                    if let Some(entry) = assembler.apply(&file_event) {
                        let entry = self.format(entry);
                        if let Some(observer) = &self.on_file {
                            observer(&entry);
                        }
                        entries.push(entry);
                    }
                }
            }
        }

        let abandoned = assembler.finish();
        if !abandoned.is_empty() {
            debug!(?abandoned, "Stream ended with incomplete files");
        }

        if entries.is_empty() {
            Ok(RoundOutcome::Empty)
        } else {
            Ok(RoundOutcome::Files {
                entries,
                new_dependencies,
                warnings,
            })
        }
    }

    fn format(&self, mut entry: FileEntry) -> FileEntry {
        if entry.is_binary_placeholder() {
            return entry;
        }
        if let Some(formatted) = self.formatter.format(&entry.path, &entry.content) {
            entry.content = formatted;
        }
        entry
    }

    fn transition(&mut self, next: SessionState) {
        trace!(from = ?self.state, to = ?next, "Session transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::EventSource;
    use std::collections::VecDeque;

    /// One scripted attempt: either a transport error or a list of events.
    enum Script {
        Broken(&'static str),
        Events(Vec<StreamEvent>),
    }

    struct ScriptedSource {
        scripts: VecDeque<Script>,
        seen_answers: Vec<BTreeMap<String, String>>,
    }

    impl ScriptedSource {
        fn new(scripts: Vec<Script>) -> Self {
            Self {
                scripts: scripts.into(),
                seen_answers: Vec::new(),
            }
        }
    }

    struct VecStream(VecDeque<StreamEvent>);

    impl EventSource for VecStream {
        fn next_event(&mut self) -> KilnResult<Option<StreamEvent>> {
            Ok(self.0.pop_front())
        }
    }

    struct MidStreamBreak(VecDeque<StreamEvent>);

    impl EventSource for MidStreamBreak {
        fn next_event(&mut self) -> KilnResult<Option<StreamEvent>> {
            match self.0.pop_front() {
                Some(e) => Ok(Some(e)),
                None => Err(KilnError::Internal {
                    message: "connection reset".into(),
                }),
            }
        }
    }

    impl ContentSource for ScriptedSource {
        fn open(&mut self, answers: &BTreeMap<String, String>) -> KilnResult<Box<dyn EventSource + '_>> {
            self.seen_answers.push(answers.clone());
            match self.scripts.pop_front() {
                Some(Script::Events(events)) => Ok(Box::new(VecStream(events.into()))),
                Some(Script::Broken(partial)) => Ok(Box::new(MidStreamBreak(
                    vec![
                        StreamEvent::FileStart { path: partial.into() },
                        StreamEvent::FileChunk {
                            path: partial.into(),
                            chunk: "half".into(),
                        },
                    ]
                    .into(),
                ))),
                None => Err(KilnError::Internal {
                    message: "no more scripts".into(),
                }),
            }
        }
    }

    struct Defaults;

    impl FollowupResponder for Defaults {
        fn answer(&mut self, followups: &[Followup]) -> KilnResult<BTreeMap<String, String>> {
            Ok(followups
                .iter()
                .map(|f| (f.id.clone(), format!("answer to {}", f.question)))
                .collect())
        }
    }

    fn file(path: &str, body: &str) -> Vec<StreamEvent> {
        vec![
            StreamEvent::FileStart { path: path.into() },
            StreamEvent::FileChunk {
                path: path.into(),
                chunk: body.into(),
            },
            StreamEvent::FileComplete { path: path.into() },
        ]
    }

    fn ask(question: &str) -> StreamEvent {
        StreamEvent::Followups(vec![Followup {
            id: String::new(),
            question: question.into(),
            default: String::new(),
        }])
    }

    #[test]
    fn single_round_yields_files() {
        let mut events = file("a.ts", "x");
        events.push(StreamEvent::NewDependencies(vec!["zod".into(), "zod".into()]));
        events.push(StreamEvent::Done);
        let mut source = ScriptedSource::new(vec![Script::Events(events)]);

        let mut session = GenerationSession::new();
        let outcome = session.run(&mut source, &mut Defaults).unwrap();

        assert_eq!(outcome.entries, vec![FileEntry::new("a.ts", "x")]);
        assert_eq!(outcome.new_dependencies, vec!["zod".to_string()]);
        assert_eq!(outcome.rounds, 1);
        assert_eq!(session.state(), &SessionState::Done);
    }

    #[test]
    fn followups_feed_answers_into_next_round() {
        let mut source = ScriptedSource::new(vec![
            Script::Events(vec![ask("Which database?")]),
            Script::Events(file("db.ts", "pg")),
        ]);

        let outcome = GenerationSession::new().run(&mut source, &mut Defaults).unwrap();

        assert_eq!(outcome.rounds, 2);
        assert!(source.seen_answers[0].is_empty());
        let second = &source.seen_answers[1];
        assert_eq!(second.len(), 1);
        let (id, answer) = second.iter().next().unwrap();
        assert!(id.starts_with("r1_q0_"));
        assert_eq!(answer, "answer to Which database?");
    }

    #[test]
    fn transport_failure_retries_with_fresh_assembler() {
        let mut source = ScriptedSource::new(vec![
            Script::Broken("a.ts"),
            Script::Events(file("b.ts", "whole")),
        ]);

        let outcome = GenerationSession::new().run(&mut source, &mut Defaults).unwrap();

        assert_eq!(outcome.entries, vec![FileEntry::new("b.ts", "whole")]);
    }

    #[test]
    fn retries_are_bounded() {
        let mut source = ScriptedSource::new(vec![
            Script::Broken("a.ts"),
            Script::Broken("a.ts"),
            Script::Broken("a.ts"),
        ]);

        let err = GenerationSession::new()
            .with_max_retries(2)
            .run(&mut source, &mut Defaults)
            .unwrap_err();

        assert!(matches!(
            err,
            KilnError::Application(ApplicationError::StreamFailed { attempts: 3, .. })
        ));
    }

    #[test]
    fn error_event_is_fatal() {
        let mut source = ScriptedSource::new(vec![
            Script::Events(vec![StreamEvent::Error("quota".into())]),
            Script::Events(file("never.ts", "")),
        ]);

        let err = GenerationSession::new().run(&mut source, &mut Defaults).unwrap_err();

        assert_eq!(err.kind(), "upstream");
        assert_eq!(source.seen_answers.len(), 1);
    }

    #[test]
    fn endless_followups_hit_the_round_cap() {
        let scripts = (0..5).map(|i| Script::Events(vec![ask(&format!("q{i}"))])).collect();
        let mut source = ScriptedSource::new(scripts);

        let err = GenerationSession::new()
            .with_max_rounds(3)
            .run(&mut source, &mut Defaults)
            .unwrap_err();

        assert_eq!(err.kind(), "followup-rounds-exceeded");
    }

    #[test]
    fn empty_round_is_no_files() {
        let mut source = ScriptedSource::new(vec![Script::Events(vec![StreamEvent::Done])]);
        let err = GenerationSession::new().run(&mut source, &mut Defaults).unwrap_err();
        assert_eq!(err.kind(), "no-files");
    }

    #[test]
    fn formatter_and_observer_see_completed_files() {
        struct Upper;
        impl Formatter for Upper {
            fn format(&self, _path: &str, content: &str) -> Option<String> {
                Some(content.to_uppercase())
            }
        }

        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut events = file("a.ts", "abc");
        events.extend(vec![
            StreamEvent::FileStart { path: "logo.png".into() },
            StreamEvent::FileChunk {
                path: "logo.png".into(),
                chunk: crate::domain::BINARY_ASSET_MARKER.into(),
            },
            StreamEvent::FileComplete { path: "logo.png".into() },
        ]);
        let mut source = ScriptedSource::new(vec![Script::Events(events)]);

        let outcome = GenerationSession::new()
            .with_formatter(Box::new(Upper))
            .on_file(move |e| sink.lock().unwrap().push(e.path.clone()))
            .run(&mut source, &mut Defaults)
            .unwrap();

        assert_eq!(outcome.entries[0].content, "ABC");
        assert!(outcome.entries[1].is_binary_placeholder());
        assert_eq!(*seen.lock().unwrap(), vec!["a.ts".to_string(), "logo.png".to_string()]);
    }
}
