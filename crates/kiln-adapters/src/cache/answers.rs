//! JSON-backed cache of followup answers, keyed by question id.
//!
//! Question ids are stable across runs for the same question text, so a
//! repeated generation does not ask again what was already answered.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use kiln_core::{
    application::{ApplicationError, ports::FollowupResponder},
    domain::Followup,
    error::{KilnError, KilnResult},
};

const CACHE_FILE: &str = "answers.json";

#[derive(Debug, Error)]
pub enum AnswerCacheError {
    #[error("Failed to read answer cache at {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Answer cache at {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write answer cache at {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("No cache directory is available on this platform")]
    NoCacheDir,
}

impl From<AnswerCacheError> for KilnError {
    fn from(e: AnswerCacheError) -> Self {
        let path = match &e {
            AnswerCacheError::Read { path, .. }
            | AnswerCacheError::Corrupt { path, .. }
            | AnswerCacheError::Write { path, .. } => path.clone(),
            AnswerCacheError::NoCacheDir => PathBuf::new(),
        };
        ApplicationError::FilesystemError {
            path,
            reason: e.to_string(),
        }
        .into()
    }
}

/// Answers persisted as one pretty-printed JSON object.
#[derive(Debug, Clone)]
pub struct JsonAnswerCache {
    path: PathBuf,
}

impl JsonAnswerCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<platform cache dir>/kiln/answers.json`.
    pub fn default_location() -> Result<Self, AnswerCacheError> {
        let dirs = ProjectDirs::from("dev", "kiln", "kiln").ok_or(AnswerCacheError::NoCacheDir)?;
        Ok(Self::new(dirs.cache_dir().join(CACHE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all cached answers; a missing file is an empty cache.
    pub fn load(&self) -> Result<BTreeMap<String, String>, AnswerCacheError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(AnswerCacheError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&raw).map_err(|source| AnswerCacheError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the cache contents.
    pub fn save(&self, answers: &BTreeMap<String, String>) -> Result<(), AnswerCacheError> {
        let write_err = |source: io::Error| AnswerCacheError::Write {
            path: self.path.clone(),
            source,
        };

        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(write_err)?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
        serde_json::to_writer_pretty(&mut tmp, answers).map_err(|e| write_err(e.into()))?;
        tmp.write_all(b"\n").map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!(path = %self.path.display(), entries = answers.len(), "Answer cache saved");
        Ok(())
    }
}

/// Answers from the cache first and asks `inner` only for the rest.
///
/// Fresh answers are written back. Cache I/O problems are logged and never
/// fail the session.
pub struct CachedResponder<R> {
    inner: R,
    cache: JsonAnswerCache,
    known: BTreeMap<String, String>,
}

impl<R: FollowupResponder> CachedResponder<R> {
    pub fn new(inner: R, cache: JsonAnswerCache) -> Self {
        let known = cache.load().unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unreadable answer cache");
            BTreeMap::new()
        });
        Self { inner, cache, known }
    }
}

impl<R: FollowupResponder> FollowupResponder for CachedResponder<R> {
    fn answer(&mut self, followups: &[Followup]) -> KilnResult<BTreeMap<String, String>> {
        let (hits, misses): (Vec<&Followup>, Vec<&Followup>) =
            followups.iter().partition(|f| self.known.contains_key(&f.id));

        let mut answers: BTreeMap<String, String> = hits
            .iter()
            .filter_map(|f| self.known.get(&f.id).map(|a| (f.id.clone(), a.clone())))
            .collect();
        debug!(cached = answers.len(), asking = misses.len(), "Resolving followups");

        if !misses.is_empty() {
            let pending: Vec<Followup> = misses.into_iter().cloned().collect();
            let fresh = self.inner.answer(&pending)?;
            self.known.extend(fresh.clone());
            answers.extend(fresh);

            if let Err(e) = self.cache.save(&self.known) {
                warn!(error = %e, "Could not update answer cache");
            }
        }

        Ok(answers)
    }
}
