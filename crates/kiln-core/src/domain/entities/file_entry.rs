use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, RelativePath, sanitize};

/// Content marker standing in for a binary asset.
///
/// Binary payloads never travel through the text pipeline; a collaborator
/// that knows a path is binary sends this marker instead, and writers skip it.
pub const BINARY_ASSET_MARKER: &str = "@@kiln:binary-asset@@";

/// One `(path, content)` pair as produced by a generator.
///
/// The path is untrusted until it has been through [`sanitize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(default)]
    pub content: String,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Entry standing in for a binary file that must not be written as text.
    pub fn binary_placeholder(path: impl Into<String>) -> Self {
        Self::new(path, BINARY_ASSET_MARKER)
    }

    pub fn is_binary_placeholder(&self) -> bool {
        self.content == BINARY_ASSET_MARKER
    }
}

/// A file whose path has been sanitized, ready for a writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedFile {
    pub path: RelativePath,
    pub content: String,
}

impl CheckedFile {
    pub fn is_binary_placeholder(&self) -> bool {
        self.content == BINARY_ASSET_MARKER
    }
}

/// A deduplicated set of sanitized files.
///
/// Built in one pass so that a single unsafe path rejects the whole batch
/// before anything touches the filesystem. Duplicate paths keep the position
/// of their first occurrence and the content of their last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileBatch {
    files: Vec<CheckedFile>,
}

impl FileBatch {
    pub fn from_entries(entries: impl IntoIterator<Item = FileEntry>) -> Result<Self, DomainError> {
        let mut files: Vec<CheckedFile> = Vec::new();
        let mut index: HashMap<RelativePath, usize> = HashMap::new();

        for entry in entries {
            let path = sanitize(&entry.path)?;
            match index.get(&path) {
                Some(&at) => files[at].content = entry.content,
                None => {
                    index.insert(path.clone(), files.len());
                    files.push(CheckedFile {
                        path,
                        content: entry.content,
                    });
                }
            }
        }

        Ok(Self { files })
    }

    /// Files that carry real text content.
    pub fn writable(&self) -> impl Iterator<Item = &CheckedFile> {
        self.files.iter().filter(|f| !f.is_binary_placeholder())
    }

    /// Paths that were announced as binary assets.
    pub fn binary_placeholders(&self) -> impl Iterator<Item = &RelativePath> {
        self.files
            .iter()
            .filter(|f| f.is_binary_placeholder())
            .map(|f| &f.path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A complete, non-streamed response from the generation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationBatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl GenerationBatch {
    /// Warnings reported by the generator under `metadata.warnings`.
    pub fn warnings(&self) -> Vec<String> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("warnings"))
            .and_then(|w| w.as_array())
            .map(|items| {
                items
                    .iter()
                    .map(|w| match w.as_str() {
                        Some(s) => s.to_string(),
                        None => w.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
