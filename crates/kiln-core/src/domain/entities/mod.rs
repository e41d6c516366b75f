pub mod event;
pub mod file_entry;
pub mod followup;
pub mod manifest;

pub use crate::domain::DomainError;
pub use event::{StreamEvent, WireEvent};
pub use file_entry::{BINARY_ASSET_MARKER, CheckedFile, FileBatch, FileEntry, GenerationBatch};
pub use followup::{Followup, assign_missing_ids, stable_question_id};
pub use manifest::{MANIFEST_FILE, PLACEHOLDER_VERSION, PackageManifest};
