//! Followup answer cache.

mod answers;

pub use answers::{AnswerCacheError, CachedResponder, JsonAnswerCache};
