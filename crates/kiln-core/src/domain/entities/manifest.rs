//! The generated project's dependency manifest (`package.json`).
//!
//! Only the `dependencies` map is interpreted. Everything else is kept as an
//! opaque JSON object so fields written by other tools survive a round-trip
//! with their original order.

use serde_json::{Map, Value};

use crate::domain::DomainError;

/// Fixed location of the manifest, relative to the project root.
pub const MANIFEST_FILE: &str = "package.json";

/// Version constraint recorded for dependencies nobody has pinned yet.
pub const PLACEHOLDER_VERSION: &str = "latest";

const DEPENDENCIES: &str = "dependencies";

#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest {
    fields: Map<String, Value>,
}

impl PackageManifest {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| DomainError::ManifestParse {
            reason: e.to_string(),
        })?;

        let Value::Object(fields) = value else {
            return Err(DomainError::ManifestShape {
                field: "<root>",
                expected: "a JSON object",
            });
        };

        if let Some(deps) = fields.get(DEPENDENCIES) {
            if !deps.is_object() {
                return Err(DomainError::ManifestShape {
                    field: DEPENDENCIES,
                    expected: "an object of name to version",
                });
            }
        }

        Ok(Self { fields })
    }

    /// Version constraint currently recorded for `name`.
    pub fn dependency(&self, name: &str) -> Option<&str> {
        self.fields
            .get(DEPENDENCIES)
            .and_then(|d| d.get(name))
            .and_then(|v| v.as_str())
    }

    /// Add every name not already present with `placeholder` as its version.
    ///
    /// Existing entries are left untouched. Returns the names that were
    /// actually added, in input order and without duplicates.
    pub fn merge_dependencies<S: AsRef<str>>(&mut self, names: &[S], placeholder: &str) -> Vec<String> {
        let deps = self
            .fields
            .entry(DEPENDENCIES)
            .or_insert_with(|| Value::Object(Map::new()));

        // `parse` guarantees an object; anything else was inserted above.
        let Value::Object(deps) = deps else {
            return Vec::new();
        };

        let mut added = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || deps.contains_key(name) {
                continue;
            }
            deps.insert(name.to_string(), Value::String(placeholder.to_string()));
            added.push(name.to_string());
        }
        added
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_pretty_string(&self) -> String {
        let mut out = serde_json::to_string_pretty(&self.fields).unwrap_or_else(|_| "{}".into());
        out.push('\n');
        out
    }
}
