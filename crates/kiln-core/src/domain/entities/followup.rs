use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A clarifying question asked by the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Followup {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub default: String,
}

impl Followup {
    /// Normalize a raw `followups` payload.
    ///
    /// Items may be bare strings or objects with `id`, `question` and
    /// `default`. Blank questions are dropped. Items without an id keep an
    /// empty one until [`assign_missing_ids`] runs, since the round number is
    /// only known to the session.
    pub fn from_payload(payload: &serde_json::Value) -> Vec<Followup> {
        let Some(items) = payload.as_array() else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| {
                let (id, question, default) = match item {
                    serde_json::Value::String(s) => (None, s.as_str(), ""),
                    serde_json::Value::Object(map) => (
                        map.get("id").and_then(|v| v.as_str()),
                        map.get("question").and_then(|v| v.as_str()).unwrap_or(""),
                        map.get("default").and_then(|v| v.as_str()).unwrap_or(""),
                    ),
                    _ => return None,
                };

                let question = question.trim();
                if question.is_empty() {
                    return None;
                }

                let id = id.map(str::trim).unwrap_or_default().to_string();

                Some(Followup {
                    id,
                    question: question.to_string(),
                    default: default.to_string(),
                })
            })
            .collect()
    }
}

/// Give every followup without an id a [`stable_question_id`].
pub fn assign_missing_ids(followups: &mut [Followup], round: u32) {
    for (index, followup) in followups.iter_mut().enumerate() {
        if followup.id.is_empty() {
            followup.id = stable_question_id(round, index, &followup.question);
        }
    }
}

/// Deterministic id for a question that arrived without one.
///
/// Format: `r<round>_q<index>_<8 hex>`, hashing the trimmed, lower-cased
/// question so the same question maps to the same cached answer across runs.
pub fn stable_question_id(round: u32, index: usize, question: &str) -> String {
    let normalized = question.trim().to_lowercase();
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, normalized.as_bytes())
        .simple()
        .to_string();
    format!("r{round}_q{index}_{}", &digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_and_object_items_normalize_to_one_shape() {
        let payload = json!([
            "Which pages do you need?",
            {"id": "style", "question": "Visual style?", "default": "minimal"},
            {"question": "   "},
            42
        ]);

        let mut followups = Followup::from_payload(&payload);
        assert_eq!(followups.len(), 2);
        assert_eq!(followups[0].id, "");

        assign_missing_ids(&mut followups, 2);
        assert!(followups[0].id.starts_with("r2_q0_"));
        assert_eq!(followups[0].default, "");
        assert_eq!(followups[1].id, "style");
        assert_eq!(followups[1].default, "minimal");
    }

    #[test]
    fn stable_id_ignores_case_and_whitespace() {
        let a = stable_question_id(1, 3, "  Which Framework? ");
        let b = stable_question_id(1, 3, "which framework?");
        assert_eq!(a, b);
        assert_eq!(a.len(), "r1_q3_".len() + 8);
        assert_ne!(a, stable_question_id(1, 3, "which database?"));
    }

    #[test]
    fn non_array_payload_is_empty() {
        assert!(Followup::from_payload(&json!({"question": "x"})).is_empty());
    }
}
