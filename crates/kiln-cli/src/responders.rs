//! Ways of answering followup questions from the command line.

use std::collections::BTreeMap;

use tracing::debug;

use kiln_core::{
    application::{ApplicationError, ports::FollowupResponder},
    domain::Followup,
    error::KilnResult,
};

/// Answers every followup with its default. Fails on a question without one.
#[derive(Debug, Default)]
pub struct DefaultsResponder;

impl FollowupResponder for DefaultsResponder {
    fn answer(&mut self, followups: &[Followup]) -> KilnResult<BTreeMap<String, String>> {
        followups
            .iter()
            .map(|f| -> KilnResult<(String, String)> {
                if f.default.is_empty() {
                    Err(ApplicationError::FollowupsUnanswered {
                        reason: format!(
                            "'{}' has no default; run in a terminal to answer it",
                            f.question
                        ),
                    }
                    .into())
                } else {
                    debug!(id = %f.id, "Answering with default");
                    Ok((f.id.clone(), f.default.clone()))
                }
            })
            .collect()
    }
}

/// Asks each followup on the terminal.
#[cfg(feature = "interactive")]
pub struct PromptResponder {
    spinner: indicatif::ProgressBar,
}

#[cfg(feature = "interactive")]
impl PromptResponder {
    /// `spinner` is paused while a prompt is on screen.
    pub fn new(spinner: indicatif::ProgressBar) -> Self {
        Self { spinner }
    }

    fn ask(followup: &Followup) -> Result<String, dialoguer::Error> {
        let theme = dialoguer::theme::ColorfulTheme::default();
        let mut input = dialoguer::Input::<String>::with_theme(&theme)
            .with_prompt(&followup.question)
            .allow_empty(true);
        if !followup.default.is_empty() {
            input = input.default(followup.default.clone());
        }
        let raw = input.interact_text()?;
        Ok(raw.trim().to_string())
    }
}

#[cfg(feature = "interactive")]
impl FollowupResponder for PromptResponder {
    fn answer(&mut self, followups: &[Followup]) -> KilnResult<BTreeMap<String, String>> {
        self.spinner.suspend(|| {
            followups
                .iter()
                .map(|f| -> KilnResult<(String, String)> {
                    let answer = Self::ask(f).map_err(|e| ApplicationError::FollowupsUnanswered {
                        reason: format!("could not read an answer: {e}"),
                    })?;
                    Ok((f.id.clone(), answer))
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn followup(id: &str, default: &str) -> Followup {
        Followup {
            id: id.into(),
            question: format!("question {id}?"),
            default: default.into(),
        }
    }

    #[test]
    fn defaults_answer_by_id() {
        let answers = DefaultsResponder
            .answer(&[followup("db", "postgres"), followup("auth", "none")])
            .unwrap();
        assert_eq!(answers["db"], "postgres");
        assert_eq!(answers["auth"], "none");
    }

    #[test]
    fn missing_default_is_unanswered() {
        let err = DefaultsResponder
            .answer(&[followup("db", "postgres"), followup("name", "")])
            .unwrap_err();
        assert_eq!(err.kind(), "followups-unanswered");
        assert!(err.to_string().contains("question name?"));
    }
}
