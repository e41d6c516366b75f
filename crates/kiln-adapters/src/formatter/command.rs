//! External-tool formatter.
//!
//! Content is written to a scratch file with the right extension, the tool
//! rewrites it in place, and the result is read back. Missing tools and
//! failing runs are not errors: the original content is kept.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::Builder;
use tracing::{debug, warn};

use kiln_core::application::ports::Formatter;

/// Which tool handles which file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterRule {
    /// Lower-case extensions without the dot.
    pub extensions: Vec<String>,
    pub program: String,
    /// Arguments placed before the file path.
    pub args: Vec<String>,
}

impl FormatterRule {
    pub fn new(extensions: &[&str], program: &str, args: &[&str]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn matches(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }
}

/// Formatter that shells out per file extension.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    rules: Vec<FormatterRule>,
}

impl Default for CommandFormatter {
    fn default() -> Self {
        Self::new(vec![
            FormatterRule::new(
                &["ts", "tsx", "js", "jsx", "json", "css", "html", "md"],
                "npx",
                &["--yes", "prettier", "--write"],
            ),
            FormatterRule::new(&["py"], "black", &["--quiet"]),
            FormatterRule::new(&["go"], "gofmt", &["-w"]),
        ])
    }
}

impl CommandFormatter {
    pub fn new(rules: Vec<FormatterRule>) -> Self {
        Self { rules }
    }

    fn rule_for(&self, path: &str) -> Option<&FormatterRule> {
        let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        self.rules.iter().find(|r| r.matches(&ext))
    }

    fn run(&self, rule: &FormatterRule, path: &str, content: &str) -> std::io::Result<Option<String>> {
        let suffix = Path::new(path)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut scratch = Builder::new().prefix("kiln-fmt-").suffix(&suffix).tempfile()?;
        scratch.write_all(content.as_bytes())?;
        scratch.flush()?;

        let status = Command::new(&rule.program)
            .args(&rule.args)
            .arg(scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;

        if !status.success() {
            warn!(path, program = %rule.program, %status, "Formatter failed, keeping original");
            return Ok(None);
        }

        let formatted = std::fs::read_to_string(scratch.path())?;
        Ok((formatted != content).then_some(formatted))
    }
}

impl Formatter for CommandFormatter {
    fn format(&self, path: &str, content: &str) -> Option<String> {
        let rule = self.rule_for(path)?;
        match self.run(rule, path, content) {
            Ok(result) => result,
            Err(e) => {
                debug!(path, program = %rule.program, error = %e, "Formatter unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_rule_by_extension() {
        let f = CommandFormatter::default();
        assert_eq!(f.rule_for("src/App.TSX").map(|r| r.program.as_str()), Some("npx"));
        assert_eq!(f.rule_for("main.go").map(|r| r.program.as_str()), Some("gofmt"));
        assert!(f.rule_for("Makefile").is_none());
        assert!(f.rule_for("notes.txt").is_none());
    }

    #[test]
    fn missing_tool_keeps_content() {
        let f = CommandFormatter::new(vec![FormatterRule::new(
            &["txt"],
            "kiln-no-such-formatter-binary",
            &[],
        )]);
        assert_eq!(f.format("a.txt", "hello"), None);
    }

    #[cfg(unix)]
    #[test]
    fn failing_tool_keeps_content() {
        let f = CommandFormatter::new(vec![FormatterRule::new(&["txt"], "false", &[])]);
        assert_eq!(f.format("a.txt", "hello"), None);
    }
}
