//! Terminal output: status lines, progress spinner and machine output.
//!
//! Status lines go to stderr so that `kiln collect > batch.json` and
//! `--output-format json` keep stdout clean for data.

use std::io::{self, IsTerminal};
use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

pub struct OutputManager {
    format: OutputFormat,
    quiet: bool,
    no_color: bool,
    status: Term,
    data: Term,
}

impl OutputManager {
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let requested = match args.output_format {
            OutputFormat::Auto => OutputFormat::from_name(&config.output.format),
            explicit => explicit,
        };
        let format = match requested {
            OutputFormat::Auto if io::stdout().is_terminal() => OutputFormat::Human,
            OutputFormat::Auto => OutputFormat::Plain,
            other => other,
        };

        Self {
            format,
            quiet: args.quiet,
            no_color: args.no_color || config.output.no_color || format != OutputFormat::Human,
            status: Term::stderr(),
            data: Term::stdout(),
        }
    }

    fn status_line(&self, glyph: &str, msg: &str, paint: fn(&str) -> String) -> io::Result<()> {
        if self.quiet || self.format == OutputFormat::Json {
            return Ok(());
        }
        let line = if self.no_color {
            format!("{glyph} {msg}")
        } else {
            paint(&format!("{glyph} {msg}"))
        };
        self.status.write_line(&line)
    }

    pub fn success(&self, msg: &str) -> io::Result<()> {
        self.status_line("\u{2713}", msg, |s| s.green().bold().to_string())
    }

    pub fn warning(&self, msg: &str) -> io::Result<()> {
        self.status_line("\u{26a0}", msg, |s| s.yellow().to_string())
    }

    pub fn info(&self, msg: &str) -> io::Result<()> {
        self.status_line("\u{2139}", msg, |s| s.blue().to_string())
    }

    /// Indented detail line under a status line.
    pub fn detail(&self, msg: &str) -> io::Result<()> {
        self.status_line(" ", msg, |s| s.dimmed().to_string())
    }

    /// Write a line of command output to stdout. Never suppressed.
    pub fn data(&self, text: &str) -> io::Result<()> {
        self.data.write_line(text)
    }

    /// Write `value` as pretty JSON to stdout.
    pub fn json<T: Serialize>(&self, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.data(&text)
    }

    /// A ticking spinner on stderr, hidden unless output is interactive.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.quiet || self.format != OutputFormat::Human || !io::stderr().is_terminal() {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
