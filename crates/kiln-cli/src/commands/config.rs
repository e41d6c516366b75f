//! `kiln config`: inspect the effective configuration.

use std::path::PathBuf;

use crate::{
    cli::ConfigCommands,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

pub fn execute(
    cmd: ConfigCommands,
    explicit: Option<PathBuf>,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    match cmd {
        ConfigCommands::Get { key } => {
            let value = lookup(&config, &key)?;
            if output.is_json() {
                output.json(&value)?;
            } else {
                output.data(&render(&value))?;
            }
        }
        ConfigCommands::List => {
            if output.is_json() {
                output.json(&config)?;
            } else {
                let text = toml::to_string_pretty(&config).map_err(|e| CliError::ConfigError {
                    message: format!("Failed to serialise config: {e}"),
                    source: Some(Box::new(e)),
                })?;
                output.data(text.trim_end())?;
            }
        }
        ConfigCommands::Path => {
            let path = explicit.unwrap_or_else(AppConfig::config_path);
            output.data(&path.display().to_string())?;
        }
    }
    Ok(())
}

fn lookup(config: &AppConfig, key: &str) -> CliResult<serde_json::Value> {
    config.get(key).ok_or_else(|| CliError::ConfigError {
        message: format!("Unknown config key: '{key}'"),
        source: None,
    })
}

/// Strings print bare; everything else as JSON.
fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
