//! `kiln init`: write a configuration file with every default spelled out.

use std::fs;

use crate::{
    cli::InitArgs,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

pub fn execute(args: InitArgs, explicit: Option<std::path::PathBuf>, output: OutputManager) -> CliResult<()> {
    let path = explicit.unwrap_or_else(AppConfig::config_path);

    if path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    let text = toml::to_string_pretty(&AppConfig::default()).map_err(|e| CliError::ConfigError {
        message: format!("Failed to serialise default config: {e}"),
        source: Some(Box::new(e)),
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_cli_context(|| format!("Failed to create '{}'", parent.display()))?;
    }
    fs::write(&path, text).with_cli_context(|| format!("Failed to write '{}'", path.display()))?;

    output.success(&format!("Configuration written to {}", path.display()))?;
    Ok(())
}
