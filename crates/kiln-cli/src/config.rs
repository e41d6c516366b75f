//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only ever sees plain values.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `KILN_STREAM__MAX_ROUNDS=5`
//! 3. Config file: `--config FILE`, else the platform config dir
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use kiln_core::{
    application::services::{DEFAULT_MAX_RETRIES, DEFAULT_MAX_ROUNDS},
    domain::{MANIFEST_FILE, PLACEHOLDER_VERSION},
};

const ENV_PREFIX: &str = "KILN";

/// Application configuration.
///
/// Missing sections fall back to [`AppConfig::default`]. The defaults layer
/// drops empty tables such as `[cache]`, so every section must be optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Output settings.
    pub output: OutputConfig,
    /// Generation stream settings.
    pub stream: StreamConfig,
    /// Writer settings.
    pub writer: WriterConfig,
    /// External formatter settings.
    pub formatter: FormatterConfig,
    /// Followup answer cache.
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub max_rounds: u32,
    pub max_retries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriterConfig {
    pub manifest_path: String,
    pub placeholder_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatterConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Overrides the platform cache location when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output: OutputConfig {
                no_color: false,
                format: "auto".into(),
            },
            stream: StreamConfig {
                max_rounds: DEFAULT_MAX_ROUNDS,
                max_retries: DEFAULT_MAX_RETRIES,
            },
            writer: WriterConfig {
                manifest_path: MANIFEST_FILE.into(),
                placeholder_version: PLACEHOLDER_VERSION.into(),
            },
            formatter: FormatterConfig { enabled: true },
            cache: CacheConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then file, then environment.
    ///
    /// An explicit `config_file` must exist; the default location is optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let (path, required) = match config_file {
            Some(p) => (p.clone(), true),
            None => (Self::config_path(), false),
        };
        Self::load_from(&path, required, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_from(path: &Path, required: bool, env: Environment) -> anyhow::Result<Self> {
        let defaults = Config::try_from(&Self::default()).context("Failed to encode defaults")?;

        Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).format(FileFormat::Toml).required(required))
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?
            .try_deserialize()
            .context("Configuration has invalid values")
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.kiln.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "kiln", "kiln")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".kiln.toml"))
    }

    /// Look up a dotted key such as `stream.max_rounds`.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let root = serde_json::to_value(self).ok()?;
        key.split('.')
            .try_fold(root, |node, part| node.get(part).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env() -> Environment {
        Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::new()))
    }

    #[test]
    fn defaults_match_core_constants() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.stream.max_rounds, 20);
        assert_eq!(cfg.stream.max_retries, 2);
        assert_eq!(cfg.writer.manifest_path, "package.json");
        assert_eq!(cfg.writer.placeholder_version, "latest");
        assert!(cfg.formatter.enabled);
    }

    #[test]
    fn missing_optional_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("none.toml"), false, no_env()).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn sections_absent_from_every_layer_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\nformat = \"plain\"\n").unwrap();

        let cfg = AppConfig::load_from(&path, true, no_env()).unwrap();

        assert_eq!(cfg.output.format, "plain");
        assert_eq!(cfg.cache, CacheConfig::default());
        assert_eq!(cfg.stream, AppConfig::default().stream);
    }

    #[test]
    fn empty_cache_table_in_file_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\n").unwrap();

        let cfg = AppConfig::load_from(&path, true, no_env()).unwrap();

        assert_eq!(cfg.cache.path, None);
    }

    #[test]
    fn cache_path_from_environment() {
        let dir = TempDir::new().unwrap();
        let env = Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::from([(
            "KILN_CACHE__PATH".to_string(),
            "/tmp/answers.json".to_string(),
        )])));

        let cfg = AppConfig::load_from(&dir.path().join("none.toml"), false, env).unwrap();

        assert_eq!(cfg.cache.path, Some(PathBuf::from("/tmp/answers.json")));
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load_from(&dir.path().join("none.toml"), true, no_env()).is_err());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[stream]\nmax_rounds = 3\n\n[formatter]\nenabled = false\n").unwrap();

        let cfg = AppConfig::load_from(&path, true, no_env()).unwrap();

        assert_eq!(cfg.stream.max_rounds, 3);
        assert_eq!(cfg.stream.max_retries, 2);
        assert!(!cfg.formatter.enabled);
    }

    #[test]
    fn environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[stream]\nmax_rounds = 3\n").unwrap();
        let env = Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::from([(
            "KILN_STREAM__MAX_ROUNDS".to_string(),
            "7".to_string(),
        )])));

        let cfg = AppConfig::load_from(&path, true, env).unwrap();

        assert_eq!(cfg.stream.max_rounds, 7);
    }

    #[test]
    fn dotted_lookup() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.get("stream.max_rounds"), Some(serde_json::json!(20)));
        assert_eq!(cfg.get("writer.manifest_path"), Some(serde_json::json!("package.json")));
        assert_eq!(cfg.get("stream.nope"), None);
    }

    #[test]
    fn config_path_is_not_empty() {
        let p = AppConfig::config_path();
        assert!(!p.as_os_str().is_empty());
    }
}
