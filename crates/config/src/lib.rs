//! Configuration loading, validation, and management for ExamForge.
//!
//! Loads configuration from `~/.examforge/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use examforge_core::REFERENCE_LOCALE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.examforge/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Assembly engine settings
    #[serde(default)]
    pub assembly: AssemblyConfig,

    /// Where blueprints, questions, and history live
    #[serde(default)]
    pub content: ContentConfig,

    /// Log level and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Canonical fallback locale for tasks that allow it
    #[serde(default = "default_reference_locale")]
    pub reference_locale: String,

    /// Locale used when a request arrives with a blank locale
    #[serde(default = "default_reference_locale")]
    pub default_locale: String,

    /// Per-task fetch pipelines allowed in flight at once
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
}

fn default_reference_locale() -> String {
    REFERENCE_LOCALE.into()
}
fn default_max_concurrent_tasks() -> usize {
    4
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            reference_locale: default_reference_locale(),
            default_locale: default_reference_locale(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Directory holding `<blueprint-id>.json` documents
    #[serde(default = "default_blueprint_dir")]
    pub blueprint_dir: PathBuf,

    /// JSON-lines question bank
    #[serde(default = "default_question_bank")]
    pub question_bank: PathBuf,

    /// JSON-lines answer log used to derive user history
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,
}

fn default_blueprint_dir() -> PathBuf {
    AppConfig::config_dir().join("blueprints")
}
fn default_question_bank() -> PathBuf {
    AppConfig::config_dir().join("questions.jsonl")
}
fn default_history_file() -> PathBuf {
    AppConfig::config_dir().join("history.jsonl")
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            blueprint_dir: default_blueprint_dir(),
            question_bank: default_question_bank(),
            history_file: default_history_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl AppConfig {
    /// Load configuration from the default path (~/.examforge/config.toml).
    ///
    /// Environment variables override file values:
    /// - `EXAMFORGE_LOCALE` → `assembly.default_locale`
    /// - `EXAMFORGE_REFERENCE_LOCALE` → `assembly.reference_locale`
    /// - `EXAMFORGE_BLUEPRINT_DIR`, `EXAMFORGE_QUESTION_BANK`, `EXAMFORGE_HISTORY_FILE`
    /// - `EXAMFORGE_LOG` → `logging.level`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(locale) = lookup("EXAMFORGE_LOCALE") {
            self.assembly.default_locale = locale;
        }
        if let Some(locale) = lookup("EXAMFORGE_REFERENCE_LOCALE") {
            self.assembly.reference_locale = locale;
        }
        if let Some(dir) = lookup("EXAMFORGE_BLUEPRINT_DIR") {
            self.content.blueprint_dir = PathBuf::from(dir);
        }
        if let Some(bank) = lookup("EXAMFORGE_QUESTION_BANK") {
            self.content.question_bank = PathBuf::from(bank);
        }
        if let Some(history) = lookup("EXAMFORGE_HISTORY_FILE") {
            self.content.history_file = PathBuf::from(history);
        }
        if let Some(level) = lookup("EXAMFORGE_LOG") {
            self.logging.level = level;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".examforge")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assembly.max_concurrent_tasks == 0 {
            return Err(ConfigError::ValidationError(
                "assembly.max_concurrent_tasks must be >= 1".into(),
            ));
        }

        if self.assembly.reference_locale.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "assembly.reference_locale must not be blank".into(),
            ));
        }

        let level = self.logging.level.trim().to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join("|"),
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string for bootstrapping.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.assembly.reference_locale, "en");
        assert_eq!(config.assembly.max_concurrent_tasks, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.assembly.reference_locale, config.assembly.reference_locale);
        assert_eq!(parsed.content.blueprint_dir, config.content.blueprint_dir);
    }

    #[test]
    fn zero_concurrency_rejected() {
        let mut config = AppConfig::default();
        config.assembly.max_concurrent_tasks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_log_level_rejected() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.assembly.default_locale, "en");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[assembly]
default_locale = "ru"
max_concurrent_tasks = 8

[logging]
json = true
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.assembly.default_locale, "ru");
        assert_eq!(config.assembly.reference_locale, "en");
        assert_eq!(config.assembly.max_concurrent_tasks, 8);
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[assembly\nmax_concurrent_tasks = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("EXAMFORGE_LOCALE", "ru"),
            ("EXAMFORGE_BLUEPRINT_DIR", "/srv/blueprints"),
            ("EXAMFORGE_LOG", "debug"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.assembly.default_locale, "ru");
        assert_eq!(config.content.blueprint_dir, PathBuf::from("/srv/blueprints"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.assembly.reference_locale, "en");
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("reference_locale"));
        assert!(toml_str.contains("max_concurrent_tasks"));
    }
}
