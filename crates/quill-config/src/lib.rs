//! Configuration management for quill.
//!
//! Parses `quill.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Command definitions support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `commands.<name>.program`
//! - `commands.<name>.args`

mod expand;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quill.toml";

/// Accepted `log.level` values.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override chained execution.
    pub chain: Option<bool>,
    /// Override tab stripping of block directives.
    pub strip_tabs: Option<bool>,
    /// Override log level.
    pub log_level: Option<String>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extraction options.
    pub extract: ExtractConfig,
    /// Chain options.
    pub chain: ChainConfig,
    /// Logging options.
    pub log: LogConfig,
    /// External commands keyed by command name.
    pub commands: BTreeMap<String, CommandConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Extraction configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Remove tab characters from block occurrences before splitting.
    pub strip_tabs: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { strip_tabs: true }
    }
}

/// Chain configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Resolve nested directives before executing.
    pub enabled: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level when neither `--verbose` nor `RUST_LOG` is set.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
        }
    }
}

/// External program bound to a command name.
///
/// The decoded parameter is written to the program's stdin (text as is, anything else
/// as JSON) and its trimmed stdout becomes the result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandConfig {
    /// Program to run.
    pub program: String,
    /// Program arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`commands.shout.program`").
        field: String,
        /// Error message (e.g., "${`TR_BIN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Whether `name` is a command name in hyphenated (`page-title`) or camel-case
/// (`pageTitle`) form.
fn is_command_name(name: &str) -> bool {
    name.split('-').all(|segment| {
        let mut chars = segment.chars();
        segment.len() >= 2
            && chars.next().is_some_and(|c| c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_alphanumeric())
    })
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quill.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(chain) = settings.chain {
            self.chain.enabled = chain;
        }
        if let Some(strip_tabs) = settings.strip_tabs {
            self.extract.strip_tabs = strip_tabs;
        }
        if let Some(level) = &settings.log_level {
            self.log.level.clone_from(level);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        Self::discover_from(&std::env::current_dir().ok()?)
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_log()?;
        self.validate_commands()?;
        Ok(())
    }

    fn validate_log(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "log.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.log.level
            )));
        }
        Ok(())
    }

    fn validate_commands(&self) -> Result<(), ConfigError> {
        for (name, command) in &self.commands {
            if !is_command_name(name) {
                return Err(ConfigError::Validation(format!(
                    "commands.{name} is not a valid command name"
                )));
            }
            require_non_empty(&command.program, &format!("commands.{name}.program"))?;
        }
        Ok(())
    }

    /// Expand environment variable references in command definitions.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        for (name, command) in &mut self.commands {
            command.program =
                expand::expand_env(&command.program, &format!("commands.{name}.program"))?;
            command.args = expand::expand_all(&command.args, &format!("commands.{name}.args"))?;
        }
        Ok(())
    }
}
