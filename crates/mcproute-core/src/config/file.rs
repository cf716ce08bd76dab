//! File-based configuration (YAML)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default model, as `provider/model`
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
/// Default registry file, relative to the working directory
pub const DEFAULT_REGISTRY: &str = "servers.json";
/// Prompt requested from every endpoint for the system instruction
pub const DEFAULT_INSTRUCTION_PROMPT: &str = "math_assistant_instructions";
/// Upper bound on model turns per query
pub const DEFAULT_MAX_TURNS: usize = 25;

/// Errors that can occur while loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Resolved application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Model as `provider/model` (e.g. `openai/gpt-4o-mini`)
    pub model: String,
    /// Sampling temperature for every model call
    pub temperature: f32,
    /// Explicit API key; takes precedence over the environment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API base URL for OpenAI-compatible endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Path of the server registry (JSON)
    pub registry: PathBuf,
    /// Maximum model turns before a query is aborted
    pub max_turns: usize,
    /// Name of the prompt fetched from endpoints as the system instruction
    pub instruction_prompt: String,
    /// Minimum diagnostic log level (`debug`, `info`, `warn`, `error`)
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            api_key: None,
            api_base: None,
            registry: PathBuf::from(DEFAULT_REGISTRY),
            max_turns: DEFAULT_MAX_TURNS,
            instruction_prompt: DEFAULT_INSTRUCTION_PROMPT.to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Provider id part of `model` (`openai/gpt-4o` -> `openai`)
    pub fn provider_id(&self) -> &str {
        match self.model.split_once('/') {
            Some((provider, _)) => provider,
            None => "openai",
        }
    }

    /// Check invariants the rest of the crate relies on
    pub fn validate(&self) -> ConfigResult<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }
        if self.max_turns == 0 {
            return Err(ConfigError::Invalid("max_turns must be at least 1".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Configuration file on disk
///
/// # Example
///
/// ```no_run
/// use mcproute_core::config::ConfigFile;
///
/// let config = ConfigFile::user().load().unwrap();
/// println!("routing with {}", config.model);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    /// Config file at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// User-level config (`~/.config/mcproute/config.yaml`)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });
        Self::new(config_dir.join("mcproute").join("config.yaml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load and validate the config; a missing file yields the defaults
    pub fn load(&self) -> ConfigResult<AppConfig> {
        if !self.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let config: AppConfig = if content.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: self.path.clone(),
                message: e.to_string(),
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Write `config` to disk, creating parent directories
    pub fn save(&self, config: &AppConfig) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(config)
            .map_err(|e| ConfigError::Invalid(format!("Failed to serialize YAML: {}", e)))?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
