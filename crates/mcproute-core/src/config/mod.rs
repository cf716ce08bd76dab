//! Application configuration
//!
//! A single YAML file (`~/.config/mcproute/config.yaml` by default) holding
//! the model selection, registry location and agent limits. A missing file
//! means "use the defaults".

mod file;

pub use file::{
    AppConfig, ConfigError, ConfigFile, ConfigResult, DEFAULT_INSTRUCTION_PROMPT, DEFAULT_MAX_TURNS,
    DEFAULT_MODEL, DEFAULT_REGISTRY,
};
