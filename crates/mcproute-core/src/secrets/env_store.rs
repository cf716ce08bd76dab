//! Environment variable secret store

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;

use super::traits::SecretStore;

/// Mapping from provider names to environment variable names
static ENV_VAR_MAP: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("openai", vec!["OPENAI_API_KEY"]);
    m.insert("anthropic", vec!["ANTHROPIC_API_KEY"]);
    m.insert("gemini", vec!["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
    m.insert("groq", vec!["GROQ_API_KEY"]);
    m.insert("deepseek", vec!["DEEPSEEK_API_KEY"]);
    m.insert("xai", vec!["XAI_API_KEY"]);
    m.insert("ollama", vec![]); // Ollama doesn't need an API key
    m
});

/// Secret store that reads from environment variables
///
/// Provider names map to their conventional variables (`openai` →
/// `OPENAI_API_KEY`); anything else is tried verbatim and then as
/// `<KEY>_API_KEY`.
#[derive(Debug, Default)]
pub struct EnvSecretStore {
    _private: (),
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn read(name: &str) -> Option<String> {
        env::var(name).ok().filter(|v| !v.is_empty())
    }
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = Self::read(key) {
            return Some(value);
        }

        if let Some(env_vars) = ENV_VAR_MAP.get(key.to_lowercase().as_str()) {
            if let Some(value) = env_vars.iter().find_map(|var| Self::read(var)) {
                return Some(value);
            }
        }

        Self::read(&format!("{}_API_KEY", key.to_uppercase().replace('-', "_")))
    }
}
