//! Core trait for secret lookup

/// Read-only source of secrets such as provider API keys
///
/// The key is normally a provider id (`"openai"`), which implementations map
/// to whatever they store (an env var name, a config entry, ...).
pub trait SecretStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Retrieve a secret by key
    fn get(&self, key: &str) -> Option<String>;

    /// Check if a secret exists
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}
