//! Chained secret store with fallback behavior

use std::sync::Arc;

use super::traits::SecretStore;

/// Tries each store in order and returns the first match
pub struct ChainSecretStore {
    stores: Vec<Arc<dyn SecretStore>>,
}

impl ChainSecretStore {
    pub fn new(stores: Vec<Arc<dyn SecretStore>>) -> Self {
        Self { stores }
    }

    /// Name of the store that holds `key`, if any
    pub fn find_store(&self, key: &str) -> Option<&str> {
        self.stores
            .iter()
            .find(|store| store.has(key))
            .map(|store| store.name())
    }
}

impl SecretStore for ChainSecretStore {
    fn name(&self) -> &str {
        "chain"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.stores.iter().find_map(|store| store.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::MemorySecretStore;

    #[test]
    fn test_chain_prefers_earlier_stores() {
        let config = Arc::new(MemorySecretStore::new().with_secret("openai", "from-config"));
        let fallback = Arc::new(
            MemorySecretStore::new()
                .with_secret("openai", "from-fallback")
                .with_secret("groq", "gsk-fallback"),
        );
        let chain = ChainSecretStore::new(vec![config, fallback]);

        assert_eq!(chain.get("openai"), Some("from-config".to_string()));
        assert_eq!(chain.get("groq"), Some("gsk-fallback".to_string()));
        assert_eq!(chain.get("missing"), None);
        assert_eq!(chain.find_store("groq"), Some("memory"));
    }

    #[test]
    fn test_empty_chain_finds_nothing() {
        let chain = ChainSecretStore::new(Vec::new());
        assert!(!chain.has("openai"));
        assert_eq!(chain.find_store("openai"), None);
    }
}
