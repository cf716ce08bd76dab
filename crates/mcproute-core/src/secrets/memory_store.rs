//! In-memory secret store

use std::collections::HashMap;

use parking_lot::RwLock;

use super::traits::SecretStore;

/// In-memory secret store
///
/// Holds keys given explicitly in the config file so they take precedence
/// over the environment, and doubles as a fixture in tests.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a secret
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.secrets.write().insert(key.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_secret(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.secrets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecretStore for MemorySecretStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.secrets.read().get(key).cloned()
    }
}
