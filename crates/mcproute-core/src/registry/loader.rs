//! Registry file loading

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading the registry
///
/// Both variants are fatal at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed registry {path}: {message}")]
    Malformed { path: PathBuf, message: String },
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// One registered endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Name the router answers with
    pub name: String,
    /// Endpoint address (`http(s)://...` or `unix://...`)
    pub url: String,
    /// Capabilities summary shown to the router
    pub description: String,
}

impl ServerRecord {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            description: description.into(),
        }
    }
}

/// Read-only list of endpoints, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    servers: Vec<ServerRecord>,
}

impl Registry {
    /// Load the registry from a JSON file
    ///
    /// The file must hold an array of objects, each with string fields
    /// `name`, `url` and `description`.
    pub fn load(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|message| RegistryError::Malformed {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        let servers: Vec<ServerRecord> =
            serde_json::from_str(content).map_err(|e| e.to_string())?;
        Ok(Self::from_records(servers))
    }

    pub fn from_records(servers: Vec<ServerRecord>) -> Self {
        Self { servers }
    }

    /// Look up a record by exact name
    pub fn get(&self, name: &str) -> Option<&ServerRecord> {
        self.servers.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServerRecord> {
        self.servers.iter()
    }

    pub fn servers(&self) -> &[ServerRecord] {
        &self.servers
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SERVERS: &str = r#"[
        {"name": "MathServer", "url": "http://127.0.0.1:8000/mcp", "description": "Basic arithmetic: add, subtract, multiply, divide"},
        {"name": "WeatherServer", "url": "http://127.0.0.1:8001/mcp", "description": "Current weather by city"}
    ]"#;

    fn write(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("servers.json");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_registry() {
        let (_dir, path) = write(SERVERS);
        let registry = Registry::load(&path).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.servers()[0].name, "MathServer");
        assert_eq!(
            registry.get("WeatherServer").map(|s| s.url.as_str()),
            Some("http://127.0.0.1:8001/mcp")
        );
        assert!(registry.get("mathserver").is_none());
    }

    #[test]
    fn test_empty_registry_is_valid() {
        let (_dir, path) = write("[]");
        let registry = Registry::load(&path).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = Registry::load(dir.path().join("nope.json"));
        assert!(matches!(result, Err(RegistryError::Io { .. })));
    }

    #[test]
    fn test_malformed_registries() {
        let cases = [
            "{\"name\": \"MathServer\"}",
            "[{\"name\": \"MathServer\", \"url\": \"http://x\"}]",
            "[{\"name\": 7, \"url\": \"http://x\", \"description\": \"d\"}]",
            "[\"MathServer\"]",
            "not json",
        ];

        for content in cases {
            let (_dir, path) = write(content);
            let result = Registry::load(&path);
            assert!(
                matches!(result, Err(RegistryError::Malformed { .. })),
                "expected malformed error for {content}"
            );
        }
    }
}
