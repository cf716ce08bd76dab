//! Static catalog of known tool-serving endpoints
//!
//! Loaded once at startup from a JSON array of `{name, url, description}`
//! records and never mutated afterwards.

mod loader;

pub use loader::{Registry, RegistryError, RegistryResult, ServerRecord};
