//! API key lookup for model providers
//!
//! - `SecretStore` trait for pluggable read-only key sources
//! - `EnvSecretStore`: process environment (including anything `.env` loaded)
//! - `MemorySecretStore`: explicit keys from the config file, and tests
//! - `ChainSecretStore`: first hit wins across several stores

mod traits;
mod env_store;
mod memory_store;
mod chain_store;

pub use traits::SecretStore;
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;
pub use chain_store::ChainSecretStore;
