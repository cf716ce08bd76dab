//! Model provider implementations
//!
//! ## Architecture
//!
//! All real providers go through the `genai` crate, which handles the
//! provider-specific protocols and tool calling. Providers not native to genai
//! are reached through its `ServiceTargetResolver` with the OpenAI-compatible
//! adapter. Auth flows through our `SecretStore` chain.
//!
//! The `MockProvider` is kept for testing purposes.

mod traits;
mod error;
mod genai_adapter;
mod genai_provider;
mod mock;

pub use traits::{ChatOptions, ModelTurn, Provider, ProviderModelConfig};
pub use error::{ProviderError, ProviderResult};

pub use genai_provider::GenaiProvider;

pub use mock::{MockMode, MockProvider, RecordedRequest};

use std::sync::Arc;

use crate::logging::Logger;
use crate::secrets::SecretStore;

/// Create a provider for the given provider ID
///
/// `mock` yields an echoing `MockProvider`; everything else goes to genai.
pub fn create_provider(
    provider_id: &str,
    secrets: Arc<dyn SecretStore>,
    logger: Arc<dyn Logger>,
) -> Arc<dyn Provider> {
    match provider_id.to_lowercase().as_str() {
        "mock" => Arc::new(MockProvider::echo(logger)),
        _ => Arc::new(GenaiProvider::new(provider_id, secrets, logger)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::secrets::MemorySecretStore;

    #[test]
    fn test_create_provider() {
        let secrets: Arc<dyn SecretStore> = Arc::new(MemorySecretStore::new());
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);

        assert_eq!(create_provider("mock", Arc::clone(&secrets), Arc::clone(&logger)).name(), "mock");
        assert_eq!(create_provider("openai", secrets, logger).name(), "openai");
    }
}
