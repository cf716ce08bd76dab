//! Model-driven endpoint selection

use std::sync::Arc;

use crate::log_info;
use crate::logging::Logger;
use crate::providers::{ChatOptions, Provider, ProviderModelConfig, ProviderResult};
use crate::registry::{Registry, ServerRecord};
use crate::types::ChatMessage;

/// Literal the model is told to answer with when nothing fits
pub const NO_MATCH: &str = "None";

/// Picks the registered endpoint best suited to a query
///
/// One model call per query; the trimmed reply must equal a registered name
/// exactly (case-sensitive). Anything else, including `None`, is a miss.
pub struct Router {
    provider: Arc<dyn Provider>,
    model: ProviderModelConfig,
    temperature: f32,
    logger: Arc<dyn Logger>,
}

impl Router {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: ProviderModelConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider,
            model,
            temperature: 0.0,
            logger,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// System prompt enumerating every registered endpoint
    pub fn build_prompt(registry: &Registry) -> String {
        let server_descriptions = registry
            .iter()
            .map(|s| format!("- {}: {}", s.name, s.description))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are an MCP Router. Below is a list of available servers and their capabilities:\n\
             {}\n\n\
             Given the user's query, return ONLY the name of the most relevant server. \
             If none match, return '{}'.",
            server_descriptions, NO_MATCH
        )
    }

    /// Route `query` to a registered endpoint, or `None` on a miss
    ///
    /// An empty registry is not special-cased: the model is still asked and
    /// whatever it answers cannot match.
    pub async fn route(
        &self,
        registry: &Registry,
        query: &str,
    ) -> ProviderResult<Option<ServerRecord>> {
        let messages = vec![
            ChatMessage::system(Self::build_prompt(registry)),
            ChatMessage::user(query),
        ];
        let options = ChatOptions::new().with_temperature(self.temperature);

        let reply = self
            .provider
            .chat(messages, self.model.clone(), options)
            .await?;
        let target_name = reply.content.trim();

        let selected = registry.get(target_name).cloned();
        match &selected {
            Some(server) => log_info!(
                self.logger,
                "[Router] selected '{}' ({})",
                server.name,
                server.url
            ),
            None => log_info!(
                self.logger,
                "[Router] no registered server matches reply '{}'",
                target_name
            ),
        }
        Ok(selected)
    }
}
