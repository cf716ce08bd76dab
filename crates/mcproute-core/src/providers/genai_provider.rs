//! GenaiProvider - model access through the genai crate
//!
//! Handles every genai-supported provider (OpenAI, Anthropic, Gemini, Ollama,
//! ...) and OpenAI-compatible endpoints reached through a custom `api_base`.

use std::sync::Arc;

use async_trait::async_trait;
use genai::chat::ChatRequest;

use crate::logging::Logger;
use crate::secrets::SecretStore;
use crate::types::ChatMessage;

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    create_client, from_genai_response, to_genai_messages, to_genai_options, to_genai_tools,
};
use super::traits::{ChatOptions, ModelTurn, Provider, ProviderModelConfig};

/// Providers that run without an API key
const KEYLESS_PROVIDERS: &[&str] = &["ollama"];

/// Unified provider using genai for all supported model APIs
pub struct GenaiProvider {
    provider_id: String,
    secrets: Arc<dyn SecretStore>,
    logger: Arc<dyn Logger>,
}

impl GenaiProvider {
    pub fn new(
        provider_id: impl Into<String>,
        secrets: Arc<dyn SecretStore>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            secrets,
            logger,
        }
    }

    /// Extract provider ID from a model string (e.g., "openai/gpt-4" -> "openai")
    pub fn extract_provider(model: &str) -> Option<&str> {
        model.split_once('/').map(|(provider, _)| provider)
    }

    /// Extract model name from a model string (e.g., "openai/gpt-4" -> "gpt-4")
    pub fn extract_model_name(model: &str) -> &str {
        model.split_once('/').map(|(_, name)| name).unwrap_or(model)
    }
}

#[async_trait]
impl Provider for GenaiProvider {
    fn name(&self) -> &str {
        &self.provider_id
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model_config: ProviderModelConfig,
        options: ChatOptions,
    ) -> ProviderResult<ModelTurn> {
        let model_name = Self::extract_model_name(&model_config.model);
        self.logger.debug(&format!(
            "[GenaiProvider] chat: provider={}, model={}, messages={}, tools={}",
            self.provider_id,
            model_name,
            messages.len(),
            options.tools.len()
        ));

        // A custom api_base may be a keyless local server; let it through
        if model_config.api_base.is_none()
            && !KEYLESS_PROVIDERS.contains(&self.provider_id.as_str())
            && !self.secrets.has(&self.provider_id)
        {
            return Err(ProviderError::missing_api_key(&self.provider_id));
        }

        let client = create_client(
            &self.provider_id,
            model_config.api_base.clone(),
            Arc::clone(&self.secrets),
        );

        let mut chat_req = ChatRequest::new(to_genai_messages(messages)?);
        if !options.tools.is_empty() {
            chat_req = chat_req.with_tools(to_genai_tools(options.tools.clone()));
        }
        let genai_options = to_genai_options(&options);

        let response = client
            .exec_chat(model_name, chat_req, Some(&genai_options))
            .await
            .map_err(|e| {
                self.logger
                    .error(&format!("[GenaiProvider] request failed: {}", e));
                ProviderError::api_error(&self.provider_id, e.to_string())
            })?;

        let turn = from_genai_response(response);
        self.logger.debug(&format!(
            "[GenaiProvider] response: {} chars, {} tool call(s)",
            turn.content.len(),
            turn.tool_calls.len()
        ));
        Ok(turn)
    }
}
