//! Mock provider for testing
//!
//! Deterministic responses without network access. Every request is recorded
//! so tests can assert on what the router or the agent actually sent.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatOptions, ModelTurn, Provider, ProviderModelConfig};
use crate::logging::Logger;
use crate::types::ChatMessage;

/// Mock response mode
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Reply with the last user message, verbatim
    Echo,
    /// Reply with the same text every time
    Fixed(String),
    /// Pop one scripted turn per call; fails once the script runs out
    Scripted(VecDeque<ModelTurn>),
    /// Fail every call with this message
    Error(String),
}

impl Default for MockMode {
    fn default() -> Self {
        MockMode::Echo
    }
}

/// A request as the mock received it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub options: ChatOptions,
}

/// Mock model provider
pub struct MockProvider {
    mode: Mutex<MockMode>,
    requests: Mutex<Vec<RecordedRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    pub fn with_mode(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        Self {
            mode: Mutex::new(mode),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Provider that echoes the last user message
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Echo, logger)
    }

    /// Provider with a fixed text response
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Fixed(response.into()), logger)
    }

    /// Provider that plays back `turns` in order
    pub fn scripted(turns: Vec<ModelTurn>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Scripted(turns.into()), logger)
    }

    /// Provider whose every call fails
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Error(message.into()), logger)
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Scripted turns not consumed yet
    pub fn remaining_turns(&self) -> usize {
        match &*self.mode.lock() {
            MockMode::Scripted(turns) => turns.len(),
            _ => 0,
        }
    }

    fn last_user_message(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .rev()
            .find_map(|msg| match msg {
                ChatMessage::User { content } => Some(content.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: ChatOptions,
    ) -> ProviderResult<ModelTurn> {
        self.logger.debug(&format!(
            "[MockProvider] chat called with {} messages",
            messages.len()
        ));

        let turn = match &mut *self.mode.lock() {
            MockMode::Echo => Ok(ModelTurn::text(Self::last_user_message(&messages))),
            MockMode::Fixed(response) => Ok(ModelTurn::text(response.clone())),
            MockMode::Scripted(turns) => turns.pop_front().ok_or_else(|| {
                ProviderError::invalid_response("mock", "scripted turns exhausted")
            }),
            MockMode::Error(message) => Err(ProviderError::api_error("mock", message.clone())),
        };

        self.requests.lock().push(RecordedRequest {
            messages,
            model: model.model,
            options,
        });

        turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::ToolCall;
    use serde_json::json;

    fn test_logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger)
    }

    fn test_config() -> ProviderModelConfig {
        ProviderModelConfig::new("mock/mock-model")
    }

    #[tokio::test]
    async fn test_echo_mode() {
        let provider = MockProvider::echo(test_logger());
        let turn = provider
            .chat(
                vec![ChatMessage::system("route"), ChatMessage::user("Math")],
                test_config(),
                ChatOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(turn, ModelTurn::text("Math"));
        assert_eq!(provider.request_count(), 1);
        assert_eq!(provider.requests()[0].model, "mock/mock-model");
    }

    #[tokio::test]
    async fn test_fixed_mode() {
        let provider = MockProvider::fixed("None", test_logger());
        for _ in 0..2 {
            let turn = provider
                .chat(vec![ChatMessage::user("x")], test_config(), ChatOptions::default())
                .await
                .unwrap();
            assert_eq!(turn.content, "None");
        }
        assert_eq!(provider.request_count(), 2);
    }

    #[tokio::test]
    async fn test_scripted_mode() {
        let provider = MockProvider::scripted(
            vec![
                ModelTurn::calls(vec![ToolCall::new("c1", "add", json!({"a": 1, "b": 2}))]),
                ModelTurn::text("3"),
            ],
            test_logger(),
        );

        let first = provider
            .chat(vec![ChatMessage::user("1+2")], test_config(), ChatOptions::default())
            .await
            .unwrap();
        assert!(first.has_tool_calls());
        assert_eq!(provider.remaining_turns(), 1);

        let second = provider
            .chat(vec![ChatMessage::user("1+2")], test_config(), ChatOptions::default())
            .await
            .unwrap();
        assert_eq!(second.content, "3");

        let exhausted = provider
            .chat(vec![ChatMessage::user("1+2")], test_config(), ChatOptions::default())
            .await;
        assert!(matches!(exhausted, Err(ProviderError::InvalidResponse { .. })));
    }

    #[tokio::test]
    async fn test_error_mode() {
        let provider = MockProvider::error("rate limited", test_logger());
        let result = provider
            .chat(vec![ChatMessage::user("x")], test_config(), ChatOptions::default())
            .await;

        assert!(matches!(result, Err(ProviderError::ApiError { .. })));
        assert_eq!(provider.request_count(), 1);
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(MockProvider::echo(test_logger()).name(), "mock");
    }
}
