//! Provider trait definition

use async_trait::async_trait;

use super::error::ProviderResult;
use crate::types::{ChatMessage, Tool, ToolCall};

/// Model configuration for provider requests
#[derive(Debug, Clone)]
pub struct ProviderModelConfig {
    /// Model identifier, optionally prefixed with the provider (`openai/gpt-4o-mini`)
    pub model: String,
    /// Custom API base URL
    pub api_base: Option<String>,
}

impl ProviderModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_base: None,
        }
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }
}

/// Options for a single chat request
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Tools the model may call
    pub tools: Vec<Tool>,
    /// Whether the model may request several tool calls in one turn
    ///
    /// Advisory only: genai has no such request switch, so this is not sent.
    /// The agent dispatches tool calls one at a time whatever the model does.
    pub parallel_tool_calls: bool,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_parallel_tool_calls(mut self, allowed: bool) -> Self {
        self.parallel_tool_calls = allowed;
        self
    }
}

/// One model response: free text, tool-call requests, or both
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelTurn {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl ModelTurn {
    /// A turn that only carries text
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// A turn that requests tool calls
    pub fn calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: String::new(),
            tool_calls,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Convert into the assistant message recorded in the conversation
    pub fn into_message(self) -> ChatMessage {
        ChatMessage::assistant_with_calls(self.content, self.tool_calls)
    }
}

/// Provider trait for model implementations
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name (e.g., "openai", "mock")
    fn name(&self) -> &str;

    /// Run one chat completion over the full message history
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: ChatOptions,
    ) -> ProviderResult<ModelTurn>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_builder() {
        let options = ChatOptions::new()
            .with_temperature(0.0)
            .with_max_tokens(256)
            .with_tools(vec![Tool::new("add", "Add two numbers")]);

        assert_eq!(options.temperature, Some(0.0));
        assert_eq!(options.max_tokens, Some(256));
        assert_eq!(options.tools.len(), 1);
        assert!(!options.parallel_tool_calls);
    }

    #[test]
    fn test_model_turn_into_message() {
        let turn = ModelTurn::calls(vec![ToolCall::new("c1", "add", json!({"a": 1, "b": 2}))]);
        assert!(turn.has_tool_calls());

        let message = turn.into_message();
        assert_eq!(message.tool_calls()[0].id, "c1");
        assert!(!ModelTurn::text("3").has_tool_calls());
    }
}
