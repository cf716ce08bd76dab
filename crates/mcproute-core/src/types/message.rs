//! Chat message types

use serde::{Deserialize, Serialize};

use super::tool::{ToolCall, ToolResult};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// A chat message exchanged with the model
///
/// Each shape is its own variant so callers branch exhaustively instead of
/// probing for optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    /// System instruction
    System { content: String },
    /// End-user input
    User { content: String },
    /// Model turn, possibly requesting tool calls
    Assistant {
        content: String,
        #[serde(default, rename = "toolCalls", skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// Result of one tool call, echoing the call id
    Tool(ToolResult),
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage::System {
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }

    /// Create a plain-text assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Create an assistant message carrying tool-call requests
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        ChatMessage::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    /// Create a tool result message
    pub fn tool_result(result: ToolResult) -> Self {
        ChatMessage::Tool(result)
    }

    /// Role of this message
    pub fn role(&self) -> MessageRole {
        match self {
            ChatMessage::System { .. } => MessageRole::System,
            ChatMessage::User { .. } => MessageRole::User,
            ChatMessage::Assistant { .. } => MessageRole::Assistant,
            ChatMessage::Tool(_) => MessageRole::Tool,
        }
    }

    /// Text carried by the message
    pub fn text(&self) -> &str {
        match self {
            ChatMessage::System { content }
            | ChatMessage::User { content }
            | ChatMessage::Assistant { content, .. } => content,
            ChatMessage::Tool(result) => &result.content,
        }
    }

    /// Tool calls requested by this message (empty unless an assistant turn asked for tools)
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            ChatMessage::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_message_creation() {
        let sys = ChatMessage::system("You are helpful");
        assert_eq!(sys.role(), MessageRole::System);
        assert_eq!(sys.text(), "You are helpful");

        let user = ChatMessage::user("What is 2 + 3?");
        assert_eq!(user.role(), MessageRole::User);
        assert!(user.tool_calls().is_empty());

        let call = ToolCall::new("call_1", "add", json!({"a": 2, "b": 3}));
        let asst = ChatMessage::assistant_with_calls("", vec![call]);
        assert_eq!(asst.role(), MessageRole::Assistant);
        assert_eq!(asst.tool_calls().len(), 1);

        let tool = ChatMessage::tool_result(ToolResult::success("call_1", "5.0"));
        assert_eq!(tool.role(), MessageRole::Tool);
        assert_eq!(tool.text(), "5.0");
    }

    #[test]
    fn test_message_serialization() {
        let msg = ChatMessage::user("Hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"content\":\"Hello\""));

        let plain = serde_json::to_string(&ChatMessage::assistant("done")).unwrap();
        assert!(!plain.contains("toolCalls"));
    }
}
