//! Append-only message history

use serde::Serialize;

use super::error::{AgentError, AgentResult};
use crate::providers::ModelTurn;
use crate::types::{ChatMessage, ToolResult};

/// Message history of one agent run
///
/// Every tool call an assistant turn requests must be answered by exactly
/// one tool result carrying the same id before anything else is appended.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    #[serde(skip)]
    pending: Vec<String>,
}

impl Conversation {
    /// Seed with the system instruction and the user query
    pub fn new(instruction: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(instruction), ChatMessage::user(query)],
            pending: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Ids of tool calls still awaiting a result
    pub fn pending_calls(&self) -> &[String] {
        &self.pending
    }

    /// True when no tool call is awaiting a result
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    fn ensure_settled(&self) -> AgentResult<()> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(AgentError::PendingToolCalls(self.pending.len()))
        }
    }

    /// Record a model turn
    pub fn push_turn(&mut self, turn: ModelTurn) -> AgentResult<()> {
        self.ensure_settled()?;
        self.pending = turn.tool_calls.iter().map(|c| c.id.clone()).collect();
        self.messages.push(turn.into_message());
        Ok(())
    }

    /// Record the result of an outstanding tool call
    pub fn push_tool_result(&mut self, result: ToolResult) -> AgentResult<()> {
        let index = self
            .pending
            .iter()
            .position(|id| *id == result.call_id)
            .ok_or_else(|| AgentError::UnmatchedToolResult {
                call_id: result.call_id.clone(),
            })?;
        self.pending.remove(index);
        self.messages.push(ChatMessage::tool_result(result));
        Ok(())
    }

    /// Snapshot handed to the model; fails while tool calls are unanswered
    pub fn request_messages(&self) -> AgentResult<Vec<ChatMessage>> {
        self.ensure_settled()?;
        Ok(self.messages.clone())
    }
}
