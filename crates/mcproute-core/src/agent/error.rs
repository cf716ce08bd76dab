//! Agent error types

use thiserror::Error;

use crate::providers::ProviderError;

#[derive(Error, Debug)]
pub enum AgentError {
    /// The model kept requesting tools past the configured limit
    #[error("Turn limit of {max_turns} exceeded without a final answer")]
    TurnLimitExceeded { max_turns: usize },

    /// A model turn carried neither text nor tool calls
    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A tool result did not answer an outstanding call
    #[error("Tool result '{call_id}' does not match an outstanding tool call")]
    UnmatchedToolResult { call_id: String },

    /// A new turn was recorded while tool calls were still unanswered
    #[error("{0} tool call(s) still awaiting results")]
    PendingToolCalls(usize),
}

pub type AgentResult<T> = Result<T, AgentError>;
