//! Core types for model interactions
//!
//! Shared by the providers, the agent loop and the tool adapters.

mod message;
mod tool;

pub use message::{ChatMessage, MessageRole};
pub use tool::{Tool, ToolCall, ToolResult};
