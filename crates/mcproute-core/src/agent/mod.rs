//! Conversation loop
//!
//! The agent alternates between asking the model (`Thinking`) and executing
//! the tool calls it requested (`Dispatching`) until the model answers in
//! plain text (`Done`) or the turn limit is hit (`Aborted`).

mod conversation;
mod error;
mod runner;

pub use conversation::Conversation;
pub use error::{AgentError, AgentResult};
pub use runner::{Agent, AgentOptions, AgentOutcome, AgentState};
