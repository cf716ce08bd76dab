//! Tool error types

use thiserror::Error;

use crate::mcp::SessionError;

/// Errors raised by a tool action
#[derive(Error, Debug)]
pub enum ToolError {
    /// Arguments did not match the declared parameters; nothing was sent
    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The remote call went through the session and failed there
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A local tool rejected valid arguments (e.g. division by zero)
    #[error("Tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
}

impl ToolError {
    pub fn invalid_arguments(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    pub fn execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

pub type ActionResult<T> = Result<T, ToolError>;
