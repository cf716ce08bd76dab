//! Session error types

use thiserror::Error;

use super::session::SessionState;

/// Errors raised while talking to a tool-serving endpoint
#[derive(Error, Debug)]
pub enum SessionError {
    /// The transport could not be established
    #[error("Connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    /// The transport came up but the initialize exchange did not complete
    #[error("Handshake with {url} failed: {message}")]
    Handshake { url: String, message: String },

    /// Operation attempted outside the `Ready` state
    #[error("Session is not ready (state: {state})")]
    NotReady { state: SessionState },

    /// Remote tool failed, reported an error, or returned no usable text
    #[error("Tool '{tool}' failed: {message}")]
    ToolInvocation { tool: String, message: String },

    /// A listing request was rejected by the endpoint
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The caller gave up before the session finished; it was closed anyway
    #[error("Session with {url} interrupted")]
    Interrupted { url: String },

    /// One or more release steps failed while closing
    #[error("Teardown failed: {}", .0.join("; "))]
    Teardown(Vec<String>),
}

impl SessionError {
    pub fn connection(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn handshake(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handshake {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn tool_invocation(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolInvocation {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Whether the endpoint was never reached (connect or handshake failure)
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Handshake { .. })
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
