//! Transport seam between a session and a concrete endpoint

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::error::SessionResult;
use crate::types::Tool;

/// One content item of a tool reply
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyContent {
    Text(String),
    /// Image, audio, resource... carries the kind for diagnostics
    Other(String),
}

/// Raw reply to a `tools/call` request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolReply {
    pub content: Vec<ReplyContent>,
    pub is_error: bool,
}

impl ToolReply {
    /// Single text item, not an error
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ReplyContent::Text(text.into())],
            is_error: false,
        }
    }

    /// Single text item flagged as an error
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ReplyContent::Text(text.into())],
            is_error: true,
        }
    }

    /// Text of the first content item, if it is text
    pub fn first_text(&self) -> Option<&str> {
        match self.content.first() {
            Some(ReplyContent::Text(text)) => Some(text),
            _ => None,
        }
    }
}

/// Opens transports to endpoint URLs
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish the transport; no protocol traffic yet
    async fn connect(&self, url: &str) -> SessionResult<Box<dyn Transport>>;
}

/// An established transport to one endpoint
///
/// Owned exclusively by a `Session`, which calls `release` at most once.
#[async_trait]
pub trait Transport: Send {
    /// Protocol initialize exchange
    async fn initialize(&mut self) -> SessionResult<()>;

    /// Every tool the endpoint exposes, in endpoint order
    async fn list_tools(&mut self) -> SessionResult<Vec<Tool>>;

    /// Text of the named prompt
    async fn get_prompt(&mut self, name: &str) -> SessionResult<String>;

    async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>)
        -> SessionResult<ToolReply>;

    /// Release every held resource, attempting all steps
    ///
    /// Returns one message per failed step; empty on a clean release.
    async fn release(&mut self) -> Vec<String>;
}
