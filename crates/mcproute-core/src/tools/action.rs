//! Invocable tools

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::error::ActionResult;
use super::schema::ToolMetadata;
use crate::mcp::Session;

/// A tool the agent can dispatch a call to
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn metadata(&self) -> &ToolMetadata;

    /// Validate `arguments` and run the tool, returning its text result
    async fn call(&self, arguments: &Value) -> ActionResult<String>;

    fn name(&self) -> &str {
        &self.metadata().name
    }
}

/// Remote tool bound to an open session
pub struct ToolAction {
    metadata: ToolMetadata,
    session: Arc<Session>,
}

impl ToolAction {
    /// Bind `metadata` to `session`
    ///
    /// Calls made after the session closes fail with `SessionError::NotReady`.
    pub fn adapt(metadata: ToolMetadata, session: Arc<Session>) -> Self {
        Self { metadata, session }
    }

    /// Adapt every tool of a catalog
    pub fn adapt_all(
        tools: impl IntoIterator<Item = ToolMetadata>,
        session: &Arc<Session>,
    ) -> Vec<Arc<dyn ToolHandler>> {
        tools
            .into_iter()
            .map(|metadata| Arc::new(Self::adapt(metadata, Arc::clone(session))) as Arc<dyn ToolHandler>)
            .collect()
    }
}

#[async_trait]
impl ToolHandler for ToolAction {
    fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    async fn call(&self, arguments: &Value) -> ActionResult<String> {
        let validated = self.metadata.schema.validate(&self.metadata.name, arguments)?;
        Ok(self.session.invoke(&self.metadata.name, validated).await?)
    }
}
