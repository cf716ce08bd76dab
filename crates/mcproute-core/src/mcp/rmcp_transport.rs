//! MCP transport using the official rmcp SDK
//!
//! Connects to endpoints over HTTP (Streamable HTTP transport) or a Unix
//! socket (`unix:///path/to.sock`).

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::{
    model::{
        CallToolRequestParams, ClientCapabilities, ClientInfo, GetPromptRequestParams,
        Implementation, PromptMessageContent, RawContent,
    },
    service::{ClientInitializeError, RunningService},
    transport::StreamableHttpClientTransport,
    RoleClient, ServiceExt,
};
use serde_json::{Map, Value};

#[cfg(unix)]
use tokio::net::UnixStream;

use super::error::{SessionError, SessionResult};
use super::transport::{Connector, ReplyContent, ToolReply, Transport};
use crate::logging::Logger;
use crate::types::Tool;

const UNIX_SCHEME: &str = "unix://";

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "mcproute".to_string(),
            title: Some("mcproute".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// Transport-level failures never reached the server; everything else did
fn classify_init_error(url: &str, err: ClientInitializeError) -> SessionError {
    match &err {
        ClientInitializeError::TransportError { .. } => {
            SessionError::connection(url, err.to_string())
        }
        _ => SessionError::handshake(url, err.to_string()),
    }
}

/// Connector for real MCP endpoints
pub struct RmcpConnector {
    logger: Arc<dyn Logger>,
}

impl RmcpConnector {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl Connector for RmcpConnector {
    async fn connect(&self, url: &str) -> SessionResult<Box<dyn Transport>> {
        let pending = if let Some(path) = url.strip_prefix(UNIX_SCHEME) {
            connect_unix(url, path, &self.logger).await?
        } else if url.starts_with("http://") || url.starts_with("https://") {
            reqwest::Url::parse(url).map_err(|e| SessionError::connection(url, e.to_string()))?;
            self.logger
                .info(&format!("[RmcpConnector] connecting to HTTP: {}", url));
            PendingTransport::Http(StreamableHttpClientTransport::from_uri(url))
        } else {
            return Err(SessionError::connection(
                url,
                "unsupported scheme (expected http://, https:// or unix://)",
            ));
        };

        Ok(Box::new(RmcpTransport {
            url: url.to_string(),
            pending: Some(pending),
            client: None,
            logger: Arc::clone(&self.logger),
        }))
    }
}

#[cfg(unix)]
async fn connect_unix(
    url: &str,
    path: &str,
    logger: &Arc<dyn Logger>,
) -> SessionResult<PendingTransport> {
    logger.info(&format!("[RmcpConnector] connecting to Unix socket: {}", path));
    let stream = UnixStream::connect(path)
        .await
        .map_err(|e| SessionError::connection(url, e.to_string()))?;
    Ok(PendingTransport::Unix(stream))
}

#[cfg(not(unix))]
async fn connect_unix(
    url: &str,
    _path: &str,
    _logger: &Arc<dyn Logger>,
) -> SessionResult<PendingTransport> {
    Err(SessionError::connection(
        url,
        "unix sockets are not supported on this platform",
    ))
}

/// Transport established but not yet initialized
enum PendingTransport {
    Http(StreamableHttpClientTransport<reqwest::Client>),
    #[cfg(unix)]
    Unix(UnixStream),
}

/// One rmcp client connection
struct RmcpTransport {
    url: String,
    pending: Option<PendingTransport>,
    client: Option<RunningService<RoleClient, ClientInfo>>,
    logger: Arc<dyn Logger>,
}

impl RmcpTransport {
    fn client(&self) -> SessionResult<&RunningService<RoleClient, ClientInfo>> {
        self.client
            .as_ref()
            .ok_or_else(|| SessionError::Protocol("client is not initialized".to_string()))
    }
}

#[async_trait]
impl Transport for RmcpTransport {
    async fn initialize(&mut self) -> SessionResult<()> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| SessionError::handshake(&self.url, "already initialized"))?;

        let client = match pending {
            PendingTransport::Http(transport) => client_info().serve(transport).await,
            #[cfg(unix)]
            PendingTransport::Unix(stream) => client_info().serve(stream).await,
        }
        .map_err(|e| classify_init_error(&self.url, e))?;

        if let Some(info) = client.peer_info() {
            self.logger.info(&format!(
                "[RmcpTransport] initialized with {} {}",
                info.server_info.name, info.server_info.version
            ));
        }
        self.client = Some(client);
        Ok(())
    }

    async fn list_tools(&mut self) -> SessionResult<Vec<Tool>> {
        let tools = self
            .client()?
            .list_all_tools()
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))?;

        Ok(tools
            .into_iter()
            .map(|tool| Tool {
                name: tool.name.to_string(),
                description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
                input_schema: Some(Value::Object(tool.input_schema.as_ref().clone())),
            })
            .collect())
    }

    async fn get_prompt(&mut self, name: &str) -> SessionResult<String> {
        let params = GetPromptRequestParams {
            meta: None,
            name: name.to_string(),
            arguments: None,
        };
        let result = self
            .client()?
            .get_prompt(params)
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))?;

        result
            .messages
            .into_iter()
            .find_map(|message| match message.content {
                PromptMessageContent::Text { text } => Some(text),
                _ => None,
            })
            .ok_or_else(|| SessionError::Protocol(format!("prompt '{}' has no text message", name)))
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> SessionResult<ToolReply> {
        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: Some(arguments),
            task: None,
        };

        let result = self
            .client()?
            .call_tool(params)
            .await
            .map_err(|e| SessionError::tool_invocation(name, e.to_string()))?;

        // Content is Annotated<RawContent>; `.raw` holds the payload
        let content = result
            .content
            .iter()
            .map(|c| match &c.raw {
                RawContent::Text(t) => ReplyContent::Text(t.text.clone()),
                RawContent::Image(_) => ReplyContent::Other("image".to_string()),
                RawContent::Audio(_) => ReplyContent::Other("audio".to_string()),
                _ => ReplyContent::Other("resource".to_string()),
            })
            .collect();

        Ok(ToolReply {
            content,
            is_error: result.is_error.unwrap_or(false),
        })
    }

    async fn release(&mut self) -> Vec<String> {
        let mut failures = Vec::new();
        // Never initialized: dropping the raw transport closes it
        self.pending = None;

        if let Some(client) = self.client.take() {
            self.logger
                .info(&format!("[RmcpTransport] closing connection to {}", self.url));
            if let Err(e) = client.cancel().await {
                failures.push(format!("stopping client task: {}", e));
            }
        }
        failures
    }
}
