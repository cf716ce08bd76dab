//! In-memory endpoint for testing
//!
//! `MockConnector` hands out transports to a scripted `MockEndpoint` and
//! counts connects, releases and concurrent tool calls so tests can assert
//! on the session lifecycle without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use super::error::{SessionError, SessionResult};
use super::transport::{Connector, ToolReply, Transport};
use crate::types::Tool;

/// Scripted endpoint behaviour
#[derive(Debug, Clone, Default)]
pub struct MockEndpoint {
    tools: Vec<Tool>,
    instruction: Option<String>,
    replies: HashMap<String, ToolReply>,
    arithmetic: bool,
    call_delay: Option<Duration>,
    handshake_delay: Option<Duration>,
    release_delay: Option<Duration>,
    fail_connect: bool,
    fail_handshake: bool,
    fail_list_tools: bool,
    fail_release: bool,
}

fn binary_number_tool(name: &str, description: &str) -> Tool {
    Tool::new(name, description).with_schema(json!({
        "type": "object",
        "properties": {
            "a": { "type": "number", "description": "First operand" },
            "b": { "type": "number", "description": "Second operand" }
        },
        "required": ["a", "b"]
    }))
}

impl MockEndpoint {
    /// Endpoint with no tools and no instruction
    pub fn new() -> Self {
        Self::default()
    }

    /// Arithmetic endpoint: add, subtract, multiply, divide over numbers
    pub fn math() -> Self {
        Self {
            tools: vec![
                binary_number_tool("add", "Add two numbers"),
                binary_number_tool("subtract", "Subtract b from a"),
                binary_number_tool("multiply", "Multiply two numbers"),
                binary_number_tool("divide", "Divide a by b"),
            ],
            instruction: Some(
                "You are a helpful mathematical assistant. Use one tool call at a time."
                    .to_string(),
            ),
            arithmetic: true,
            ..Self::default()
        }
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Fixed reply for `tool`, overriding any computed one
    pub fn with_reply(mut self, tool: impl Into<String>, reply: ToolReply) -> Self {
        self.replies.insert(tool.into(), reply);
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Make every prompt fetch fail
    pub fn without_instruction(mut self) -> Self {
        self.instruction = None;
        self
    }

    /// Hold each tool call open for `delay` before replying
    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = Some(delay);
        self
    }

    /// Hold the initialize exchange open for `delay`
    pub fn with_handshake_delay(mut self, delay: Duration) -> Self {
        self.handshake_delay = Some(delay);
        self
    }

    /// Take `delay` to release; a release only counts once it completes
    pub fn with_release_delay(mut self, delay: Duration) -> Self {
        self.release_delay = Some(delay);
        self
    }

    pub fn fail_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn fail_handshake(mut self) -> Self {
        self.fail_handshake = true;
        self
    }

    pub fn fail_list_tools(mut self) -> Self {
        self.fail_list_tools = true;
        self
    }

    /// Make both release steps report a failure
    pub fn fail_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    fn reply(&self, name: &str, arguments: &Map<String, Value>) -> ToolReply {
        if let Some(reply) = self.replies.get(name) {
            return reply.clone();
        }
        if !self.tools.iter().any(|t| t.name == name) {
            return ToolReply::error(format!("Unknown tool: {}", name));
        }
        if self.arithmetic {
            if let Some(reply) = arithmetic_reply(name, arguments) {
                return reply;
            }
        }
        ToolReply::text(Value::Object(arguments.clone()).to_string())
    }
}

fn arithmetic_reply(name: &str, arguments: &Map<String, Value>) -> Option<ToolReply> {
    let operand = |key: &str| arguments.get(key).and_then(Value::as_f64);
    let (a, b) = match (operand("a"), operand("b")) {
        (Some(a), Some(b)) => (a, b),
        _ => return Some(ToolReply::error("Both 'a' and 'b' must be numbers")),
    };

    let value = match name {
        "add" => a + b,
        "subtract" => a - b,
        "multiply" => a * b,
        "divide" if b == 0.0 => return Some(ToolReply::error("Cannot divide by zero")),
        "divide" => a / b,
        _ => return None,
    };
    Some(ToolReply::text(format!("{:?}", value)))
}

/// Counters shared by every transport a `MockConnector` hands out
#[derive(Debug, Default)]
pub struct MockStats {
    connects: AtomicUsize,
    releases: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
    prompts: Mutex<Vec<String>>,
}

impl MockStats {
    /// Transports successfully connected
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Releases that ran to completion
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Highest number of tool calls observed in progress at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Every tool call received, in arrival order
    pub fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().clone()
    }

    /// Names of the prompts requested
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

/// Connector for a `MockEndpoint`
pub struct MockConnector {
    endpoint: Arc<MockEndpoint>,
    stats: Arc<MockStats>,
}

impl MockConnector {
    pub fn new(endpoint: MockEndpoint) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
            stats: Arc::new(MockStats::default()),
        }
    }

    pub fn stats(&self) -> &MockStats {
        &self.stats
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, url: &str) -> SessionResult<Box<dyn Transport>> {
        if self.endpoint.fail_connect {
            return Err(SessionError::connection(url, "connection refused"));
        }
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockTransport {
            url: url.to_string(),
            endpoint: Arc::clone(&self.endpoint),
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct MockTransport {
    url: String,
    endpoint: Arc<MockEndpoint>,
    stats: Arc<MockStats>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn initialize(&mut self) -> SessionResult<()> {
        if let Some(delay) = self.endpoint.handshake_delay {
            tokio::time::sleep(delay).await;
        }
        if self.endpoint.fail_handshake {
            return Err(SessionError::handshake(&self.url, "unexpected initialize response"));
        }
        Ok(())
    }

    async fn list_tools(&mut self) -> SessionResult<Vec<Tool>> {
        if self.endpoint.fail_list_tools {
            return Err(SessionError::Protocol("tools/list rejected".to_string()));
        }
        Ok(self.endpoint.tools.clone())
    }

    async fn get_prompt(&mut self, name: &str) -> SessionResult<String> {
        self.stats.prompts.lock().push(name.to_string());
        self.endpoint
            .instruction
            .clone()
            .ok_or_else(|| SessionError::Protocol(format!("prompt '{}' not found", name)))
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> SessionResult<ToolReply> {
        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.stats.calls.lock().push((name.to_string(), arguments.clone()));

        if let Some(delay) = self.endpoint.call_delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self.endpoint.reply(name, &arguments);

        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(reply)
    }

    async fn release(&mut self) -> Vec<String> {
        if let Some(delay) = self.endpoint.release_delay {
            tokio::time::sleep(delay).await;
        }
        self.stats.releases.fetch_add(1, Ordering::SeqCst);
        if self.endpoint.fail_release {
            vec![
                "closing stream: broken pipe".to_string(),
                "stopping client task: already finished".to_string(),
            ]
        } else {
            Vec::new()
        }
    }
}
