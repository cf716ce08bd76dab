//! mcproute core
//!
//! Routes a natural-language query to one of several registered MCP
//! endpoints, opens a session with it, and runs a bounded tool-use
//! conversation with a language model until it produces an answer.
//!
//! ## Flow
//!
//! ```text
//! Registry ──► Router ──► Session::scoped ──► fetch_catalog ──► ToolAction::adapt
//!                                 │                                    │
//!                                 └──────── close ◄──── Agent::run ◄───┘
//! ```
//!
//! ```rust,ignore
//! use mcproute_core::{QueryPipeline, Registry, RmcpConnector, create_provider};
//!
//! let registry = Registry::load("servers.json")?;
//! let provider = create_provider("openai", secrets, logger.clone());
//! let pipeline = QueryPipeline::from_config(&config, registry, provider,
//!     Arc::new(RmcpConnector::new(logger.clone())), logger);
//!
//! match pipeline.run("What is 12 * 7?").await {
//!     QueryOutcome::Answered { answer, .. } => println!("{answer}"),
//!     other => eprintln!("{other:?}"),
//! }
//! ```

pub mod agent;
pub mod config;
pub mod logging;
pub mod mcp;
pub mod pipeline;
pub mod providers;
pub mod registry;
pub mod router;
pub mod secrets;
pub mod tools;
pub mod types;

// Re-export commonly used types
pub use types::{ChatMessage, MessageRole, Tool, ToolCall, ToolResult};

pub use secrets::{ChainSecretStore, EnvSecretStore, MemorySecretStore, SecretStore};

pub use logging::{ConsoleLogger, LogLevel, Logger, MemoryLogger, NoOpLogger};

pub use config::{AppConfig, ConfigError, ConfigFile};

pub use providers::{create_provider, GenaiProvider, MockProvider, Provider, ProviderError};

pub use registry::{Registry, RegistryError, ServerRecord};

pub use router::Router;

pub use mcp::{
    Catalog, Connector, MockConnector, MockEndpoint, RmcpConnector, Session, SessionError,
    SessionState,
};

pub use tools::{LocalTool, ToolAction, ToolError, ToolHandler, ToolMetadata, ToolSchema};

pub use agent::{Agent, AgentError, AgentOptions, AgentOutcome, AgentState};

pub use pipeline::{PipelineEvent, QueryOutcome, QueryPipeline};
