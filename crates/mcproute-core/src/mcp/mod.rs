//! MCP session management
//!
//! A `Session` owns one connection to a tool-serving endpoint and guarantees
//! it is released exactly once. Connections come from a `Connector`:
//! `RmcpConnector` talks to real endpoints through the official rmcp SDK,
//! `MockConnector` is a scripted in-memory endpoint for tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcproute_core::mcp::{RmcpConnector, Session};
//!
//! let connector = RmcpConnector::new(logger.clone());
//! let answer = Session::scoped(&connector, "http://127.0.0.1:8000/mcp", logger, |session| async move {
//!     let catalog = session.fetch_catalog("math_assistant_instructions").await?;
//!     session.invoke("add", args).await
//! })
//! .await?;
//! ```

mod error;
mod mock;
mod rmcp_transport;
mod session;
mod transport;

pub use error::{SessionError, SessionResult};
pub use mock::{MockConnector, MockEndpoint, MockStats};
pub use rmcp_transport::RmcpConnector;
pub use session::{Catalog, Session, SessionState, FALLBACK_INSTRUCTION};
pub use transport::{Connector, ReplyContent, ToolReply, Transport};
