//! Capability adapter
//!
//! Turns tool descriptors published by an endpoint into invocable actions:
//!
//! ```text
//!   Catalog (ToolMetadata)  ──adapt──►  ToolAction ──validate──► Session::invoke
//!   LocalTool (add, ...)    ───────────────────────validate──► in-process
//! ```
//!
//! Both kinds implement `ToolHandler`, which is all the agent sees.

mod action;
mod error;
mod local;
mod schema;

pub use action::{ToolAction, ToolHandler};
pub use error::{ActionResult, ToolError};
pub use local::{LocalTool, Operation, LOCAL_MATH_INSTRUCTION};
pub use schema::{ParamKind, ParamSpec, ToolMetadata, ToolSchema};
