//! Per-query orchestration
//!
//! route -> open scoped session -> fetch catalog -> adapt tools -> run agent
//! -> close session. Failures are caught here and reported as a
//! `QueryOutcome`; nothing past registry loading ends the process.

mod query;

pub use query::{PipelineEvent, QueryError, QueryOutcome, QueryPipeline};
