//! Query routing
//!
//! Asks the model to pick exactly one registered endpoint for a query.

mod selector;

pub use selector::{Router, NO_MATCH};
