//! Logging abstractions for runtime-agnostic logging
//!
//! Every component takes an `Arc<dyn Logger>` so the CLI can print to the
//! console while tests stay silent or capture lines for assertions.

mod traits;
mod noop;
mod console;
mod memory;

pub use traits::{Logger, LoggerExt, LogLevel, SharedLogger};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
pub use memory::MemoryLogger;
