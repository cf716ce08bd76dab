//! In-memory logger that keeps every line it receives

use parking_lot::Mutex;

use super::traits::{LogLevel, Logger};

/// Logger that records `(level, message)` pairs
///
/// Used by tests to tell failure paths apart, e.g. the instruction
/// fallback (a warning) versus a failed connection (an error).
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().clone()
    }

    /// Whether any line at `level` contains `needle`
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lines
            .lock()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.lines.lock().push((level, message.to_string()));
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LoggerExt;

    #[test]
    fn test_memory_logger_records_levels() {
        let logger = MemoryLogger::new();
        logger.info("[Session] connected");
        logger.log(LogLevel::Warn, "[Session] prompt missing");

        assert_eq!(logger.lines().len(), 2);
        assert!(logger.contains(LogLevel::Warn, "prompt missing"));
        assert!(!logger.contains(LogLevel::Error, "prompt missing"));
    }
}
