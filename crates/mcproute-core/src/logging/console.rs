//! Console logger implementation

use super::traits::{LogLevel, Logger};

/// A logger that writes diagnostics to stderr
///
/// Stdout is left to the REPL so progress lines and answers are not
/// interleaved with diagnostics.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
    min_level: LogLevel,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    /// Create a new console logger with default prefix, showing warnings and errors
    pub fn new() -> Self {
        Self {
            prefix: "[mcproute]".to_string(),
            min_level: LogLevel::Warn,
        }
    }

    /// Create a console logger with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::new()
        }
    }

    /// Set the minimum level that gets printed
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    fn emit(&self, level: LogLevel, message: &str) {
        if level >= self.min_level {
            eprintln!("{} {}: {}", self.prefix, level, message);
        }
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        self.emit(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.emit(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.emit(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.emit(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_logger_creation() {
        let logger = ConsoleLogger::new();
        assert_eq!(logger.prefix, "[mcproute]");
        assert_eq!(logger.min_level, LogLevel::Warn);

        let custom = ConsoleLogger::with_prefix("[probe]").with_level(LogLevel::Debug);
        assert_eq!(custom.prefix, "[probe]");
        assert_eq!(custom.min_level, LogLevel::Debug);
    }

    #[test]
    fn test_console_logger_logs() {
        let logger = ConsoleLogger::new().with_level(LogLevel::Debug);
        logger.debug("debug message");
        logger.info("info message");
        logger.warn("warn message");
        logger.error("error message");
    }
}
