//! Line-oriented query input

use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Resolves on Ctrl-C
///
/// Never resolves if the handler cannot be installed, so the caller keeps
/// running instead of treating that as an interrupt.
pub async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Whether `input` asks to leave the loop (`exit` / `quit`, any case)
pub fn is_exit(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "exit" | "quit")
}

/// Reads queries from stdin until EOF or an exit word
pub struct QueryReader {
    lines: Lines<BufReader<Stdin>>,
}

impl QueryReader {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Next non-empty query, or `None` when the user is done
    pub async fn next_query(&mut self, prompt: &str) -> io::Result<Option<String>> {
        loop {
            print!("{}", prompt);
            io::stdout().flush()?;

            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if is_exit(query) {
                return Ok(None);
            }
            return Ok(Some(query.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_words() {
        for word in ["exit", "quit", "EXIT", " Quit "] {
            assert!(is_exit(word), "{word}");
        }
        for word in ["", "exit now", "q", "What is 2 + 2?"] {
            assert!(!is_exit(word), "{word}");
        }
    }
}
