//! Operator commands typed on the terminal while a capture runs.
//!
//! Two commands, one per line, case-insensitive:
//!
//! - `G` (also `grab`, `capture`) - snapshot the current screen if it changed
//! - `Q` (also `quit`) - stop after the current decode step
//!
//! The reader runs as its own task and hands commands to the run loop over a
//! channel, so decoding never waits on the keyboard.

use log::{debug, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Capture,
    Quit,
}

impl Command {
    /// Parse one input line. Blank or unknown lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_uppercase().as_str() {
            "G" | "GRAB" | "CAPTURE" => Some(Command::Capture),
            "Q" | "QUIT" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Spawn a task reading commands from `input` until QUIT, end of input, or
/// the receiving side going away.
pub fn spawn_command_reader<R>(input: R, tx: mpsc::UnboundedSender<Command>) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = input.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Command input closed");
                    break;
                }
                Err(e) => {
                    warn!("Command input error: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let Some(cmd) = Command::parse(&line) else {
                warn!("Unknown command '{}' ([G]rab current, [Q]uit)", line.trim());
                continue;
            };
            if tx.send(cmd).is_err() {
                break;
            }
            if cmd == Command::Quit {
                break;
            }
        }
    })
}

/// Command reader on the process stdin.
pub fn spawn_stdin_reader(tx: mpsc::UnboundedSender<Command>) -> JoinHandle<()> {
    spawn_command_reader(tokio::io::BufReader::new(tokio::io::stdin()), tx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_letters_any_case() {
        assert_eq!(Command::parse("g"), Some(Command::Capture));
        assert_eq!(Command::parse("G\r"), Some(Command::Capture));
        assert_eq!(Command::parse(" q "), Some(Command::Quit));
        assert_eq!(Command::parse("Quit"), Some(Command::Quit));
        assert_eq!(Command::parse("x"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[tokio::test]
    async fn reader_stops_after_quit() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let input: &'static [u8] = b"g\nbogus\n\nQ\ng\n";
        let handle = spawn_command_reader(input, tx);
        handle.await.unwrap();
        assert_eq!(rx.recv().await, Some(Command::Capture));
        assert_eq!(rx.recv().await, Some(Command::Quit));
        assert_eq!(rx.recv().await, None);
    }
}
