//! Logging helpers for device console text, which arrives as raw bytes and may
//! contain stray control or non-ASCII bytes. Output is always a single line.

use std::fmt::Write;

const MAX_PREVIEW: usize = 300;

/// Escape raw device bytes for single-line logging:
/// - `\n` => `\\n`, `\r` => `\\r`, `\t` => `\\t`
/// - backslash => `\\\\`
/// - other non-printable or non-ASCII bytes => `\xNN`
///
/// Input longer than 300 bytes is truncated with an ellipsis.
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().min(MAX_PREVIEW) + 8);
    for (count, &b) in bytes.iter().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7E => out.push(b as char),
            _ => {
                let _ = write!(&mut out, "\\x{:02X}", b);
            }
        }
    }
    out
}

/// Accumulates device console bytes and yields complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Cap on a single unterminated line before it is flushed anyway.
    pub const MAX_LINE: usize = 512;

    pub fn new() -> Self {
        Self::default()
    }

    /// Add one byte; returns a finished line (without terminator) if this byte
    /// completed one. Carriage returns are dropped.
    pub fn push(&mut self, b: u8) -> Option<Vec<u8>> {
        match b {
            b'\n' => Some(std::mem::take(&mut self.buf)),
            b'\r' => None,
            _ => {
                self.buf.push(b);
                if self.buf.len() >= Self::MAX_LINE {
                    Some(std::mem::take(&mut self.buf))
                } else {
                    None
                }
            }
        }
    }

    /// Take whatever partial line is buffered.
    pub fn flush(&mut self) -> Option<Vec<u8>> {
        if self.buf.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buf))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_and_high_bytes() {
        assert_eq!(escape_bytes(b"Line1\nA\\B\t"), "Line1\\nA\\\\B\\t");
        assert_eq!(escape_bytes(&[0x01, b'x', 0xC3]), "\\x01x\\xC3");
    }

    #[test]
    fn truncates_long_input() {
        let long = vec![b'a'; 400];
        let esc = escape_bytes(&long);
        assert!(esc.ends_with('…'));
        assert_eq!(esc.chars().count(), 301);
    }

    #[test]
    fn line_buffer_splits_on_newline() {
        let mut lb = LineBuffer::new();
        let mut lines = Vec::new();
        for &b in b"Screen Grabber Enabled\r\nok" {
            if let Some(line) = lb.push(b) {
                lines.push(line);
            }
        }
        assert_eq!(lines, vec![b"Screen Grabber Enabled".to_vec()]);
        assert_eq!(lb.flush(), Some(b"ok".to_vec()));
        assert_eq!(lb.flush(), None);
    }
}
