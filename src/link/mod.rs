//! # Byte Sources
//!
//! Where the LCD stream comes from. The run loop polls a [`ByteSource`] on a
//! short interval and must never block on it, so implementations only return
//! bytes that are already waiting.
//!
//! - [`SerialSource`] reads a live device over USB/UART (feature `serial`)
//! - [`ReplaySource`] reads a previously recorded stream, e.g. a file written
//!   with `cat /dev/ttyUSB0 > session.bin`

use std::io::{self, Read};

#[cfg(feature = "serial")]
mod serial;
#[cfg(feature = "serial")]
pub use serial::SerialSource;

pub trait ByteSource: Send {
    /// Copy waiting bytes into `buf`, returning how many were read. `Ok(0)`
    /// means nothing is waiting right now.
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// True once the source can never produce more bytes.
    fn is_finished(&self) -> bool {
        false
    }
}

/// Replays a recorded stream from any reader. End of input finishes the
/// source.
pub struct ReplaySource<R> {
    reader: R,
    finished: bool,
}

impl<R: Read + Send> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            finished: false,
        }
    }
}

impl ReplaySource<std::fs::File> {
    pub fn open(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        Ok(Self::new(std::fs::File::open(path)?))
    }
}

impl<R: Read + Send> ByteSource for ReplaySource<R> {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.finished {
            return Ok(0);
        }
        loop {
            match self.reader.read(buf) {
                Ok(0) => {
                    self.finished = true;
                    return Ok(0);
                }
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_finishes_at_end_of_input() {
        let mut src = ReplaySource::new(io::Cursor::new(vec![1u8, 2, 3]));
        let mut buf = [0u8; 2];
        assert_eq!(src.read_available(&mut buf).unwrap(), 2);
        assert!(!src.is_finished());
        assert_eq!(src.read_available(&mut buf).unwrap(), 1);
        assert_eq!(src.read_available(&mut buf).unwrap(), 0);
        assert!(src.is_finished());
        assert_eq!(src.read_available(&mut buf).unwrap(), 0);
    }
}
