//! # Screen Model
//!
//! The reconstructed LCD: a [`Framebuffer`] of packed triplets, the [`Region`]
//! cursor that places streamed bytes into it, and the dirty flag that tells the
//! [`SnapshotWriter`] whether anything changed since the last snapshot.
//!
//! [`Screen::write`] is the only path that mutates framebuffer cells and the
//! only place the dirty flag is set. [`SnapshotWriter::capture`] is the only
//! place it is cleared.

pub mod framebuffer;
pub mod region;
pub mod snapshot;

pub use framebuffer::{unpack_triplet, Framebuffer};
pub use region::{Region, RegionError, WriteError};
pub use snapshot::{decode_triplet, SnapshotError, SnapshotWriter};

/// Width of the SMART Response XE display in packed cells (384 pixels / 3).
pub const SCREEN_WIDTH: usize = 128;
/// Height of the SMART Response XE display in rows.
pub const SCREEN_HEIGHT: usize = 136;

/// Result of a successful [`Screen::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Stored at this framebuffer position.
    Stored(usize),
    /// No region open; the byte was not placed.
    Inactive,
}

#[derive(Debug, Clone)]
pub struct Screen {
    fb: Framebuffer,
    region: Region,
    dirty: bool,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl Screen {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            fb: Framebuffer::new(width, height),
            region: Region::new(width, height),
            dirty: false,
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.fb
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// True when cells changed since the last successful snapshot.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn start_region(&mut self, x: u8, y: u8, w: u8, h: u8) -> Result<(), RegionError> {
        self.region.start(x, y, w, h)
    }

    pub fn end_region(&mut self) {
        self.region.end();
    }

    /// Place one data byte at the cursor.
    ///
    /// A rejected byte leaves the cursor where it was.
    pub fn write(&mut self, value: u8) -> Result<WriteOutcome, WriteError> {
        if !self.region.is_active() {
            return Ok(WriteOutcome::Inactive);
        }
        let pos = self.region.next_position()?;
        self.fb.set(pos, value);
        self.region.advance();
        self.dirty = true;
        Ok(WriteOutcome::Stored(pos))
    }

    /// Zero every cell and close the region. Used when the device starts a new
    /// frame, after any pending snapshot has been taken.
    pub fn clear(&mut self) {
        self.fb.clear();
        self.region.end();
        self.dirty = false;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_without_region_are_dropped() {
        let mut screen = Screen::new(8, 8);
        for b in 0..20u8 {
            assert_eq!(screen.write(b), Ok(WriteOutcome::Inactive));
        }
        assert!(!screen.is_dirty());
        assert!(screen.framebuffer().as_bytes().iter().all(|&c| c == 0));
    }

    #[test]
    fn write_sets_dirty_and_stores_cell() {
        let mut screen = Screen::new(8, 8);
        screen.start_region(1, 2, 3, 1).unwrap();
        assert_eq!(screen.write(0x2A), Ok(WriteOutcome::Stored(17)));
        assert!(screen.is_dirty());
        assert_eq!(screen.framebuffer().get(1, 2), Some(0x2A));
    }

    #[test]
    fn clipped_write_does_not_advance() {
        let mut screen = Screen::new(8, 8);
        screen.start_region(0, 0, 1, 1).unwrap();
        screen.write(1).unwrap();
        assert!(screen.write(2).is_err());
        assert!(screen.write(3).is_err());
        assert_eq!(screen.region().pixel_index(), 1);
        assert_eq!(screen.framebuffer().get(0, 0), Some(1));
    }

    #[test]
    fn clear_zeroes_and_closes() {
        let mut screen = Screen::new(4, 4);
        screen.start_region(0, 0, 4, 4).unwrap();
        for b in 1..=16u8 {
            screen.write(b).unwrap();
        }
        screen.clear();
        assert!(!screen.is_dirty());
        assert!(!screen.region().is_active());
        assert!(screen.framebuffer().as_bytes().iter().all(|&c| c == 0));
    }
}
