//! Write window cursor.
//!
//! The device streams the contents of one rectangular window at a time, in
//! row-major order, without coordinates. The cursor turns the running pixel
//! index into an absolute framebuffer position.

use thiserror::Error;

/// Rejected window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegionError {
    #[error("region {w}x{h} has a zero extent")]
    ZeroExtent { w: u8, h: u8 },
}

/// A data byte that could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("clipped: pixel {index} lands on row {row} of a {w}x{h} region at ({x}, {y})")]
    Clipped {
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        index: usize,
        row: usize,
    },
    #[error("position overflow: pixel {index} of region at ({x}, {y}) maps to {pos} (limit {limit})")]
    PositionOverflow {
        x: usize,
        y: usize,
        index: usize,
        pos: usize,
        limit: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    x: usize,
    y: usize,
    w: usize,
    h: usize,
    pixel: usize,
    active: bool,
    stride: usize,
    limit: usize,
}

impl Region {
    /// Closed region covering a `width` x `height` framebuffer.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            x: 0,
            y: 0,
            w: width.saturating_sub(1),
            h: height.saturating_sub(1),
            pixel: 0,
            active: false,
            stride: width,
            limit: width * height,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Origin and extent as `(x, y, w, h)`.
    pub fn bounds(&self) -> (usize, usize, usize, usize) {
        (self.x, self.y, self.w, self.h)
    }

    /// Pixels placed since the region was opened.
    pub fn pixel_index(&self) -> usize {
        self.pixel
    }

    /// Open a window. A zero width or height leaves the region closed.
    pub fn start(&mut self, x: u8, y: u8, w: u8, h: u8) -> Result<(), RegionError> {
        if w == 0 || h == 0 {
            self.end();
            return Err(RegionError::ZeroExtent { w, h });
        }
        self.x = x as usize;
        self.y = y as usize;
        self.w = w as usize;
        self.h = h as usize;
        self.pixel = 0;
        self.active = true;
        Ok(())
    }

    /// Close the window and fall back to the full-screen default.
    pub fn end(&mut self) {
        let stride = self.stride;
        let height = self.limit.checked_div(stride).unwrap_or(0);
        *self = Self::new(stride, height);
    }

    /// Absolute position of the next pixel. Does not advance the cursor.
    ///
    /// Only meaningful while active; callers check [`Region::is_active`].
    pub fn next_position(&self) -> Result<usize, WriteError> {
        let row = self.pixel / self.w;
        let col = self.pixel % self.w;
        if row >= self.h {
            return Err(WriteError::Clipped {
                x: self.x,
                y: self.y,
                w: self.w,
                h: self.h,
                index: self.pixel,
                row,
            });
        }
        let pos = (self.y + row) * self.stride + self.x + col;
        if pos >= self.limit {
            return Err(WriteError::PositionOverflow {
                x: self.x,
                y: self.y,
                index: self.pixel,
                pos,
                limit: self.limit,
            });
        }
        Ok(pos)
    }

    pub(crate) fn advance(&mut self) {
        self.pixel += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_region_is_closed_full_screen() {
        let r = Region::new(128, 136);
        assert!(!r.is_active());
        assert_eq!(r.bounds(), (0, 0, 127, 135));
    }

    #[test]
    fn positions_walk_the_window_row_major() {
        let mut r = Region::new(10, 10);
        r.start(2, 3, 4, 2).unwrap();
        let mut seen = Vec::new();
        for _ in 0..8 {
            seen.push(r.next_position().unwrap());
            r.advance();
        }
        assert_eq!(seen, vec![32, 33, 34, 35, 42, 43, 44, 45]);
        assert!(matches!(
            r.next_position(),
            Err(WriteError::Clipped { row: 2, .. })
        ));
    }

    #[test]
    fn overflow_past_end_of_buffer() {
        let mut r = Region::new(4, 2);
        r.start(0, 1, 4, 3).unwrap();
        for _ in 0..4 {
            r.next_position().unwrap();
            r.advance();
        }
        assert!(matches!(
            r.next_position(),
            Err(WriteError::PositionOverflow { pos: 8, limit: 8, .. })
        ));
    }

    #[test]
    fn zero_width_is_rejected_and_region_stays_closed() {
        let mut r = Region::new(8, 8);
        assert_eq!(
            r.start(1, 1, 0, 4),
            Err(RegionError::ZeroExtent { w: 0, h: 4 })
        );
        assert!(!r.is_active());
        assert_eq!(r.bounds(), (0, 0, 7, 7));
    }

    #[test]
    fn end_restores_default_extent() {
        let mut r = Region::new(8, 6);
        r.start(3, 3, 2, 2).unwrap();
        r.advance();
        r.end();
        assert!(!r.is_active());
        assert_eq!(r.bounds(), (0, 0, 7, 5));
        assert_eq!(r.pixel_index(), 0);
    }
}
