//! Off-device copy of the LCD controller RAM.

/// Characters used by [`Framebuffer::render_ascii`], indexed by raw 2-bit level.
const PIXIES: [char; 4] = ['.', '-', 'X', '#'];

/// Split a packed cell into its three raw 2-bit levels (left to right).
///
/// The controller packs three pixels per byte at bit offsets 6, 3 and 0; the
/// remaining bits are ignored.
pub fn unpack_triplet(v: u8) -> [u8; 3] {
    [(v >> 6) & 0x3, (v >> 3) & 0x3, v & 0x3]
}

/// Grid of packed pixel triplets, one byte per cell, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl Framebuffer {
    /// Allocate a zeroed buffer of `width` x `height` cells.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells (`width * height`).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, col: usize, row: usize) -> Option<u8> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cells.get(row * self.width + col).copied()
    }

    /// Cells of one row, or `None` past the last row.
    pub fn row(&self, row: usize) -> Option<&[u8]> {
        if row >= self.height {
            return None;
        }
        let start = row * self.width;
        Some(&self.cells[start..start + self.width])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        // chunks_exact panics on 0
        self.cells.chunks_exact(self.width.max(1))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    pub(crate) fn set(&mut self, pos: usize, value: u8) {
        self.cells[pos] = value;
    }

    pub(crate) fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Render the buffer as text, three characters per cell, one line per row.
    ///
    /// Uses the raw (non-inverted) levels, so a blank LCD renders as dots.
    pub fn render_ascii(&self) -> String {
        let mut out = String::with_capacity(self.len() * 3 + self.height);
        for row in self.rows() {
            for &cell in row {
                for level in unpack_triplet(cell) {
                    out.push(PIXIES[level as usize]);
                }
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_uses_shifts_six_three_zero() {
        assert_eq!(unpack_triplet(0b1101_1010), [0b11, 0b11, 0b10]);
        assert_eq!(unpack_triplet(0b0100_1001), [0b01, 0b01, 0b01]);
        assert_eq!(unpack_triplet(0), [0, 0, 0]);
    }

    #[test]
    fn new_buffer_is_zeroed() {
        let fb = Framebuffer::new(4, 3);
        assert_eq!(fb.len(), 12);
        assert!(fb.as_bytes().iter().all(|&c| c == 0));
        assert_eq!(fb.get(4, 0), None);
        assert_eq!(fb.get(0, 3), None);
    }

    #[test]
    fn ascii_preview_has_three_chars_per_cell() {
        let mut fb = Framebuffer::new(2, 1);
        fb.set(1, 0b1101_1010);
        assert_eq!(fb.render_ascii(), "...##X\n");
    }
}
