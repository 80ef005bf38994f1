//! Decode counters for a capture run.
//! Kept inside the capture context and reported as JSON when the run ends.
use serde::Serialize;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    pub bytes_read: u64,
    pub pixels_written: u64,
    /// Data bytes seen while no region was open (device console text).
    pub text_bytes: u64,
    pub clipped_writes: u64,
    pub position_overflows: u64,
    pub region_errors: u64,
    pub regions_opened: u64,
    pub grabs_requested: u64,
    pub new_frames: u64,
    pub snapshots_written: u64,
    pub snapshot_failures: u64,
}

impl DecodeStats {
    pub fn add_bytes_read(&mut self, n: usize) {
        self.bytes_read = self.bytes_read.saturating_add(n as u64);
    }

    /// Bytes that reached the decoder but never landed in the framebuffer
    /// because they were clipped or out of range.
    pub fn dropped_pixels(&self) -> u64 {
        self.clipped_writes.saturating_add(self.position_overflows)
    }
}

#[cfg(test)]
mod tests {
    use super::DecodeStats;

    #[test]
    fn serializes_flat_counters() {
        let mut s = DecodeStats::default();
        s.add_bytes_read(12);
        s.clipped_writes = 2;
        s.position_overflows = 1;
        assert_eq!(s.dropped_pixels(), 3);
        let v = serde_json::to_value(s).unwrap();
        assert_eq!(v["bytes_read"], 12);
        assert_eq!(v["clipped_writes"], 2);
    }
}
