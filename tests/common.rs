//! Test utilities: stream builders and capture contexts rooted in a temp dir.

use lcdgrab::protocol::marker::{START, STOP};
use lcdgrab::screen::{Screen, SnapshotWriter};
use lcdgrab::session::{CaptureContext, SharedCapture};

pub const RUN_ID: &str = "20210810120000";

/// Bytes the firmware sends for one windowed write.
#[allow(dead_code)]
pub fn window(x: u8, y: u8, w: u8, h: u8, data: &[u8]) -> Vec<u8> {
    let mut out = vec![START, START, x, y, w, h];
    out.extend_from_slice(data);
    out.extend_from_slice(&[STOP, STOP]);
    out
}

#[allow(dead_code)]
pub const GRAB: [u8; 2] = [STOP, START];
#[allow(dead_code)]
pub const NEW_FRAME: [u8; 2] = [START, STOP];

/// Capture context for a full-size screen writing into `dir`.
#[allow(dead_code)]
pub fn shared_capture(dir: &std::path::Path) -> SharedCapture {
    SharedCapture::new(
        CaptureContext::new(Screen::default(), SnapshotWriter::new(dir, "srxe_screen", RUN_ID))
            .with_echo(false),
    )
}

/// Sorted snapshot file names in `dir`, ignoring anything else.
#[allow(dead_code)]
pub fn snapshot_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read_dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.ends_with(".pgm") && !n.starts_with('.'))
        .collect();
    names.sort();
    names
}
