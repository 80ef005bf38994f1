//! PGM snapshots of the reconstructed screen.
//!
//! Each snapshot is an ASCII ("P2") graymap three samples wide per cell with a
//! maximum value of 3. The LCD stores dark pixels as high values, so every
//! sample is inverted to give a white background.

use super::framebuffer::unpack_triplet;
use super::Screen;
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Brightest sample value in the written graymap.
pub const MAX_LEVEL: u8 = 3;
/// Digits of the zero-padded sequence number in file names.
pub const SEQUENCE_WIDTH: usize = 6;
pub const DEFAULT_PREFIX: &str = "srxe_screen";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to write snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Display levels for one packed cell, inverted for the graymap.
pub fn decode_triplet(v: u8) -> [u8; 3] {
    unpack_triplet(v).map(|level| MAX_LEVEL - level)
}

/// Writes numbered snapshot files for one capture run.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    output_dir: PathBuf,
    prefix: String,
    run_id: String,
    sequence: u32,
}

impl SnapshotWriter {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
            run_id: run_id.into(),
            sequence: 1,
        }
    }

    /// Run id stamped into every file name, e.g. `20210810153000`.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Sequence number the next snapshot will carry.
    pub fn next_sequence(&self) -> u32 {
        self.sequence
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn file_name(&self, sequence: u32) -> String {
        format!(
            "{}_{}_{:0width$}.pgm",
            self.prefix,
            self.run_id,
            sequence,
            width = SEQUENCE_WIDTH
        )
    }

    /// Write the screen if it changed since the last snapshot.
    ///
    /// Returns the new file's path, or `None` when the screen was clean. On
    /// failure the screen stays dirty and the sequence number is not consumed,
    /// so a later capture retries with the same number.
    pub fn capture(&mut self, screen: &mut Screen) -> Result<Option<PathBuf>, SnapshotError> {
        if !screen.is_dirty() {
            return Ok(None);
        }
        let name = self.file_name(self.sequence);
        let path = self.output_dir.join(&name);
        let content = render_pgm(screen, &name);
        write_atomic(&self.output_dir, &path, content.as_bytes()).map_err(|source| {
            SnapshotError::Io {
                path: path.clone(),
                source,
            }
        })?;
        self.sequence += 1;
        screen.mark_clean();
        Ok(Some(path))
    }
}

/// Render the whole screen as a P2 graymap.
pub fn render_pgm(screen: &Screen, title: &str) -> String {
    let fb = screen.framebuffer();
    // "3 3 3 " per cell plus header slack
    let mut out = String::with_capacity(fb.len() * 6 + fb.height() + 64);
    let _ = writeln!(out, "P2");
    let _ = writeln!(out, "# {}", title);
    let _ = writeln!(out, "{} {}", fb.width() * 3, fb.height());
    let _ = writeln!(out, "{}", MAX_LEVEL);
    for row in fb.rows() {
        for &cell in row {
            let [p1, p2, p3] = decode_triplet(cell);
            let _ = write!(out, "{} {} {} ", p1, p2, p3);
        }
        out.push('\n');
    }
    out.push('\n');
    out
}

fn write_atomic(dir: &Path, path: &Path, content: &[u8]) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("snapshot.pgm");
    let mut counter = 0u32;
    let tmp_path = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(mut tmp) => {
                tmp.write_all(content)?;
                tmp.flush()?;
                let _ = tmp.sync_all();
                break candidate;
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
            }
            Err(e) => return Err(e),
        }
    };
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
    Ok(())
}
