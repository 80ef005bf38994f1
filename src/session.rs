//! # Capture Session
//!
//! Ties the pieces together: a [`ByteSource`] is polled on a short interval,
//! bytes go through the [`StreamDecoder`], and the resulting events are
//! applied to the [`CaptureContext`] (screen, snapshot writer, counters).
//! Operator commands arrive on a channel from the console task.
//!
//! The capture context sits behind one mutex ([`SharedCapture`]). Framebuffer
//! writes and snapshots both happen with that lock held, so a snapshot never
//! sees a half-applied batch regardless of which side triggered it.
//!
//! ```rust,no_run
//! use lcdgrab::config::Config;
//! use lcdgrab::link::ReplaySource;
//! use lcdgrab::session::{GrabSession, SharedCapture};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let capture = SharedCapture::from_config(&config);
//!     let source = ReplaySource::open("session.bin")?;
//!     let summary = GrabSession::new(source, capture, &config).run().await?;
//!     println!("{} snapshots", summary.snapshots.len());
//!     Ok(())
//! }
//! ```

use crate::config::Config;
use crate::console::Command;
use crate::link::ByteSource;
use crate::logutil::{escape_bytes, LineBuffer};
use crate::metrics::DecodeStats;
use crate::protocol::{Event, StreamDecoder};
use crate::screen::{Screen, SnapshotError, SnapshotWriter, WriteError, WriteOutcome};
use anyhow::Result;
use log::{debug, error, info, trace, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior};

/// Upper bound on reads drained per poll tick, so commands are serviced even
/// while the device is streaming continuously.
pub const MAX_READS_PER_TICK: usize = 64;
const READ_CHUNK: usize = 1024;

/// Everything a snapshot needs, owned in one place.
#[derive(Debug)]
pub struct CaptureContext {
    screen: Screen,
    writer: SnapshotWriter,
    stats: DecodeStats,
    snapshots: Vec<PathBuf>,
    echo_text: bool,
    text: LineBuffer,
}

impl CaptureContext {
    pub fn new(screen: Screen, writer: SnapshotWriter) -> Self {
        Self {
            screen,
            writer,
            stats: DecodeStats::default(),
            snapshots: Vec::new(),
            echo_text: true,
            text: LineBuffer::new(),
        }
    }

    pub fn with_echo(mut self, echo_text: bool) -> Self {
        self.echo_text = echo_text;
        self
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn writer(&self) -> &SnapshotWriter {
        &self.writer
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Paths of every snapshot written so far, oldest first.
    pub fn snapshots(&self) -> &[PathBuf] {
        &self.snapshots
    }

    /// Snapshot the screen if it is dirty.
    pub fn capture(&mut self) -> Result<Option<PathBuf>, SnapshotError> {
        match self.writer.capture(&mut self.screen) {
            Ok(Some(path)) => {
                info!("Created screen shot {}", path.display());
                self.stats.snapshots_written += 1;
                self.snapshots.push(path.clone());
                Ok(Some(path))
            }
            Ok(None) => {
                debug!("Screen unchanged since last snapshot; nothing to capture");
                Ok(None)
            }
            Err(e) => {
                self.stats.snapshot_failures += 1;
                Err(e)
            }
        }
    }

    /// Apply one decoded event.
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::Data(b) => self.write_data(b),
            Event::RegionStart { x, y, w, h } => {
                trace!("Region start at {}, {} for {}, {}", x, y, w, h);
                match self.screen.start_region(x, y, w, h) {
                    Ok(()) => self.stats.regions_opened += 1,
                    Err(e) => {
                        self.stats.region_errors += 1;
                        warn!("Ignoring region: {}", e);
                    }
                }
            }
            Event::RegionEnd => {
                trace!("Region end");
                self.screen.end_region();
            }
            Event::Grab => {
                self.stats.grabs_requested += 1;
                // The firmware stops streaming the window when it sends a grab
                self.screen.end_region();
                self.capture_logged("grab request");
            }
            Event::NewFrame => {
                self.stats.new_frames += 1;
                self.capture_logged("new frame");
                self.screen.clear();
                info!("Beginning new screen ... ([G]rab current, [Q]uit)");
            }
        }
    }

    pub fn apply_all(&mut self, events: &[Event]) {
        for &event in events {
            self.apply(event);
        }
    }

    fn write_data(&mut self, b: u8) {
        match self.screen.write(b) {
            Ok(WriteOutcome::Stored(_)) => self.stats.pixels_written += 1,
            Ok(WriteOutcome::Inactive) => {
                self.stats.text_bytes += 1;
                if self.echo_text {
                    if let Some(line) = self.text.push(b) {
                        info!(target: "device", "{}", escape_bytes(&line));
                    }
                }
            }
            Err(e) => {
                match e {
                    WriteError::Clipped { .. } => self.stats.clipped_writes += 1,
                    WriteError::PositionOverflow { .. } => self.stats.position_overflows += 1,
                }
                debug!("Dropped pixel: {}", e);
            }
        }
    }

    fn capture_logged(&mut self, trigger: &str) {
        if let Err(e) = self.capture() {
            error!("Snapshot for {} failed: {}", trigger, e);
        }
    }

    /// Emit any partial device text line still buffered.
    pub fn flush_text(&mut self) {
        if let Some(line) = self.text.flush() {
            if self.echo_text {
                info!(target: "device", "{}", escape_bytes(&line));
            }
        }
    }
}

/// Cloneable handle to the one [`CaptureContext`] of a run.
#[derive(Debug, Clone)]
pub struct SharedCapture {
    inner: Arc<Mutex<CaptureContext>>,
}

impl SharedCapture {
    pub fn new(ctx: CaptureContext) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ctx)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let screen = Screen::new(config.screen.width, config.screen.height);
        let writer = SnapshotWriter::new(
            &config.capture.output_dir,
            config.capture.file_prefix.clone(),
            config.capture.resolve_run_id(),
        );
        Self::new(CaptureContext::new(screen, writer).with_echo(config.capture.echo_device_text))
    }

    /// Lock the context, recovering it if a previous holder panicked.
    pub fn lock(&self) -> MutexGuard<'_, CaptureContext> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn apply_all(&self, events: &[Event]) {
        self.lock().apply_all(events);
    }

    pub fn capture(&self) -> Result<Option<PathBuf>, SnapshotError> {
        self.lock().capture()
    }

    pub fn stats(&self) -> DecodeStats {
        self.lock().stats()
    }
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Quit,
    Interrupted,
    EndOfInput,
}

/// Result of a finished session, printed as JSON by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub run_id: String,
    pub stopped_by: StopReason,
    pub snapshots: Vec<PathBuf>,
    pub stats: DecodeStats,
}

pub struct GrabSession<S> {
    source: S,
    decoder: StreamDecoder,
    capture: SharedCapture,
    commands: Option<mpsc::UnboundedReceiver<Command>>,
    poll_interval: Duration,
    handle_ctrl_c: bool,
}

impl<S: ByteSource> GrabSession<S> {
    pub fn new(source: S, capture: SharedCapture, config: &Config) -> Self {
        Self {
            source,
            decoder: StreamDecoder::new(),
            capture,
            commands: None,
            poll_interval: Duration::from_millis(config.device.poll_interval_ms.max(1)),
            handle_ctrl_c: true,
        }
    }

    /// Attach the operator command channel.
    pub fn with_commands(mut self, rx: mpsc::UnboundedReceiver<Command>) -> Self {
        self.commands = Some(rx);
        self
    }

    /// Stop on Ctrl-C (default). Disabled in tests so the signal handler is
    /// not installed.
    pub fn with_ctrl_c(mut self, enabled: bool) -> Self {
        self.handle_ctrl_c = enabled;
        self
    }

    pub fn capture(&self) -> &SharedCapture {
        &self.capture
    }

    /// Decode until QUIT, Ctrl-C, or the source running dry, then take a final
    /// snapshot if the screen changed.
    pub async fn run(mut self) -> Result<SessionSummary> {
        info!("Capture running ... ([G]rab current, [Q]uit)");

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut commands = self.commands.take();
        let handle_ctrl_c = self.handle_ctrl_c;

        let stopped_by = loop {
            tokio::select! {
                cmd = async {
                    if let Some(ref mut rx) = commands {
                        rx.recv().await
                    } else {
                        std::future::pending().await
                    }
                } => {
                    match cmd {
                        Some(Command::Capture) => {
                            if let Err(e) = self.capture.capture() {
                                error!("Snapshot failed: {}", e);
                            }
                        }
                        Some(Command::Quit) => {
                            info!("Ending ...");
                            break StopReason::Quit;
                        }
                        None => {
                            debug!("Command channel closed");
                            commands = None;
                        }
                    }
                }

                _ = interval.tick() => {
                    self.poll_source();
                    if self.source.is_finished() {
                        info!("End of input stream");
                        break StopReason::EndOfInput;
                    }
                }

                _ = async {
                    if handle_ctrl_c {
                        let _ = tokio::signal::ctrl_c().await;
                    } else {
                        std::future::pending::<()>().await
                    }
                } => {
                    info!("Received shutdown signal");
                    break StopReason::Interrupted;
                }
            }
        };

        self.finish(stopped_by)
    }

    /// Drain what the source has waiting, up to [`MAX_READS_PER_TICK`] reads.
    fn poll_source(&mut self) {
        let mut buf = [0u8; READ_CHUNK];
        for _ in 0..MAX_READS_PER_TICK {
            let n = match self.source.read_available(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) => {
                    warn!("Read error (continuing): {}", e);
                    break;
                }
            };
            let events = self.decoder.push(&buf[..n]);
            let mut ctx = self.capture.lock();
            ctx.stats.add_bytes_read(n);
            ctx.apply_all(&events);
        }
    }

    fn finish(self, stopped_by: StopReason) -> Result<SessionSummary> {
        let mut ctx = self.capture.lock();
        if let Some(marker) = self.decoder.pending() {
            debug!("Discarding unpaired marker 0x{:02X} at shutdown", marker.byte());
        }
        ctx.flush_text();
        if let Err(e) = ctx.capture() {
            error!("Final snapshot failed: {}", e);
        }
        let summary = SessionSummary {
            run_id: ctx.writer().run_id().to_string(),
            stopped_by,
            snapshots: ctx.snapshots().to_vec(),
            stats: ctx.stats(),
        };
        info!("Ended after {} snapshot(s)", summary.snapshots.len());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::marker::{START, STOP};

    fn context(dir: &std::path::Path) -> CaptureContext {
        CaptureContext::new(Screen::new(8, 4), SnapshotWriter::new(dir, "t", "run"))
    }

    #[test]
    fn grab_closes_region_and_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        let events = StreamDecoder::new().push(&[START, START, 0, 0, 2, 1, 7, 9, STOP, START]);
        ctx.apply_all(&events);
        assert!(!ctx.screen().region().is_active());
        assert_eq!(ctx.snapshots().len(), 1);
        assert_eq!(ctx.stats().grabs_requested, 1);
        assert!(!ctx.screen().is_dirty());
    }

    #[test]
    fn inactive_bytes_count_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        ctx.apply_all(&StreamDecoder::new().push(b"hello\n"));
        assert_eq!(ctx.stats().text_bytes, 6);
        assert!(!ctx.screen().is_dirty());
    }

    #[test]
    fn zero_width_region_drops_following_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        ctx.apply_all(&StreamDecoder::new().push(&[START, START, 1, 1, 0, 2, 5, 6]));
        assert_eq!(ctx.stats().region_errors, 1);
        assert_eq!(ctx.stats().pixels_written, 0);
        assert!(!ctx.screen().is_dirty());
    }
}
