//! # lcdgrab - screen grabber for SMART Response XE style LCD streams
//!
//! Firmware built with its screen grabber enabled mirrors every LCD RAM write
//! on the UART. `lcdgrab` decodes that stream into an off-device copy of the
//! display and writes PGM snapshots of it, either when the device asks (grab
//! hot key, screen clear) or when the operator types `G`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lcdgrab::config::Config;
//! use lcdgrab::link::ReplaySource;
//! use lcdgrab::session::{GrabSession, SharedCapture};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_or_default("config.toml").await?;
//!     let capture = SharedCapture::from_config(&config);
//!     let source = ReplaySource::open("session.bin")?;
//!     let summary = GrabSession::new(source, capture, &config).run().await?;
//!     println!("{:?}", summary.snapshots);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`protocol`] - marker classification and the stream decoder
//! - [`screen`] - framebuffer, write window cursor, PGM snapshots
//! - [`session`] - shared capture context and the run loop
//! - [`console`] - operator commands from the terminal
//! - [`link`] - serial and replay byte sources
//! - [`config`] - TOML configuration
//! - [`metrics`] - per-run decode counters
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   bytes   ┌─────────────┐  events  ┌──────────────────┐
//! │ ByteSource  │ ────────► │  Decoder    │ ───────► │  CaptureContext  │
//! └─────────────┘           └─────────────┘          │ Screen, Snapshot │
//!                                                    └──────────────────┘
//! ┌─────────────┐  Command (mpsc)  ┌─────────────┐          ▲
//! │   console   │ ───────────────► │ GrabSession │ ─────────┘
//! └─────────────┘                  └─────────────┘
//! ```

pub mod config;
pub mod console;
pub mod link;
pub mod logutil;
pub mod metrics;
pub mod protocol;
pub mod screen;
pub mod session;
