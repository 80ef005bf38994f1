//! # Configuration
//!
//! TOML configuration for the grabber. Every section has defaults, so a
//! missing file or a file containing only some sections is valid.
//!
//! ```toml
//! [device]
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600
//! poll_interval_ms = 10
//!
//! [capture]
//! output_dir = "."
//! file_prefix = "srxe_screen"
//! # run_id = "20210810120000"   # defaults to the start time
//! echo_device_text = true
//!
//! [screen]
//! width = 128
//! height = 136
//!
//! [logging]
//! level = "info"
//! # file = "lcdgrab.log"
//! ```
//!
//! Precedence: CLI args > config file > defaults.

use crate::screen::snapshot::DEFAULT_PREFIX;
use crate::screen::{SCREEN_HEIGHT, SCREEN_WIDTH};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub screen: ScreenConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// How often the serial port is polled for new bytes (ms).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_port() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_poll_interval_ms() -> u64 {
    10
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    /// Fixed run id for file names. When unset the local start time is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Log text the device prints outside of screen updates.
    #[serde(default = "default_echo_device_text")]
    pub echo_device_text: bool,
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_file_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_echo_device_text() -> bool {
    true
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
            run_id: None,
            echo_device_text: default_echo_device_text(),
        }
    }
}

impl CaptureConfig {
    /// Configured run id, or the current local time as `%Y%m%d%H%M%S`.
    pub fn resolve_run_id(&self) -> String {
        match &self.run_id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => chrono::Local::now().format("%Y%m%d%H%M%S").to_string(),
        }
    }
}

/// Display geometry in packed cells. Defaults match the SMART Response XE.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScreenConfig {
    pub width: usize,
    pub height: usize,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed level; unknown names fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults. A file that
    /// exists but does not parse is still an error.
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.screen.width == 0 || self.screen.height == 0 {
            return Err(anyhow!(
                "screen size must be non-zero (got {}x{})",
                self.screen.width,
                self.screen.height
            ));
        }
        if self.device.poll_interval_ms == 0 {
            return Err(anyhow!("device.poll_interval_ms must be at least 1"));
        }
        if self.capture.file_prefix.contains(|c: char| c == '/' || c == '\\') {
            return Err(anyhow!(
                "capture.file_prefix must not contain path separators: {}",
                self.capture.file_prefix
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[device]\nport = \"/dev/ttyACM0\"\n").unwrap();
        assert_eq!(cfg.device.port, "/dev/ttyACM0");
        assert_eq!(cfg.device.baud_rate, 9600);
        assert_eq!(cfg.capture.file_prefix, "srxe_screen");
        assert_eq!(cfg.screen.width, 128);
        assert_eq!(cfg.screen.height, 136);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn configured_run_id_wins() {
        let cap = CaptureConfig {
            run_id: Some("session1".into()),
            ..Default::default()
        };
        assert_eq!(cap.resolve_run_id(), "session1");
        let generated = CaptureConfig::default().resolve_run_id();
        assert_eq!(generated.len(), 14);
        assert!(generated.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn rejects_zero_screen() {
        let mut cfg = Config::default();
        cfg.screen.height = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.device.poll_interval_ms, 10);
        assert!(back.capture.echo_device_text);
    }
}
