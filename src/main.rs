//! Binary entrypoint for the lcdgrab CLI.
//!
//! Commands:
//! - `start [--port <path>] [-b <baud>]` - capture a live device
//! - `replay <file> [--preview]` - decode a recorded stream
//! - `init` - create a starter `config.toml`
//!
//! While `start` runs, type `G` + ENTER to snapshot the screen and `Q` + ENTER
//! to quit.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
#[cfg(not(feature = "serial"))]
use log::error;

use lcdgrab::config::Config;
use lcdgrab::link::ReplaySource;
use lcdgrab::session::{GrabSession, SessionSummary, SharedCapture};

#[derive(Parser)]
#[command(name = "lcdgrab")]
#[command(about = "Capture screen shots from a SMART Response XE LCD stream")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture from a device on a serial port
    Start {
        /// Serial port (e.g., /dev/ttyUSB0); overrides the config file
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate; overrides the config file
        #[arg(short = 'b', long)]
        baud: Option<u32>,

        /// Directory for snapshot files; overrides the config file
        #[arg(short, long)]
        output_dir: Option<String>,
    },
    /// Decode a recorded stream file
    Replay {
        /// File holding raw bytes captured from the device
        file: String,

        /// Directory for snapshot files; overrides the config file
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Print an ASCII preview of the final screen
        #[arg(long)]
        preview: bool,
    },
    /// Write a default configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Replay {
            file,
            output_dir,
            preview,
        } => {
            let mut config = Config::load_or_default(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            if let Some(dir) = output_dir {
                config.capture.output_dir = dir;
            }
            let source = ReplaySource::open(&file)
                .map_err(|e| anyhow::anyhow!("Failed to open stream file {}: {}", file, e))?;
            info!("Replaying {}", file);
            let capture = SharedCapture::from_config(&config);
            let summary = GrabSession::new(source, capture.clone(), &config)
                .run()
                .await?;
            if preview {
                print!("{}", capture.lock().screen().framebuffer().render_ascii());
            }
            print_summary(&summary)?;
        }
        Commands::Start {
            port,
            baud,
            output_dir,
        } => {
            let mut config = Config::load_or_default(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            if let Some(port) = port {
                config.device.port = port;
            }
            if let Some(baud) = baud {
                config.device.baud_rate = baud;
            }
            if let Some(dir) = output_dir {
                config.capture.output_dir = dir;
            }

            #[cfg(not(feature = "serial"))]
            {
                error!("Live capture requires the 'serial' feature; use `replay` instead");
                std::process::exit(2);
            }

            #[cfg(feature = "serial")]
            {
                use lcdgrab::console::spawn_stdin_reader;
                use lcdgrab::link::SerialSource;
                use tokio::sync::mpsc;

                info!("Starting lcdgrab v{}", env!("CARGO_PKG_VERSION"));
                info!("Initializing serial port ...");
                let source = SerialSource::open(&config.device.port, config.device.baud_rate)?;
                info!("... serial port {} initialized", source.name());

                let capture = SharedCapture::from_config(&config);
                let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
                let _reader = spawn_stdin_reader(cmd_tx);
                info!("Type G then ENTER to grab the current screen, Q then ENTER to quit");

                let summary = GrabSession::new(source, capture, &config)
                    .with_commands(cmd_rx)
                    .run()
                    .await?;
                print_summary(&summary)?;
                // stdin reader may still be blocked on a read
                std::process::exit(0);
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &SessionSummary) -> Result<()> {
    println!("{}", serde_json::to_string(summary)?);
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity raises the configured level, never lowers it
    let configured = config
        .as_ref()
        .map(|c| c.logging.level_filter())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => configured,
        1 => configured.max(log::LevelFilter::Debug),
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Only mirror to the console when someone is watching it
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!(
                "{} [{}] {}: {}",
                ts,
                record.level(),
                record.target(),
                record.args()
            );
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(
                fmt,
                "{} [{}] {}: {}",
                ts,
                record.level(),
                record.target(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
