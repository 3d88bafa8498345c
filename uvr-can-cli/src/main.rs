//! UVR CAN Bridge CLI Application
//!
//! Command-line driver for the uvr-can-codec library. It adds:
//! - TOML configuration of the device and its attributes
//! - A stdio transport (`candump` lines in, `cansend` commands out)
//! - The run loop that drains input and fires the periodic timers
//! - Reading publication as text or JSON lines

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use uvr_can_codec::{units, CaptureReader, DeviceSession, MemoryTransport, Reading};

mod config;
mod events;
mod transport;

use config::AppConfig;
use events::ReadingPublisher;
use transport::LineTransport;

/// Longest time the run loop sleeps without checking its timers
const MAX_IDLE: Duration = Duration::from_secs(1);

/// UVR CAN Bridge - Read and write UVR16x2 channels over CAN
#[derive(Parser, Debug)]
#[command(name = "uvr-can-cli")]
#[command(about = "Bridge a UVR16x2 controller on a CAN bus", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// CAN interface name, overrides the configuration file
    #[arg(short, long, value_name = "IFACE", global = true)]
    device: Option<String>,

    /// Node id of the controller (1-63), overrides the configuration file
    #[arg(short, long, value_name = "ID", global = true)]
    node_id: Option<u8>,

    /// Output file for readings as JSON lines
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bridge stdin capture lines to readings and write send commands to stdout
    Run,
    /// Decode a capture file and print the readings
    Replay {
        /// Capture file in candump format
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the commands for all outgoing channel values
    Send,
    /// Print the command for a time sync frame
    Time,
    /// List the known units
    Units,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("UVR CAN Bridge CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using codec library v{}", uvr_can_codec::VERSION);

    if let Command::Units = args.command {
        list_units();
        return Ok(());
    }

    let config = load_app_config(&args)?;
    let now = Instant::now();
    let (session, initial) = config.build_session(now)?;

    match &args.command {
        Command::Run => run_mode(session, &initial, &config, args.output.as_deref()),
        Command::Replay { file } => replay_mode(session, file, args.output.as_deref()),
        Command::Send => send_mode(session, &config, now),
        Command::Time => time_mode(session, &config, now),
        Command::Units => Ok(()),
    }
}

fn load_app_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(device) = &args.device {
        config.device.interface = device.clone();
    }
    if let Some(node_id) = args.node_id {
        config.device.node_id = node_id;
    }
    log::debug!(
        "Device {} node {}",
        config.device.interface,
        config.device.node_id
    );
    Ok(config)
}

/// Run mode - bridge stdin to readings until the input closes
fn run_mode(
    mut session: DeviceSession,
    initial: &[Reading],
    config: &AppConfig,
    output: Option<&Path>,
) -> Result<()> {
    let mut publisher = ReadingPublisher::to_output_or_log(output)?;
    let mut transport = LineTransport::stdio(&config.device.interface);

    publisher.publish_all(initial)?;
    session.start(Instant::now());
    log::info!(
        "Listening for node {} on {}",
        session.node(),
        transport.device()
    );

    loop {
        let readings = session.drain(&mut transport);
        publisher.publish_all(&readings)?;
        if transport.is_closed() {
            break;
        }

        let now = Instant::now();
        session.poll(now, &mut transport);

        let idle = session
            .next_deadline()
            .map_or(MAX_IDLE, |deadline| deadline.saturating_duration_since(now))
            .min(MAX_IDLE);
        transport.wait(idle);
    }

    log::info!(
        "Input closed, {} readings published",
        publisher.published()
    );
    Ok(())
}

/// Replay mode - decode a capture file offline
fn replay_mode(mut session: DeviceSession, path: &Path, output: Option<&Path>) -> Result<()> {
    let file =
        File::open(path).with_context(|| format!("Failed to open capture file: {:?}", path))?;
    let mut publisher = ReadingPublisher::to_output_or_stdout(output)?;

    let mut reader = CaptureReader::new(BufReader::new(file));
    let mut frames = 0usize;
    let mut skipped = 0usize;
    while let Some(frame) = reader.next() {
        match frame {
            Ok(frame) => {
                frames += 1;
                publisher.publish_all(&session.handle_frame(&frame))?;
            }
            Err(e) => {
                skipped += 1;
                log::debug!("Line {}: {}", reader.line_no(), e);
            }
        }
    }

    log::info!(
        "Replayed {} frames ({} lines skipped), {} readings",
        frames,
        skipped,
        publisher.published()
    );
    Ok(())
}

/// Send mode - print the channel frames once
fn send_mode(mut session: DeviceSession, config: &AppConfig, now: Instant) -> Result<()> {
    let mut transport = MemoryTransport::new(config.device.interface.as_str());
    session
        .force_resend(now, &mut transport)
        .context("Cannot send channel values (is SendAsNodeId configured?)")?;
    for command in transport.commands() {
        println!("{}", command);
    }
    Ok(())
}

/// Time mode - print one time sync frame
fn time_mode(mut session: DeviceSession, config: &AppConfig, now: Instant) -> Result<()> {
    let mut transport = MemoryTransport::new(config.device.interface.as_str());
    session
        .force_time_sync(now, &mut transport)
        .context("Cannot build time sync frame")?;
    for command in transport.commands() {
        println!("{}", command);
    }
    Ok(())
}

fn list_units() {
    for unit in units::all() {
        println!(
            "{:<32} {:>10} {}",
            unit.name,
            unit.scale_factor(),
            unit.display_unit
        );
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
