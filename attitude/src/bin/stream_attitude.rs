use std::path::PathBuf;
use std::process;
use std::time::Duration;

use attitude::config::JsonConfigStore;
use attitude::render::{AxesRenderer, DEFAULT_SIDE_LENGTH};
use attitude::sink::LogSink;
use attitude::{AttitudeStreamer, DEFAULT_TICK};
use clap::Parser;
use serial_lsm303::{Lsm303, DEFAULT_BAUD_RATE, DEFAULT_PORT};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stream_attitude", about = "Stream fused attitude from a serial compass board")]
struct Args {
    /// Serial port the board is attached to
    #[arg(long, default_value = DEFAULT_PORT)]
    port: String,

    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud_rate: u32,

    /// Tick interval in milliseconds
    #[arg(long, default_value_t = DEFAULT_TICK.as_millis() as u64)]
    interval_ms: u64,

    /// Calibration config store, created on first write
    #[arg(long, default_value = "attitude-config.json")]
    config: PathBuf,

    /// Publish angles in degrees instead of radians
    #[arg(long)]
    degrees: bool,

    /// Side length of the rendered orientation frame in pixels
    #[arg(long, default_value_t = DEFAULT_SIDE_LENGTH)]
    side_length: u32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    // No pipeline without a sensor: an unopenable port is fatal.
    let transport = match Lsm303::open(&args.port, args.baud_rate) {
        Ok(transport) => transport,
        Err(e) => {
            error!("Could not open serial port {}: {}", args.port, e);
            process::exit(1);
        }
    };

    let config = match JsonConfigStore::open(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Could not load config {}: {}", args.config.display(), e);
            process::exit(1);
        }
    };

    let mut streamer = AttitudeStreamer::new(
        transport,
        config,
        LogSink,
        AxesRenderer::new(args.side_length),
        args.degrees,
    );

    if let Err(e) = streamer.run(Duration::from_millis(args.interval_ms)) {
        error!("Attitude stream failed: {}", e);
        process::exit(1);
    }
}
