//! Trackside agent binary.
//!
//! Runs the scan loop against a simulated reader driven from stdin:
//! type a tag value (hex or decimal) to present it, an empty line or
//! `none` to lift it off. The physical driver integration point is the
//! `TagReader` trait in `trackside-reader`.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trackside_agent::{Orchestrator, load_config};
use trackside_channel::NotificationChannel;
use trackside_core::RawRead;
use trackside_lap::LapClient;
use trackside_reader::{MockReader, MockReaderHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_config().context("loading configuration")?;
    info!(
        version = trackside_core::VERSION,
        lap_api = %settings.lap.base_url,
        channel = %settings.channel.url,
        "Trackside agent starting"
    );

    let lap = LapClient::new(settings.lap_config()).context("building lap client")?;
    let channel = NotificationChannel::new(settings.channel_config());

    let (reader, handle) = MockReader::new();
    tokio::spawn(drive_reader_from_stdin(handle));

    let mut orchestrator = Orchestrator::new(reader, lap, channel, settings.loop_timing());
    orchestrator.run().await;

    Ok(())
}

/// Feed the simulated reader from stdin.
async fn drive_reader_from_stdin(handle: MockReaderHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Reader simulation ready: enter a tag value, empty line to remove");

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() || line.eq_ignore_ascii_case("none") {
            handle.remove_tag().await;
            continue;
        }

        let parsed = line
            .strip_prefix("0x")
            .map_or_else(|| line.parse::<u64>(), |hex| u64::from_str_radix(hex, 16));
        match parsed {
            Ok(value) => handle.present_tag(RawRead::new(value)).await,
            Err(_) => warn!(input = line, "Not a tag value"),
        }
    }
}
