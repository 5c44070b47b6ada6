//! # Jammon Relay
//!
//! Relays GNSS jamming-monitor telemetry from the receiver to live dashboards.
//!
//! The receiver sends one MessagePack map per UDP datagram. Every datagram
//! that decodes is pushed to all connected WebSocket clients as an `update`
//! event; datagrams that fail to decode are logged and dropped.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use jammon_relay::config::Config;
use jammon_relay::relay::{egress, Broadcaster, Relay, UdpIngress};
use jammon_relay::session::DashboardSession;

/// Log filter used when `RUST_LOG` is not set
const DEFAULT_LOG_FILTER: &str = "info";

/// Main entry point for the relay
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up non-blocking logging
///    - Load configuration (first argument, or defaults) and apply
///      `JAMMON_UDP_PORT` / `JAMMON_WS_PORT`
///    - Bind the UDP socket and the WebSocket listener
///
/// 2. **Main Loop**
///    - Receive, decode and publish datagrams in arrival order
///    - Serve WebSocket clients in the background
///
/// 3. **Graceful Shutdown**
///    - Stop on Ctrl+C or when the WebSocket server fails
///    - Log datagram totals
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be loaded
/// - Either socket cannot be bound
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/relay.toml
/// ```
///
/// Expected output:
/// ```text
/// INFO jammon_relay: Jammon Relay v0.1.0 starting...
/// INFO jammon_relay::relay::ingress: UDP ingress listening on 0.0.0.0:44333
/// INFO jammon_relay::relay::egress: WebSocket egress listening on 0.0.0.0:8005
/// INFO jammon_relay::relay::egress: Client 192.168.1.20:51234 connected (subscriber 0)
/// INFO jammon_relay::relay: Received 100 datagrams (100 published, 0 dropped, 1 subscribers)
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(writer)
        .init();

    info!("Jammon Relay v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = match config_path(std::env::args()) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => {
            info!("No configuration file given, using defaults");
            Config::default()
        }
    };
    config
        .apply_env_overrides()
        .context("invalid port override in environment")?;

    let source = UdpIngress::bind(&config.ingress_addr(), config.ingress.max_datagram_size).await?;
    let listener = egress::bind(&config.egress_addr()).await?;

    let broadcaster = Arc::new(Broadcaster::new());

    let path = config.egress.path.clone();
    let mut egress_task = {
        let broadcaster = Arc::clone(&broadcaster);
        tokio::spawn(async move { egress::serve(listener, broadcaster, &path).await })
    };

    let monitor = tracing::enabled!(tracing::Level::DEBUG)
        .then(|| spawn_monitor(&broadcaster, config.session.max_track_segments));

    let mut relay = Relay::new(source, Arc::clone(&broadcaster))
        .with_stats_interval(config.ingress.stats_interval);

    info!("Press Ctrl+C to exit");

    let shutdown = async {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("Received Ctrl+C, shutting down..."),
                Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
            },
            result = &mut egress_task => match result {
                Ok(Ok(())) => warn!("WebSocket server stopped"),
                Ok(Err(e)) => error!("WebSocket server failed: {}", e),
                Err(e) => error!("WebSocket server task failed: {}", e),
            },
        }
    };

    let stats = relay.run(shutdown).await;

    egress_task.abort();
    if let Some(monitor) = monitor {
        monitor.abort();
    }

    info!(
        "Total datagrams: {} received, {} published, {} dropped",
        stats.received, stats.published, stats.dropped
    );

    Ok(())
}

/// Configuration file path, the first command-line argument if given
fn config_path<I>(mut args: I) -> Option<PathBuf>
where
    I: Iterator<Item = String>,
{
    args.nth(1).map(PathBuf::from)
}

/// Log a dashboard readout for every update, for watching a receiver
/// without a browser attached
fn spawn_monitor(broadcaster: &Arc<Broadcaster>, max_track_segments: usize) -> JoinHandle<()> {
    let mut subscription = broadcaster.subscribe();

    tokio::spawn(async move {
        let mut session = DashboardSession::new(max_track_segments);
        while let Some(update) = subscription.recv().await {
            let readout = session.apply(&update.record);
            debug!(
                "#{} {} lat {} lon {} alt {} m, sats {}, jamming b1 {} ({})",
                update.sequence,
                readout.timestamp,
                readout.latitude,
                readout.longitude,
                readout.altitude,
                readout.satellites_nav,
                readout.jamming_band1.broadband,
                readout.jamming_band1.description,
            );
            if let Some(band2) = &readout.jamming_band2 {
                debug!("#{} jamming b2 {} ({})", update.sequence, band2.broadband, band2.description);
            }
        }
    })
}
