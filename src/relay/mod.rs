//! # Relay Module
//!
//! Moves telemetry from the receiver to dashboard clients.
//!
//! This module handles:
//! - Receiving datagrams over UDP
//! - Decoding each datagram, dropping the ones that fail
//! - Publishing decoded records to all subscribers, latest sample wins
//! - Serving subscribers over WebSocket
//!
//! Datagrams are processed one at a time in arrival order, so subscribers
//! see records in the order they were received, with gaps where datagrams
//! were dropped.

pub mod broadcaster;
pub mod egress;
pub mod ingress;

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::DecodeError;
use crate::wire::decoder::decode;

pub use broadcaster::{Broadcaster, PublishReport, Subscription, SubscriptionId, UpdateEvent};
pub use ingress::{DatagramSource, UdpIngress};

/// Default number of datagrams between status log messages
pub const DEFAULT_STATS_INTERVAL: u64 = 100;

/// Datagram counters for the ingress loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngressStats {
    /// Datagrams received
    pub received: u64,
    /// Datagrams decoded and published
    pub published: u64,
    /// Datagrams dropped because they failed to decode
    pub dropped: u64,
}

/// Ingress loop: receive → decode → publish
pub struct Relay<S: DatagramSource> {
    source: S,
    broadcaster: Arc<Broadcaster>,
    stats: IngressStats,
    stats_interval: u64,
}

impl<S: DatagramSource> Relay<S> {
    pub fn new(source: S, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            source,
            broadcaster,
            stats: IngressStats::default(),
            stats_interval: DEFAULT_STATS_INTERVAL,
        }
    }

    /// Set how many datagrams pass between status log messages
    #[must_use]
    pub fn with_stats_interval(mut self, interval: u64) -> Self {
        self.stats_interval = interval.max(1);
        self
    }

    pub fn stats(&self) -> IngressStats {
        self.stats
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// Decode one datagram and publish it
    ///
    /// # Errors
    ///
    /// Returns the [`DecodeError`] if the datagram was dropped. Nothing is
    /// published in that case.
    pub fn handle_datagram(&mut self, datagram: &[u8]) -> Result<PublishReport, DecodeError> {
        self.stats.received += 1;

        let record = match decode(datagram) {
            Ok(record) => record,
            Err(e) => {
                self.stats.dropped += 1;
                return Err(e);
            }
        };

        debug!(
            "Decoded {} record, timestamp {}",
            if record.is_dual_band() { "dual-band" } else { "single-band" },
            record.timestamp
        );

        let report = self.broadcaster.publish(record);
        self.stats.published += 1;
        Ok(report)
    }

    /// Run until `shutdown` resolves
    ///
    /// Receive errors and undecodable datagrams are logged and skipped;
    /// neither stops the loop.
    pub async fn run<F>(&mut self, shutdown: F) -> IngressStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(
                        "Relay stopping: {} received, {} published, {} dropped",
                        self.stats.received, self.stats.published, self.stats.dropped
                    );
                    break;
                }

                received = self.source.recv_datagram() => {
                    let (datagram, peer) = match received {
                        Ok(received) => received,
                        Err(e) => {
                            warn!("UDP receive failed: {}", e);
                            continue;
                        }
                    };

                    match self.handle_datagram(&datagram) {
                        Ok(report) => debug!(
                            "Published update from {} to {} subscribers",
                            peer, report.delivered
                        ),
                        Err(e) => warn!(
                            "Dropped {}-byte datagram from {}: {}",
                            datagram.len(), peer, e
                        ),
                    }

                    if self.stats.received % self.stats_interval == 0 {
                        info!(
                            "Received {} datagrams ({} published, {} dropped, {} subscribers)",
                            self.stats.received,
                            self.stats.published,
                            self.stats.dropped,
                            self.broadcaster.subscriber_count()
                        );
                    }
                }
            }
        }

        self.stats
    }
}
