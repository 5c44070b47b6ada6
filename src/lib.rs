//! # Jammon Relay Library
//!
//! Relays GNSS receiver telemetry to live dashboards.
//!
//! The receiver publishes one MessagePack map per UDP datagram. This library
//! decodes those datagrams into typed telemetry records, fans each record out
//! to WebSocket subscribers, and provides the spectrum reconstruction and
//! per-client presentation state a dashboard needs to render them.

pub mod config;
pub mod error;
pub mod relay;
pub mod session;
pub mod spectrum;
pub mod telemetry;
pub mod wire;
