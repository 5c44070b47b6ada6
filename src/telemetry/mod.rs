//! # Telemetry Module
//!
//! The decoded telemetry record model.
//!
//! A record is either single-band or dual-band. The distinction is made
//! once by the decoder and carried as the [`Bands`] variant, so consumers
//! match on it instead of probing for optional fields.

pub mod types;

pub use types::{
    Accuracy, BandTelemetry, Bands, BroadbandStatus, DualBand, DualBandSatellites,
    JammingStatus, Location, RfStatus, SatelliteCounts, SingleBand, Spectrum, TelemetryRecord,
};
