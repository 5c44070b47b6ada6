//! # Spectrum Module
//!
//! Rebuilds plotted spectrum curves from raw power bins.
//!
//! This module handles:
//! - Reconstructing the frequency axis of each band's snapshot
//! - Presentational rounding of frequencies
//! - Static band overlay tables for band 1 and band 2 plots

pub mod bands;
pub mod reconstruct;

pub use bands::{Band, BandAnnotation, BandLayout, Constellation};
pub use reconstruct::{reconstruct, round_to, SpectrumPoint};

use crate::telemetry::TelemetryRecord;

/// Reconstructed curves for every band a record carries, band 1 first
pub fn band_curves(record: &TelemetryRecord) -> Vec<(Band, Vec<SpectrumPoint>)> {
    let mut curves = vec![(Band::Band1, reconstruct(&record.band1().spectrum))];
    if let Some(band2) = record.band2() {
        curves.push((Band::Band2, reconstruct(&band2.spectrum)));
    }
    curves
}
