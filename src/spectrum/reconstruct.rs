//! # Spectrum Reconstruction
//!
//! Turns a raw power-bin array into (frequency, power) points.
//!
//! Bins are laid out on a 256-bin window convention: bin 0 sits at
//! `center - 128 * resolution` and each following bin is one resolution
//! step higher, whatever the actual bin count.
//!
//! ## Usage
//!
//! ```
//! use jammon_relay::spectrum::reconstruct::reconstruct;
//! use jammon_relay::telemetry::Spectrum;
//!
//! let spectrum = Spectrum {
//!     center_freq_hz: 1_575_420_000,
//!     bin_resolution_hz: 250_000,
//!     power_bins: vec![0; 256],
//!     pga_gain: 54,
//! };
//!
//! let points = reconstruct(&spectrum);
//! assert_eq!(points.len(), 256);
//! assert_eq!(points[0].display_mhz, 1543.4);
//! ```

use crate::telemetry::Spectrum;

/// Offset, in bins, of the first bin below the center frequency
pub const CENTER_BIN_OFFSET: f64 = 128.0;

/// Decimal places kept for displayed frequencies
pub const DISPLAY_DECIMALS: i32 = 1;

const HZ_PER_MHZ: f64 = 1.0e6;

/// One plotted spectrum point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumPoint {
    /// Exact bin frequency in MHz
    pub frequency_mhz: f64,

    /// Frequency rounded for display
    pub display_mhz: f64,

    /// Raw bin power
    pub power: u8,
}

/// Reconstruct the frequency axis of a spectrum snapshot
///
/// # Arguments
///
/// * `spectrum` - Raw spectrum with center frequency and bin resolution in Hz
///
/// # Returns
///
/// * `Vec<SpectrumPoint>` - Exactly one point per power bin, in bin order
///
/// The formula is
/// `center/1e6 - 128 * (res/1e6) + index * (res/1e6)`.
/// Rounding only affects `display_mhz`; `frequency_mhz` keeps full precision.
pub fn reconstruct(spectrum: &Spectrum) -> Vec<SpectrumPoint> {
    let center_mhz = spectrum.center_freq_hz as f64 / HZ_PER_MHZ;
    let step_mhz = spectrum.bin_resolution_hz as f64 / HZ_PER_MHZ;
    let start_mhz = center_mhz - CENTER_BIN_OFFSET * step_mhz;

    spectrum
        .power_bins
        .iter()
        .enumerate()
        .map(|(index, &power)| {
            let frequency_mhz = start_mhz + index as f64 * step_mhz;
            SpectrumPoint {
                frequency_mhz,
                display_mhz: round_to(frequency_mhz, DISPLAY_DECIMALS),
                power,
            }
        })
        .collect()
}

/// Round to `decimals` places, halves rounding toward positive infinity
///
/// Matches the rounding the dashboard has always applied to readouts.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor + 0.5).floor() / factor
}
