//! # Telemetry Record Types
//!
//! Canonical in-memory representation of one receiver sample.
//!
//! Raw integer encodings are stored untouched; physical units are derived
//! on demand by the accessor methods.

use chrono::{DateTime, Utc};

/// Fixed-point scale for latitude/longitude (degrees × 10^7)
pub const DEGREES_SCALE: f64 = 1.0e7;

/// Fixed-point scale for altitude and accuracy (millimeters)
pub const MILLIMETERS_PER_METER: f64 = 1.0e3;

/// Receiver position, fixed-point as reported by the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Latitude in degrees × 10^7
    pub latitude_raw: i32,

    /// Longitude in degrees × 10^7
    pub longitude_raw: i32,

    /// Altitude in millimeters
    pub altitude_raw: i32,
}

impl Location {
    /// Latitude in degrees
    pub fn latitude_deg(&self) -> f64 {
        self.latitude_raw as f64 / DEGREES_SCALE
    }

    /// Longitude in degrees
    pub fn longitude_deg(&self) -> f64 {
        self.longitude_raw as f64 / DEGREES_SCALE
    }

    /// Altitude in meters
    pub fn altitude_m(&self) -> f64 {
        self.altitude_raw as f64 / MILLIMETERS_PER_METER
    }
}

/// Position accuracy estimate in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accuracy {
    pub horizontal_raw: i32,
    pub vertical_raw: i32,
}

impl Accuracy {
    /// Horizontal accuracy in meters
    pub fn horizontal_m(&self) -> f64 {
        self.horizontal_raw as f64 / MILLIMETERS_PER_METER
    }

    /// Vertical accuracy in meters
    pub fn vertical_m(&self) -> f64 {
        self.vertical_raw as f64 / MILLIMETERS_PER_METER
    }
}

/// Satellite counts for a single-band receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SatelliteCounts {
    pub acquired: u8,
    pub locked: u8,
    pub nav: u8,
}

/// Satellite counts for a dual-band receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DualBandSatellites {
    pub acquired_b1: u8,
    pub acquired_b2: u8,
    pub locked_b1: u8,
    pub locked_b2: u8,
    pub nav: u8,
}

/// RF front-end status for one band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RfStatus {
    /// Automatic gain control level
    pub agc: u16,

    /// Noise level
    pub noise: u16,
}

/// Broadband jamming indicator
///
/// `Unknown` is also the fallback for raw values outside `0..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadbandStatus {
    #[default]
    Unknown = 0,
    Ok = 1,
    Warning = 2,
    Critical = 3,
}

impl BroadbandStatus {
    /// Map a raw wire value, folding anything unrecognized into `Unknown`
    pub fn from_raw(raw: u64) -> Self {
        match raw {
            1 => Self::Ok,
            2 => Self::Warning,
            3 => Self::Critical,
            _ => Self::Unknown,
        }
    }

    /// Raw wire value
    pub fn as_raw(self) -> u8 {
        self as u8
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for BroadbandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Jamming indicators for one band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JammingStatus {
    /// Number of continuous-wave interferers detected
    pub continuous_wave_count: u8,

    /// Broadband interference indicator
    pub broadband_status: BroadbandStatus,
}

/// Raw RF spectrum snapshot for one band
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spectrum {
    /// Center frequency in Hz
    pub center_freq_hz: i64,

    /// Width of one power bin in Hz
    pub bin_resolution_hz: i64,

    /// Power per bin, 0-255
    pub power_bins: Vec<u8>,

    /// PGA gain in dB
    pub pga_gain: u8,
}

/// Status, jamming and spectrum data belonging to one band
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandTelemetry {
    pub rf: RfStatus,
    pub jamming: JammingStatus,
    pub spectrum: Spectrum,
}

/// Single-band receiver data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleBand {
    pub satellites: SatelliteCounts,
    pub band1: BandTelemetry,
}

/// Dual-band receiver data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualBand {
    pub satellites: DualBandSatellites,
    pub band1: BandTelemetry,
    pub band2: BandTelemetry,
}

/// Band mode of a record, selected once at decode time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bands {
    SingleBand(SingleBand),
    DualBand(DualBand),
}

/// One decoded telemetry sample
///
/// Immutable once decoded; every datagram yields a fresh record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryRecord {
    /// GNSS time, seconds since the Unix epoch
    pub timestamp: u64,
    pub location: Location,
    pub accuracy: Accuracy,
    pub bands: Bands,
}

impl TelemetryRecord {
    /// Timestamp in milliseconds, the unit presentation layers expect
    pub fn timestamp_millis(&self) -> i64 {
        (self.timestamp as i64).saturating_mul(1000)
    }

    /// Timestamp as a UTC instant, if representable
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_millis())
    }

    pub fn is_dual_band(&self) -> bool {
        matches!(self.bands, Bands::DualBand(_))
    }

    /// Band 1 data, present in both modes
    pub fn band1(&self) -> &BandTelemetry {
        match &self.bands {
            Bands::SingleBand(single) => &single.band1,
            Bands::DualBand(dual) => &dual.band1,
        }
    }

    /// Band 2 data, dual-band mode only
    pub fn band2(&self) -> Option<&BandTelemetry> {
        match &self.bands {
            Bands::SingleBand(_) => None,
            Bands::DualBand(dual) => Some(&dual.band2),
        }
    }

    /// Satellites used in the navigation solution
    pub fn satellites_nav(&self) -> u8 {
        match &self.bands {
            Bands::SingleBand(single) => single.satellites.nav,
            Bands::DualBand(dual) => dual.satellites.nav,
        }
    }
}
