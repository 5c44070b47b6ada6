//! # Dashboard Session
//!
//! Per-client presentation state for a telemetry dashboard.
//!
//! A session owns its map and spectrum plot state. Each widget is created
//! lazily from the first record that carries its data and is updated in
//! place afterwards. Nothing here is shared between clients.
//!
//! ## Usage
//!
//! ```no_run
//! use jammon_relay::session::DashboardSession;
//! # fn next_record() -> jammon_relay::telemetry::TelemetryRecord { unimplemented!() }
//!
//! let mut session = DashboardSession::new(1000);
//! let readout = session.apply(&next_record());
//! println!("{} sats in nav solution", readout.satellites_nav);
//! ```

use std::collections::VecDeque;

use crate::spectrum::bands::{self, Band, BandAnnotation, POWER_RANGE};
use crate::spectrum::{reconstruct, round_to, SpectrumPoint};
use crate::telemetry::{BandTelemetry, Bands, JammingStatus, TelemetryRecord};

/// Zoom level the map opens at
pub const INITIAL_MAP_ZOOM: u8 = 16;

/// Separator between band 1 and band 2 values in one readout
pub const BAND_SEPARATOR: char = '\u{00B7}';

/// A geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// One drawn segment of the position track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSegment {
    pub from: LatLng,
    pub to: LatLng,
}

/// Map widget state
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub zoom: u8,
    pub center: LatLng,
    pub marker: LatLng,
    pub track: VecDeque<TrackSegment>,
}

/// Spectrum plot widget state for one band
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumPlot {
    pub band: Band,
    pub title: &'static str,
    pub value_range: (f64, f64),
    pub ticks: &'static [u32],
    pub annotations: &'static [BandAnnotation],
    pub points: Vec<SpectrumPoint>,
    pub pga_gain: u8,
}

impl SpectrumPlot {
    fn new(band: Band) -> Self {
        let layout = bands::layout(band);
        Self {
            band,
            title: layout.title,
            value_range: POWER_RANGE,
            ticks: layout.ticks,
            annotations: layout.annotations,
            points: Vec::new(),
            pga_gain: 0,
        }
    }

    fn update(&mut self, telemetry: &BandTelemetry) {
        self.points = reconstruct(&telemetry.spectrum);
        self.pga_gain = telemetry.spectrum.pga_gain;
    }
}

/// Jamming readout for one band
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JammingReadout {
    pub continuous_wave: String,
    pub broadband: String,
    pub description: &'static str,
}

impl From<&JammingStatus> for JammingReadout {
    fn from(jamming: &JammingStatus) -> Self {
        Self {
            continuous_wave: jamming.continuous_wave_count.to_string(),
            broadband: jamming.broadband_status.as_raw().to_string(),
            description: jamming.broadband_status.label(),
        }
    }
}

/// Formatted text for every dashboard field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readout {
    pub timestamp: String,
    pub latitude: String,
    pub longitude: String,
    pub altitude: String,
    pub horizontal_accuracy: String,
    pub vertical_accuracy: String,
    pub satellites_acquired: String,
    pub satellites_locked: String,
    pub satellites_nav: String,
    pub rf_agc: String,
    pub rf_noise: String,
    pub jamming_band1: JammingReadout,
    pub jamming_band2: Option<JammingReadout>,
    /// Whether band 2 elements should be shown
    pub show_band2: bool,
}

/// Presentation state owned by one dashboard client
#[derive(Debug, Clone)]
pub struct DashboardSession {
    map: Option<MapView>,
    band1_plot: Option<SpectrumPlot>,
    band2_plot: Option<SpectrumPlot>,
    band2_seen: bool,
    max_track_segments: usize,
    updates: u64,
}

impl DashboardSession {
    /// Create an empty session keeping at most `max_track_segments` track segments
    pub fn new(max_track_segments: usize) -> Self {
        Self {
            map: None,
            band1_plot: None,
            band2_plot: None,
            band2_seen: false,
            max_track_segments,
            updates: 0,
        }
    }

    pub fn map(&self) -> Option<&MapView> {
        self.map.as_ref()
    }

    pub fn spectrum_plot(&self, band: Band) -> Option<&SpectrumPlot> {
        match band {
            Band::Band1 => self.band1_plot.as_ref(),
            Band::Band2 => self.band2_plot.as_ref(),
        }
    }

    /// Records applied so far
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Apply one record to the session's widgets and format its readout
    pub fn apply(&mut self, record: &TelemetryRecord) -> Readout {
        self.updates += 1;
        if record.is_dual_band() {
            self.band2_seen = true;
        }

        self.update_map(record);

        self.band1_plot
            .get_or_insert_with(|| SpectrumPlot::new(Band::Band1))
            .update(record.band1());

        if let Some(band2) = record.band2() {
            self.band2_plot
                .get_or_insert_with(|| SpectrumPlot::new(Band::Band2))
                .update(band2);
        }

        self.readout(record)
    }

    fn update_map(&mut self, record: &TelemetryRecord) {
        let position = LatLng {
            lat: record.location.latitude_deg(),
            lng: record.location.longitude_deg(),
        };

        match &mut self.map {
            None => {
                self.map = Some(MapView {
                    zoom: INITIAL_MAP_ZOOM,
                    center: position,
                    marker: position,
                    track: VecDeque::new(),
                });
            }
            Some(map) => {
                map.track.push_back(TrackSegment {
                    from: map.marker,
                    to: position,
                });
                while map.track.len() > self.max_track_segments {
                    map.track.pop_front();
                }
                map.marker = position;
                map.center = position;
            }
        }
    }

    fn readout(&self, record: &TelemetryRecord) -> Readout {
        let timestamp = record
            .observed_at()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| record.timestamp.to_string());

        let band1 = record.band1();
        let (acquired, locked, nav, rf_agc, rf_noise) = match &record.bands {
            Bands::SingleBand(single) => (
                single.satellites.acquired.to_string(),
                single.satellites.locked.to_string(),
                single.satellites.nav,
                band1.rf.agc.to_string(),
                band1.rf.noise.to_string(),
            ),
            Bands::DualBand(dual) => (
                pair(dual.satellites.acquired_b1, dual.satellites.acquired_b2),
                pair(dual.satellites.locked_b1, dual.satellites.locked_b2),
                dual.satellites.nav,
                pair(dual.band1.rf.agc, dual.band2.rf.agc),
                pair(dual.band1.rf.noise, dual.band2.rf.noise),
            ),
        };

        Readout {
            timestamp,
            latitude: fixed(record.location.latitude_deg(), 4),
            longitude: fixed(record.location.longitude_deg(), 4),
            altitude: fixed(record.location.altitude_m(), 1),
            horizontal_accuracy: fixed(record.accuracy.horizontal_m(), 1),
            vertical_accuracy: fixed(record.accuracy.vertical_m(), 1),
            satellites_acquired: acquired,
            satellites_locked: locked,
            satellites_nav: nav.to_string(),
            rf_agc,
            rf_noise,
            jamming_band1: JammingReadout::from(&band1.jamming),
            jamming_band2: record.band2().map(|band2| JammingReadout::from(&band2.jamming)),
            show_band2: self.band2_seen,
        }
    }
}

impl Default for DashboardSession {
    fn default() -> Self {
        Self::new(1000)
    }
}

fn pair<T: std::fmt::Display>(band1: T, band2: T) -> String {
    format!("{}{}{}", band1, BAND_SEPARATOR, band2)
}

/// Round for display, dropping trailing zeros the way a plain number prints
fn fixed(value: f64, decimals: i32) -> String {
    round_to(value, decimals).to_string()
}
