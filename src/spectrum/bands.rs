//! # Band Annotations
//!
//! Static reference data for drawing spectrum plots: the constellation
//! sub-bands overlaid on each plot, axis ticks and titles.
//!
//! None of this is derived from a sample.

/// Which receiver band a plot shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    /// L1 / E1 / B1, around 1575.42 MHz
    Band1,
    /// L2 / E5b / B2, around 1207-1227 MHz
    Band2,
}

/// Satellite constellation, used to pick an overlay colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constellation {
    Beidou,
    Galileo,
    Gps,
    Glonass,
}

impl Constellation {
    /// RGBA fill colour for the constellation's overlay
    pub fn colour(self) -> &'static str {
        match self {
            Self::Beidou => "rgba(255, 193, 204, 1.0)",
            Self::Galileo => "rgba(178, 241, 255, 1.0)",
            Self::Gps => "rgba(163, 255, 153, 1.0)",
            Self::Glonass => "rgba(241, 222, 197, 1.0)",
        }
    }
}

/// One highlighted sub-band on a spectrum plot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandAnnotation {
    pub label: &'static str,
    pub constellation: Constellation,
    /// Start of the highlighted span in MHz
    pub freq_start: f64,
    /// End of the highlighted span in MHz
    pub freq_end: f64,
    /// Pixels from the top of the plot area where the highlight starts
    pub vertical_offset: u32,
    /// Frequency in MHz where the label is centered
    pub label_freq: f64,
    /// Pixels from the top of the plot area for the label baseline
    pub label_offset: u32,
}

/// Static plot layout for one band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandLayout {
    pub band: Band,
    pub title: &'static str,
    /// Labelled x-axis ticks in MHz
    pub ticks: &'static [u32],
    pub annotations: &'static [BandAnnotation],
}

/// Power axis range shared by all plots
pub const POWER_RANGE: (f64, f64) = (0.0, 255.0);

/// Band 1 overlays
pub const BAND1_ANNOTATIONS: [BandAnnotation; 4] = [
    BandAnnotation {
        label: "B1",
        constellation: Constellation::Beidou,
        freq_start: 1559.0,
        freq_end: 1592.0,
        vertical_offset: 10,
        label_freq: 1575.42,
        label_offset: 25,
    },
    BandAnnotation {
        label: "E1",
        constellation: Constellation::Galileo,
        freq_start: 1563.0,
        freq_end: 1588.0,
        vertical_offset: 30,
        label_freq: 1575.42,
        label_offset: 45,
    },
    BandAnnotation {
        label: "L1",
        constellation: Constellation::Gps,
        freq_start: 1565.0,
        freq_end: 1586.0,
        vertical_offset: 50,
        label_freq: 1575.42,
        label_offset: 65,
    },
    BandAnnotation {
        label: "G1",
        constellation: Constellation::Glonass,
        freq_start: 1596.0,
        freq_end: 1606.0,
        vertical_offset: 10,
        label_freq: 1601.0,
        label_offset: 30,
    },
];

/// Band 2 overlays
pub const BAND2_ANNOTATIONS: [BandAnnotation; 4] = [
    BandAnnotation {
        label: "B2",
        constellation: Constellation::Beidou,
        freq_start: 1195.14,
        freq_end: 1219.14,
        vertical_offset: 10,
        label_freq: 1207.14,
        label_offset: 25,
    },
    BandAnnotation {
        label: "E5b",
        constellation: Constellation::Galileo,
        freq_start: 1196.91,
        freq_end: 1217.37,
        vertical_offset: 30,
        label_freq: 1207.2,
        label_offset: 45,
    },
    BandAnnotation {
        label: "L2",
        constellation: Constellation::Gps,
        freq_start: 1217.0,
        freq_end: 1238.0,
        vertical_offset: 50,
        label_freq: 1227.5,
        label_offset: 65,
    },
    BandAnnotation {
        label: "G2",
        constellation: Constellation::Glonass,
        freq_start: 1241.0,
        freq_end: 1255.0,
        vertical_offset: 10,
        label_freq: 1248.0,
        label_offset: 25,
    },
];

const BAND1_TICKS: [u32; 5] = [1525, 1550, 1575, 1600, 1625];
const BAND2_TICKS: [u32; 5] = [1175, 1200, 1225, 1250, 1275];

static BAND1_LAYOUT: BandLayout = BandLayout {
    band: Band::Band1,
    title: "L1 / E1 / B1",
    ticks: &BAND1_TICKS,
    annotations: &BAND1_ANNOTATIONS,
};

static BAND2_LAYOUT: BandLayout = BandLayout {
    band: Band::Band2,
    title: "L2 / E5 / B2",
    ticks: &BAND2_TICKS,
    annotations: &BAND2_ANNOTATIONS,
};

/// Plot layout for a band
pub fn layout(band: Band) -> &'static BandLayout {
    match band {
        Band::Band1 => &BAND1_LAYOUT,
        Band::Band2 => &BAND2_LAYOUT,
    }
}

/// Overlays for a band
pub fn annotations(band: Band) -> &'static [BandAnnotation] {
    layout(band).annotations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotations_have_ordered_spans() {
        for band in [Band::Band1, Band::Band2] {
            for annotation in annotations(band) {
                assert!(
                    annotation.freq_start < annotation.freq_end,
                    "{} span is inverted",
                    annotation.label
                );
                assert!(
                    annotation.label_freq >= annotation.freq_start
                        && annotation.label_freq <= annotation.freq_end,
                    "{} label outside its span",
                    annotation.label
                );
            }
        }
    }

    #[test]
    fn test_band1_family_covers_l1() {
        let labels: Vec<_> = annotations(Band::Band1).iter().map(|a| a.label).collect();
        assert_eq!(labels, vec!["B1", "E1", "L1", "G1"]);

        for annotation in &annotations(Band::Band1)[..3] {
            assert!(annotation.freq_start < 1575.42 && annotation.freq_end > 1575.42);
        }
    }

    #[test]
    fn test_band2_family() {
        let labels: Vec<_> = annotations(Band::Band2).iter().map(|a| a.label).collect();
        assert_eq!(labels, vec!["B2", "E5b", "L2", "G2"]);

        let l2 = annotations(Band::Band2).iter().find(|a| a.label == "L2").unwrap();
        assert_eq!(l2.label_freq, 1227.5);
        assert_eq!(l2.constellation, Constellation::Gps);
    }

    #[test]
    fn test_layouts() {
        assert_eq!(layout(Band::Band1).title, "L1 / E1 / B1");
        assert_eq!(layout(Band::Band2).title, "L2 / E5 / B2");
        assert_eq!(layout(Band::Band1).ticks.first(), Some(&1525));
        assert_eq!(layout(Band::Band2).ticks.last(), Some(&1275));
    }

    #[test]
    fn test_constellation_colours_distinct() {
        let colours = [
            Constellation::Beidou.colour(),
            Constellation::Galileo.colour(),
            Constellation::Gps.colour(),
            Constellation::Glonass.colour(),
        ];
        for (i, a) in colours.iter().enumerate() {
            for b in &colours[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
