//! # Wire Protocol Constants
//!
//! Field identifiers and layout of the MessagePack telemetry map.
//!
//! Each datagram carries one top-level map keyed by small unsigned integers:
//!
//! ```text
//!  0: timestamp                  uint
//!  1: [lat, lon, alt]            sint (deg·1e7, deg·1e7, mm)
//!  2: [h_acc, v_acc]             uint (mm)
//!  3: [acq1, acq2, lock1, lock2, nav]
//!  4: [agc, noise]               band 1
//!  5: [cw_count, bb_status]      band 1
//!  6: [agc, noise]               band 2 (dual-band only)
//!  7: [cw_count, bb_status]      band 2 (dual-band only)
//!  8, 9: reserved
//! 10: [center_hz, res_hz, bins, pga]  band 1
//! 11: [center_hz, res_hz, bins, pga]  band 2, selects dual-band mode
//! ```

/// GNSS timestamp, seconds since epoch
pub const FIELD_TIMESTAMP: u8 = 0;

/// Latitude, longitude, altitude
pub const FIELD_LOCATION: u8 = 1;

/// Horizontal and vertical accuracy
pub const FIELD_ACCURACY: u8 = 2;

/// Satellite counts
pub const FIELD_SATELLITES: u8 = 3;

/// Band 1 AGC and noise
pub const FIELD_RF_BAND1: u8 = 4;

/// Band 1 jamming indicators
pub const FIELD_JAMMING_BAND1: u8 = 5;

/// Band 2 AGC and noise
pub const FIELD_RF_BAND2: u8 = 6;

/// Band 2 jamming indicators
pub const FIELD_JAMMING_BAND2: u8 = 7;

/// Band 1 spectrum snapshot
pub const FIELD_SPECTRUM_BAND1: u8 = 10;

/// Band 2 spectrum snapshot; its presence is the dual-band discriminator
pub const FIELD_SPECTRUM_BAND2: u8 = 11;

/// Fields every datagram must carry, in wire order
pub const MANDATORY_FIELDS: [u8; 7] = [
    FIELD_TIMESTAMP,
    FIELD_LOCATION,
    FIELD_ACCURACY,
    FIELD_SATELLITES,
    FIELD_RF_BAND1,
    FIELD_JAMMING_BAND1,
    FIELD_SPECTRUM_BAND1,
];

/// Companion fields required when [`FIELD_SPECTRUM_BAND2`] is present
pub const DUAL_BAND_COMPANION_FIELDS: [u8; 2] = [FIELD_RF_BAND2, FIELD_JAMMING_BAND2];

/// Highest field id this decoder understands
pub const MAX_KNOWN_FIELD: u8 = FIELD_SPECTRUM_BAND2;

/// Entries in a single-band map
pub const SINGLE_BAND_MAP_LEN: u32 = 7;

/// Entries in a dual-band map
pub const DUAL_BAND_MAP_LEN: u32 = 10;

/// Elements of the location array
pub const LOCATION_LEN: usize = 3;

/// Elements of the accuracy array
pub const ACCURACY_LEN: usize = 2;

/// Elements of the satellites array as the receiver always sends it
pub const SATELLITES_LEN: usize = 5;

/// Compact single-band satellites array `[acquired, locked, nav]`
pub const SATELLITES_COMPACT_LEN: usize = 3;

/// Elements of the RF and jamming arrays
pub const PAIR_LEN: usize = 2;

/// Elements of a spectrum array
pub const SPECTRUM_LEN: usize = 4;

/// Whether `id` belongs to the mandatory set
pub fn is_mandatory(id: u8) -> bool {
    MANDATORY_FIELDS.contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mandatory_set() {
        assert_eq!(MANDATORY_FIELDS, [0, 1, 2, 3, 4, 5, 10]);
        for id in [6u8, 7, 8, 9, 11] {
            assert!(!is_mandatory(id), "field {} must be optional", id);
        }
    }

    #[test]
    fn test_map_lengths_match_field_sets() {
        assert_eq!(SINGLE_BAND_MAP_LEN as usize, MANDATORY_FIELDS.len());
        assert_eq!(
            DUAL_BAND_MAP_LEN as usize,
            MANDATORY_FIELDS.len() + DUAL_BAND_COMPANION_FIELDS.len() + 1
        );
    }
}
