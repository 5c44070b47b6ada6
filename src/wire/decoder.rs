//! # Telemetry Datagram Decoder
//!
//! Decodes one MessagePack datagram into a [`TelemetryRecord`].
//!
//! The payload is first read into a generic keyed structure, then the
//! mandatory field set is checked and each field is converted into its
//! typed form. Band mode is chosen once, from the presence of field 11.

use rmpv::Value;
use tracing::{debug, trace};

use super::protocol::*;
use crate::error::DecodeError;
use crate::telemetry::{
    Accuracy, BandTelemetry, Bands, BroadbandStatus, DualBand, DualBandSatellites,
    JammingStatus, Location, RfStatus, SatelliteCounts, SingleBand, Spectrum, TelemetryRecord,
};

type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Decode a complete telemetry datagram
///
/// # Arguments
///
/// * `bytes` - One datagram payload, exactly one MessagePack map
///
/// # Returns
///
/// * `Result<TelemetryRecord, DecodeError>` - Decoded record, or the reason it was rejected
///
/// # Errors
///
/// Returns error if:
/// - The payload is truncated, not a map, or has trailing bytes
/// - A mandatory field is absent
/// - A field being read has the wrong shape or an out-of-range value
/// - Field 11 is present but field 6 or 7 is not
///
/// Unknown field ids are ignored. Band-2 fields are never read for a
/// single-band payload.
pub fn decode(bytes: &[u8]) -> DecodeResult<TelemetryRecord> {
    let fields = FieldMap::parse(bytes)?;

    for id in MANDATORY_FIELDS {
        fields.require(id)?;
    }

    let timestamp = unsigned(fields.require(FIELD_TIMESTAMP)?, FIELD_TIMESTAMP, "timestamp")?;
    let location = decode_location(fields.require(FIELD_LOCATION)?)?;
    let accuracy = decode_accuracy(fields.require(FIELD_ACCURACY)?)?;
    let satellites = fields.require(FIELD_SATELLITES)?;

    let band1 = BandTelemetry {
        rf: decode_rf(fields.require(FIELD_RF_BAND1)?, FIELD_RF_BAND1)?,
        jamming: decode_jamming(fields.require(FIELD_JAMMING_BAND1)?, FIELD_JAMMING_BAND1)?,
        spectrum: decode_spectrum(fields.require(FIELD_SPECTRUM_BAND1)?, FIELD_SPECTRUM_BAND1)?,
    };

    let bands = match fields.get(FIELD_SPECTRUM_BAND2) {
        None => Bands::SingleBand(SingleBand {
            satellites: decode_single_band_satellites(satellites)?,
            band1,
        }),
        Some(spectrum2) => {
            for id in DUAL_BAND_COMPANION_FIELDS {
                if fields.get(id).is_none() {
                    return Err(DecodeError::InconsistentDualBand { missing: id });
                }
            }
            let band2 = BandTelemetry {
                rf: decode_rf(fields.require(FIELD_RF_BAND2)?, FIELD_RF_BAND2)?,
                jamming: decode_jamming(
                    fields.require(FIELD_JAMMING_BAND2)?,
                    FIELD_JAMMING_BAND2,
                )?,
                spectrum: decode_spectrum(spectrum2, FIELD_SPECTRUM_BAND2)?,
            };
            Bands::DualBand(DualBand {
                satellites: decode_dual_band_satellites(satellites)?,
                band1,
                band2,
            })
        }
    };

    Ok(TelemetryRecord {
        timestamp,
        location,
        accuracy,
        bands,
    })
}

/// Known fields of one datagram, indexed by field id
#[derive(Debug, Default)]
struct FieldMap {
    slots: [Option<Value>; MAX_KNOWN_FIELD as usize + 1],
}

impl FieldMap {
    fn parse(bytes: &[u8]) -> DecodeResult<Self> {
        if bytes.is_empty() {
            return Err(DecodeError::MalformedPayload("empty datagram".to_string()));
        }

        let mut cursor = bytes;
        let value = rmpv::decode::read_value(&mut cursor)
            .map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;

        if !cursor.is_empty() {
            return Err(DecodeError::MalformedPayload(format!(
                "{} trailing bytes after top-level map",
                cursor.len()
            )));
        }

        let entries = match value {
            Value::Map(entries) => entries,
            other => {
                return Err(DecodeError::MalformedPayload(format!(
                    "expected top-level map, got {}",
                    kind(&other)
                )))
            }
        };

        let mut fields = Self::default();
        for (key, value) in entries {
            match key.as_u64() {
                Some(id) if id <= MAX_KNOWN_FIELD as u64 => fields.slots[id as usize] = Some(value),
                Some(id) => trace!("Ignoring unknown field id {}", id),
                None => trace!("Ignoring non-integer key {}", kind(&key)),
            }
        }

        Ok(fields)
    }

    fn get(&self, id: u8) -> Option<&Value> {
        self.slots.get(id as usize).and_then(Option::as_ref)
    }

    fn require(&self, id: u8) -> DecodeResult<&Value> {
        self.get(id).ok_or(DecodeError::MissingField(id))
    }
}

fn decode_location(value: &Value) -> DecodeResult<Location> {
    let items = array(value, FIELD_LOCATION, &[LOCATION_LEN])?;
    Ok(Location {
        latitude_raw: signed(&items[0], FIELD_LOCATION, "latitude")?,
        longitude_raw: signed(&items[1], FIELD_LOCATION, "longitude")?,
        altitude_raw: signed(&items[2], FIELD_LOCATION, "altitude")?,
    })
}

fn decode_accuracy(value: &Value) -> DecodeResult<Accuracy> {
    let items = array(value, FIELD_ACCURACY, &[ACCURACY_LEN])?;
    Ok(Accuracy {
        horizontal_raw: signed(&items[0], FIELD_ACCURACY, "horizontal accuracy")?,
        vertical_raw: signed(&items[1], FIELD_ACCURACY, "vertical accuracy")?,
    })
}

/// Single-band satellites: indices 0, 2, 4 of the five-slot array, or the
/// compact `[acquired, locked, nav]` form
fn decode_single_band_satellites(value: &Value) -> DecodeResult<SatelliteCounts> {
    let items = array(value, FIELD_SATELLITES, &[SATELLITES_LEN, SATELLITES_COMPACT_LEN])?;
    let (acquired, locked, nav) = if items.len() == SATELLITES_LEN {
        (&items[0], &items[2], &items[4])
    } else {
        (&items[0], &items[1], &items[2])
    };

    Ok(SatelliteCounts {
        acquired: unsigned(acquired, FIELD_SATELLITES, "acquired")?,
        locked: unsigned(locked, FIELD_SATELLITES, "locked")?,
        nav: unsigned(nav, FIELD_SATELLITES, "nav")?,
    })
}

fn decode_dual_band_satellites(value: &Value) -> DecodeResult<DualBandSatellites> {
    let items = array(value, FIELD_SATELLITES, &[SATELLITES_LEN])?;
    Ok(DualBandSatellites {
        acquired_b1: unsigned(&items[0], FIELD_SATELLITES, "acquired band 1")?,
        acquired_b2: unsigned(&items[1], FIELD_SATELLITES, "acquired band 2")?,
        locked_b1: unsigned(&items[2], FIELD_SATELLITES, "locked band 1")?,
        locked_b2: unsigned(&items[3], FIELD_SATELLITES, "locked band 2")?,
        nav: unsigned(&items[4], FIELD_SATELLITES, "nav")?,
    })
}

fn decode_rf(value: &Value, id: u8) -> DecodeResult<RfStatus> {
    let items = array(value, id, &[PAIR_LEN])?;
    Ok(RfStatus {
        agc: unsigned(&items[0], id, "agc")?,
        noise: unsigned(&items[1], id, "noise")?,
    })
}

fn decode_jamming(value: &Value, id: u8) -> DecodeResult<JammingStatus> {
    let items = array(value, id, &[PAIR_LEN])?;
    let raw_status: u64 = unsigned(&items[1], id, "broadband status")?;
    let broadband_status = BroadbandStatus::from_raw(raw_status);
    if broadband_status.as_raw() as u64 != raw_status {
        debug!("Field {}: broadband status {} out of range, treating as UNKNOWN", id, raw_status);
    }

    Ok(JammingStatus {
        continuous_wave_count: unsigned(&items[0], id, "continuous wave count")?,
        broadband_status,
    })
}

fn decode_spectrum(value: &Value, id: u8) -> DecodeResult<Spectrum> {
    let items = array(value, id, &[SPECTRUM_LEN])?;

    let power_bins = match &items[2] {
        Value::Binary(bins) => bins.clone(),
        Value::Array(bins) => bins
            .iter()
            .map(|bin| unsigned::<u8>(bin, id, "power bin"))
            .collect::<DecodeResult<Vec<u8>>>()?,
        other => {
            return Err(DecodeError::InvalidField {
                id,
                reason: format!("power bins must be binary, got {}", kind(other)),
            })
        }
    };

    Ok(Spectrum {
        center_freq_hz: signed(&items[0], id, "center frequency")?,
        bin_resolution_hz: signed(&items[1], id, "bin resolution")?,
        power_bins,
        pga_gain: unsigned(&items[3], id, "pga gain")?,
    })
}

/// Borrow the elements of an array field whose length is one of `accepted`
fn array<'a>(value: &'a Value, id: u8, accepted: &[usize]) -> DecodeResult<&'a [Value]> {
    let items = value.as_array().ok_or_else(|| DecodeError::InvalidField {
        id,
        reason: format!("expected array, got {}", kind(value)),
    })?;

    if !accepted.contains(&items.len()) {
        return Err(DecodeError::InvalidField {
            id,
            reason: format!("expected {:?} elements, got {}", accepted, items.len()),
        });
    }

    Ok(items)
}

fn unsigned<T: TryFrom<u64>>(value: &Value, id: u8, name: &str) -> DecodeResult<T> {
    let raw = value.as_u64().ok_or_else(|| DecodeError::InvalidField {
        id,
        reason: format!("{} must be an unsigned integer, got {}", name, kind(value)),
    })?;

    T::try_from(raw).map_err(|_| DecodeError::InvalidField {
        id,
        reason: format!("{} value {} out of range", name, raw),
    })
}

fn signed<T: TryFrom<i64>>(value: &Value, id: u8, name: &str) -> DecodeResult<T> {
    let raw = value.as_i64().ok_or_else(|| DecodeError::InvalidField {
        id,
        reason: format!("{} must be an integer, got {}", name, kind(value)),
    })?;

    T::try_from(raw).map_err(|_| DecodeError::InvalidField {
        id,
        reason: format!("{} value {} out of range", name, raw),
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Nil => "nil",
        Value::Boolean(_) => "boolean",
        Value::Integer(_) => "integer",
        Value::F32(_) | Value::F64(_) => "float",
        Value::String(_) => "string",
        Value::Binary(_) => "binary",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Ext(..) => "ext",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::types::fixtures::{dual_band_record, single_band_record};
    use crate::wire::encoder::{encode, to_wire_value};

    fn pack(value: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, value).unwrap();
        buf
    }

    fn int(v: i64) -> Value {
        Value::from(v)
    }

    fn pair(a: i64, b: i64) -> Value {
        Value::Array(vec![int(a), int(b)])
    }

    fn spectrum(center: i64) -> Value {
        Value::Array(vec![
            int(center),
            int(250_000),
            Value::Binary(vec![10, 20, 30, 40]),
            int(54),
        ])
    }

    /// Map shaped like the receiver's single-band output
    fn single_band_entries() -> Vec<(Value, Value)> {
        vec![
            (int(0), int(1_700_000_000)),
            (int(1), Value::Array(vec![int(515_074_000), int(-1_278_000), int(35_200)])),
            (int(2), pair(1_460, 2_310)),
            (int(3), Value::Array(vec![int(24), int(0), int(18), int(0), int(15)])),
            (int(4), pair(4120, 87)),
            (int(5), pair(0, 1)),
            (int(10), spectrum(1_575_420_000)),
        ]
    }

    fn without(entries: Vec<(Value, Value)>, id: i64) -> Vec<(Value, Value)> {
        entries.into_iter().filter(|(k, _)| k.as_i64() != Some(id)).collect()
    }

    #[test]
    fn test_decode_single_band() {
        let bytes = pack(&Value::Map(single_band_entries()));
        let record = decode(&bytes).unwrap();

        assert_eq!(record.timestamp, 1_700_000_000);
        assert_eq!(record.location.latitude_raw, 515_074_000);
        assert_eq!(record.location.longitude_raw, -1_278_000);
        assert_eq!(record.accuracy.vertical_raw, 2_310);

        match &record.bands {
            Bands::SingleBand(single) => {
                assert_eq!(single.satellites.acquired, 24);
                assert_eq!(single.satellites.locked, 18);
                assert_eq!(single.satellites.nav, 15);
                assert_eq!(single.band1.rf.agc, 4120);
                assert_eq!(single.band1.jamming.broadband_status, BroadbandStatus::Ok);
                assert_eq!(single.band1.spectrum.power_bins, vec![10, 20, 30, 40]);
                assert_eq!(single.band1.spectrum.pga_gain, 54);
            }
            other => panic!("Expected single-band record, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_compact_satellites() {
        let mut entries = without(single_band_entries(), 3);
        entries.push((int(3), Value::Array(vec![int(9), int(7), int(5)])));

        let record = decode(&pack(&Value::Map(entries))).unwrap();
        match record.bands {
            Bands::SingleBand(single) => {
                assert_eq!(
                    single.satellites,
                    SatelliteCounts { acquired: 9, locked: 7, nav: 5 }
                );
            }
            other => panic!("Expected single-band record, got {:?}", other),
        }
    }

    #[test]
    fn test_single_band_ignores_band2_companions() {
        // Garbage in 6/7 must not matter without field 11
        let mut entries = single_band_entries();
        entries.push((int(6), Value::from("not an array")));
        entries.push((int(7), Value::Nil));

        let record = decode(&pack(&Value::Map(entries))).unwrap();
        assert!(!record.is_dual_band());
    }

    #[test]
    fn test_decode_dual_band() {
        let mut entries = single_band_entries();
        entries.push((int(6), pair(3900, 92)));
        entries.push((int(7), pair(2, 3)));
        entries.push((int(11), spectrum(1_227_600_000)));
        entries[3] = (int(3), Value::Array(vec![int(26), int(14), int(20), int(11), int(17)]));

        let record = decode(&pack(&Value::Map(entries))).unwrap();
        match &record.bands {
            Bands::DualBand(dual) => {
                assert_eq!(dual.satellites.acquired_b2, 14);
                assert_eq!(dual.satellites.locked_b2, 11);
                assert_eq!(dual.band2.rf, RfStatus { agc: 3900, noise: 92 });
                assert_eq!(dual.band2.jamming.continuous_wave_count, 2);
                assert_eq!(dual.band2.jamming.broadband_status, BroadbandStatus::Critical);
                assert_eq!(dual.band2.spectrum.center_freq_hz, 1_227_600_000);
                assert_eq!(dual.band1.spectrum.center_freq_hz, 1_575_420_000);
            }
            other => panic!("Expected dual-band record, got {:?}", other),
        }
    }

    #[test]
    fn test_dual_band_missing_companion() {
        let mut entries = single_band_entries();
        entries.push((int(6), pair(3900, 92)));
        entries.push((int(11), spectrum(1_227_600_000)));

        let result = decode(&pack(&Value::Map(entries)));
        assert_eq!(result, Err(DecodeError::InconsistentDualBand { missing: 7 }));
    }

    #[test]
    fn test_dual_band_rejects_compact_satellites() {
        let mut entries = single_band_entries();
        entries.push((int(6), pair(3900, 92)));
        entries.push((int(7), pair(0, 1)));
        entries.push((int(11), spectrum(1_227_600_000)));
        entries[3] = (int(3), Value::Array(vec![int(9), int(7), int(5)]));

        let result = decode(&pack(&Value::Map(entries)));
        assert!(matches!(result, Err(DecodeError::InvalidField { id: 3, .. })));
    }

    #[test]
    fn test_missing_mandatory_fields() {
        for id in MANDATORY_FIELDS {
            let entries = without(single_band_entries(), id as i64);
            let result = decode(&pack(&Value::Map(entries)));
            assert_eq!(result, Err(DecodeError::MissingField(id)), "field {}", id);
        }
    }

    #[test]
    fn test_unknown_and_reserved_fields_ignored() {
        let mut entries = single_band_entries();
        entries.push((int(8), Value::from("reserved")));
        entries.push((int(42), Value::Nil));
        entries.push((Value::from("name"), Value::from("receiver")));

        assert!(decode(&pack(&Value::Map(entries))).is_ok());
    }

    #[test]
    fn test_out_of_range_broadband_status() {
        let mut entries = without(single_band_entries(), 5);
        entries.push((int(5), pair(4, 9)));

        let record = decode(&pack(&Value::Map(entries))).unwrap();
        assert_eq!(record.band1().jamming.broadband_status, BroadbandStatus::Unknown);
        assert_eq!(record.band1().jamming.continuous_wave_count, 4);
    }

    #[test]
    fn test_power_bins_as_integer_array() {
        let mut entries = without(single_band_entries(), 10);
        entries.push((
            int(10),
            Value::Array(vec![
                int(1_575_420_000),
                int(250_000),
                Value::Array(vec![int(0), int(128), int(255)]),
                int(54),
            ]),
        ));

        let record = decode(&pack(&Value::Map(entries))).unwrap();
        assert_eq!(record.band1().spectrum.power_bins, vec![0, 128, 255]);
    }

    #[test]
    fn test_power_bin_out_of_range() {
        let mut entries = without(single_band_entries(), 10);
        entries.push((
            int(10),
            Value::Array(vec![
                int(1_575_420_000),
                int(250_000),
                Value::Array(vec![int(256)]),
                int(54),
            ]),
        ));

        let result = decode(&pack(&Value::Map(entries)));
        assert!(matches!(result, Err(DecodeError::InvalidField { id: 10, .. })));
    }

    #[test]
    fn test_wrong_array_length() {
        let mut entries = without(single_band_entries(), 1);
        entries.push((int(1), pair(1, 2)));

        let result = decode(&pack(&Value::Map(entries)));
        assert!(matches!(result, Err(DecodeError::InvalidField { id: 1, .. })));
    }

    #[test]
    fn test_latitude_overflow() {
        let mut entries = without(single_band_entries(), 1);
        entries.push((
            int(1),
            Value::Array(vec![int(i64::from(i32::MAX) + 1), int(0), int(0)]),
        ));

        let result = decode(&pack(&Value::Map(entries)));
        assert!(matches!(result, Err(DecodeError::InvalidField { id: 1, .. })));
    }

    #[test]
    fn test_non_map_payload() {
        let bytes = pack(&Value::Array(vec![int(1), int(2)]));
        assert!(matches!(decode(&bytes), Err(DecodeError::MalformedPayload(_))));
    }

    #[test]
    fn test_empty_payload() {
        assert!(matches!(decode(&[]), Err(DecodeError::MalformedPayload(_))));
    }

    #[test]
    fn test_truncated_payload() {
        let bytes = encode(&single_band_record()).unwrap();
        for cut in [1, bytes.len() / 2, bytes.len() - 1] {
            let result = decode(&bytes[..cut]);
            assert!(
                matches!(result, Err(DecodeError::MalformedPayload(_))),
                "cut at {} gave {:?}",
                cut,
                result
            );
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode(&single_band_record()).unwrap();
        bytes.push(0xC0);
        assert!(matches!(decode(&bytes), Err(DecodeError::MalformedPayload(_))));
    }

    #[test]
    fn test_round_trip_single_band() {
        let record = single_band_record();
        let decoded = decode(&encode(&record).unwrap()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_round_trip_dual_band() {
        let record = dual_band_record();
        let decoded = decode(&encode(&record).unwrap()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_decode_after_malformed_datagram() {
        assert!(decode(&[0x93, 0x01]).is_err());

        let value = to_wire_value(&dual_band_record());
        assert_eq!(decode(&pack(&value)).unwrap(), dual_band_record());
    }
}
