//! # Telemetry Encoder
//!
//! Builds the field-id-keyed wire structure from a [`TelemetryRecord`].
//!
//! The same structure is written as MessagePack (the receiver's datagram
//! layout) and rendered as JSON for the `update` event sent to subscribers.

use rmpv::Value;
use serde_json::{json, Map as JsonMap, Value as JsonValue};

use super::protocol::*;
use crate::error::{RelayError, Result};
use crate::telemetry::{BandTelemetry, Bands, TelemetryRecord};

/// Name of the event emitted to subscribers
pub const UPDATE_EVENT: &str = "update";

/// Build the wire map for a record
///
/// Entries are written in field id order: 7 entries for a single-band
/// record, 10 for a dual-band one. Single-band satellites use the
/// five-slot layout with zeroed band-2 slots, as the receiver sends them.
///
/// # Examples
///
/// ```no_run
/// use jammon_relay::wire::encoder::to_wire_value;
/// # fn record() -> jammon_relay::telemetry::TelemetryRecord { unimplemented!() }
///
/// let value = to_wire_value(&record());
/// assert!(value.is_map());
/// ```
pub fn to_wire_value(record: &TelemetryRecord) -> Value {
    let mut entries = Vec::with_capacity(DUAL_BAND_MAP_LEN as usize);

    entries.push(entry(FIELD_TIMESTAMP, Value::from(record.timestamp)));
    entries.push(entry(
        FIELD_LOCATION,
        ints(&[
            i64::from(record.location.latitude_raw),
            i64::from(record.location.longitude_raw),
            i64::from(record.location.altitude_raw),
        ]),
    ));
    entries.push(entry(
        FIELD_ACCURACY,
        ints(&[
            i64::from(record.accuracy.horizontal_raw),
            i64::from(record.accuracy.vertical_raw),
        ]),
    ));

    let satellites = match &record.bands {
        Bands::SingleBand(single) => {
            let s = single.satellites;
            [s.acquired, 0, s.locked, 0, s.nav]
        }
        Bands::DualBand(dual) => {
            let s = dual.satellites;
            [s.acquired_b1, s.acquired_b2, s.locked_b1, s.locked_b2, s.nav]
        }
    };
    entries.push(entry(
        FIELD_SATELLITES,
        ints(&satellites.map(i64::from)),
    ));

    let band1 = record.band1();
    entries.push(entry(FIELD_RF_BAND1, rf_value(band1)));
    entries.push(entry(FIELD_JAMMING_BAND1, jamming_value(band1)));

    if let Some(band2) = record.band2() {
        entries.push(entry(FIELD_RF_BAND2, rf_value(band2)));
        entries.push(entry(FIELD_JAMMING_BAND2, jamming_value(band2)));
    }

    entries.push(entry(FIELD_SPECTRUM_BAND1, spectrum_value(band1)));

    if let Some(band2) = record.band2() {
        entries.push(entry(FIELD_SPECTRUM_BAND2, spectrum_value(band2)));
    }

    Value::Map(entries)
}

/// Encode a record as one MessagePack datagram
///
/// # Errors
///
/// Returns [`RelayError::Encode`] if the writer fails
pub fn encode(record: &TelemetryRecord) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(1024);
    rmpv::encode::write_value(&mut buf, &to_wire_value(record))
        .map_err(|e| RelayError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Render a wire value as JSON
///
/// Map keys become strings, binary becomes an array of byte values.
pub fn wire_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Nil => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Integer(i) => match (i.as_u64(), i.as_i64()) {
            (Some(u), _) => JsonValue::from(u),
            (None, Some(s)) => JsonValue::from(s),
            (None, None) => JsonValue::Null,
        },
        Value::F32(f) => JsonValue::from(f64::from(*f)),
        Value::F64(f) => JsonValue::from(*f),
        Value::String(s) => JsonValue::from(s.as_str().unwrap_or_default()),
        Value::Binary(bytes) => JsonValue::Array(bytes.iter().map(|&b| JsonValue::from(b)).collect()),
        Value::Array(items) => JsonValue::Array(items.iter().map(wire_to_json).collect()),
        Value::Map(entries) => {
            let mut map = JsonMap::with_capacity(entries.len());
            for (key, value) in entries {
                let key = match key {
                    Value::String(s) => s.as_str().unwrap_or_default().to_string(),
                    other => other.to_string(),
                };
                map.insert(key, wire_to_json(value));
            }
            JsonValue::Object(map)
        }
        Value::Ext(..) => JsonValue::Null,
    }
}

/// Render the `update` event text sent to subscribers
///
/// Format: `{"event":"update","data":{"0":...,"1":[...],...}}`
pub fn to_update_json(record: &TelemetryRecord) -> String {
    json!({
        "event": UPDATE_EVENT,
        "data": wire_to_json(&to_wire_value(record)),
    })
    .to_string()
}

fn entry(id: u8, value: Value) -> (Value, Value) {
    (Value::from(id), value)
}

fn ints(values: &[i64]) -> Value {
    Value::Array(values.iter().map(|&v| Value::from(v)).collect())
}

fn rf_value(band: &BandTelemetry) -> Value {
    ints(&[i64::from(band.rf.agc), i64::from(band.rf.noise)])
}

fn jamming_value(band: &BandTelemetry) -> Value {
    ints(&[
        i64::from(band.jamming.continuous_wave_count),
        i64::from(band.jamming.broadband_status.as_raw()),
    ])
}

fn spectrum_value(band: &BandTelemetry) -> Value {
    let spectrum = &band.spectrum;
    Value::Array(vec![
        Value::from(spectrum.center_freq_hz),
        Value::from(spectrum.bin_resolution_hz),
        Value::Binary(spectrum.power_bins.clone()),
        Value::from(spectrum.pga_gain),
    ])
}
