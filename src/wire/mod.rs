//! # Wire Schema Module
//!
//! The receiver's MessagePack telemetry datagram.
//!
//! This module handles:
//! - Field identifiers and the mandatory field set
//! - Decoding datagrams into typed records, including dual-band detection
//! - Encoding records back to the datagram layout and to the JSON `update` event

pub mod protocol;
pub mod decoder;
pub mod encoder;

pub use decoder::decode;
pub use encoder::{encode, to_update_json};
