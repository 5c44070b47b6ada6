//! # Error Types
//!
//! Custom error types for Jammon Relay using `thiserror`.
//!
//! Only [`RelayError::Transport`] is fatal. Decode and subscriber errors are
//! contained by the relay loop and surface as log lines.

use thiserror::Error;

/// Main error type for Jammon Relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// Socket bind/listen failure on the ingress or egress transport
    #[error("Transport error on {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// Telemetry datagram could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Delivery to a single subscriber failed
    #[error("Subscriber error: {0}")]
    Subscriber(#[from] SubscriberError),

    /// Serializing a record failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while decoding one telemetry datagram
///
/// Always recoverable: the datagram is dropped and the relay keeps listening.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Payload is not a single well-formed top-level map
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A mandatory field id is absent
    #[error("missing mandatory field {0}")]
    MissingField(u8),

    /// A field is present but its value has the wrong shape or range
    #[error("invalid field {id}: {reason}")]
    InvalidField { id: u8, reason: String },

    /// Second spectrum present without its band-2 companion field
    #[error("dual-band payload is missing companion field {missing}")]
    InconsistentDualBand { missing: u8 },
}

/// Errors delivering an update to one subscriber
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriberError {
    /// The receiving half of the subscription is gone
    #[error("subscriber {0} disconnected")]
    Disconnected(u64),

    /// The subscriber's transport rejected the update
    #[error("send to subscriber {id} failed: {reason}")]
    Send { id: u64, reason: String },
}

/// Result type alias for Jammon Relay
pub type Result<T> = std::result::Result<T, RelayError>;
