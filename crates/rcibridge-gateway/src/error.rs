//! Error types for the gateway crate.

use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur while talking to the gateway or transcoding values.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Gateway answered with a non-200 status
    #[error("Gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response was not well-formed XML or missed required structure
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Channel value could not be decoded
    #[error("Cannot decode value: {0}")]
    Decode(String),

    /// Item value could not be encoded for the wire
    #[error("Cannot encode value: {0}")]
    Encode(String),

    /// Encoder needs a previous item value that is not available
    #[error("No previous value available for relative encoding")]
    MissingPrevious,

    /// Item has no current value to work from
    #[error("Item value unavailable")]
    MissingValue,

    /// Value outside the device's accepted range
    #[error("Value {value} out of bounds [{min}, {max}]")]
    OutOfBounds { value: f64, min: f64, max: f64 },
}
