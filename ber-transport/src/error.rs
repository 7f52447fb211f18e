//! Error types for the transport layer

use ber_core::BerError;
use thiserror::Error;

/// Errors raised while reading PDUs from a stream
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] BerError),

    #[error("Read timed out")]
    Timeout,

    #[error("Connection closed")]
    Closed,
}

impl TransportError {
    /// Whether the peer sent malformed BER
    pub fn is_decode(&self) -> bool {
        matches!(self, TransportError::Decode(_))
    }
}

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
