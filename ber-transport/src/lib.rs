//! Async stream plumbing for the BER decoder
//!
//! Connects the push-style [`ber_asn1::Container`] to tokio byte streams:
//!
//! - [`PduReader`] frames PDUs out of an `AsyncRead`, however the bytes
//!   are split across reads
//! - [`serve_connection`] runs a request/response loop over one connection

pub mod connection;
pub mod error;
pub mod stream;

pub use connection::{serve_connection, PduHandler};
pub use error::{TransportError, TransportResult};
pub use stream::{PduReader, ReaderSettings, DEFAULT_READ_CHUNK};
