//! Resumable BER/ASN.1 TLV decoder
//!
//! Decodes BER-encoded messages fed in arbitrary chunks, as they arrive from
//! a socket, without ever re-parsing bytes already consumed. What a message
//! looks like is described by a grammar: a state machine whose transitions
//! are keyed by tag and carry actions that populate the decoded object.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `ber-core`: Error taxonomy and decoder configuration
//! - `ber-asn1`: TLV primitives, grammars, containers and the decoder engine
//! - `ber-kerberos`: KRB-ERROR and PrincipalName codec built on a grammar
//! - `ber-transport`: Async PDU reader and connection loop over tokio streams
//!
//! # Usage
//!
//! ```no_run
//! use ber::kerberos::KerberosCodec;
//!
//! # fn main() -> ber::BerResult<()> {
//! let codec = KerberosCodec::new()?;
//! let mut container = codec.krb_error_container()?;
//! let mut chunk: &[u8] = &[0x7E, 0x69];
//! container.feed(&mut chunk)?;
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use ber_core::{BerError, BerResult, DecoderConfig, ExpectedTags, ResourceLimit};

// Re-export the decoder engine
pub use ber_asn1::{
    Action, Asn1Decoder, BerEncoder, Container, Decodable, DecodeState, DecodeStatus, Grammar,
    GrammarBuilder, GrammarState, Tag, TlvEvent,
};

// Re-export the Kerberos codec
pub mod kerberos {
    pub use ber_kerberos::*;
}

// Re-export stream plumbing
pub mod transport {
    pub use ber_transport::*;
}
