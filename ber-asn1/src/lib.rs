//! BER/ASN.1 processing for streaming protocols
//!
//! This crate provides the BER primitives (tag, length, value, TLV), an
//! encoder, and a resumable decoder whose acceptance of a message is driven
//! by a declarative [`Grammar`].
//!
//! # Architecture
//!
//! ```text
//! bytes ──► Asn1Decoder ──► Tag / Length / Value ──► Tlv on TlvStack
//!                 │
//!                 └── (state, tag) ──► Grammar ──► action on Container target
//! ```
//!
//! A message type plugs in by implementing [`Decodable`] and building a
//! [`Grammar`] for it; the engine itself never changes.

pub mod ber;
pub mod container;
pub mod decoder;
pub mod grammar;

pub use ber::{BerEncoder, BerReader, Length, Tag, TagClass, Tlv, TlvStack, Value};
pub use ber_core::{BerError, BerResult, DecoderConfig};
pub use container::Container;
pub use decoder::{Asn1Decoder, DecodeState, DecodeStatus};
pub use grammar::{Action, Decodable, Grammar, GrammarBuilder, GrammarState, TlvEvent, Transition};
