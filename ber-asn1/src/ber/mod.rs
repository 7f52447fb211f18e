//! BER (Basic Encoding Rules) primitives
//!
//! Each ASN.1 value is encoded as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C P T T T T T
//! ```
//! - CC = Class (00=Universal, 01=Application, 10=Context, 11=Private)
//! - P = Primitive (0) or Constructed (1)
//! - TTTTT = Tag number (0-30), or 11111 when long-form octets follow
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): bit 8 = 0, lengths 0-127
//! - **Long form**: first byte `0x80 | n`, then `n` big-endian length bytes
//! - **Indefinite form** (`0x80`): not supported
//!
//! [`Tag`], [`Length`] and [`Value`] can all be filled one octet (or one
//! chunk) at a time, which is what lets the decoder stop at any byte
//! boundary and resume when more input arrives.

pub mod encoder;
pub mod length;
pub mod reader;
pub mod tag;
pub mod tlv;
pub mod value;

pub use encoder::BerEncoder;
pub use length::{Length, LengthState};
pub use reader::BerReader;
pub use tag::{Tag, TagClass, TagState};
pub use tlv::{Tlv, TlvStack};
pub use value::{Value, ValueState};
