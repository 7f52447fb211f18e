//! BER encoder for ASN.1 structures
//!
//! # Usage Example
//!
//! ```rust
//! use ber_asn1::ber::BerEncoder;
//!
//! let mut inner = BerEncoder::new();
//! inner.encode_integer(5).unwrap();
//! let mut encoder = BerEncoder::new();
//! encoder.encode_context_specific(0, inner.as_bytes(), true).unwrap();
//! assert_eq!(encoder.into_bytes(), vec![0xA0, 0x03, 0x02, 0x01, 0x05]);
//! ```

use crate::ber::length::Length;
use crate::ber::tag::{universal, Tag};
use crate::ber::value::Value;
use ber_core::{BerError, BerResult};

/// BER encoder for ASN.1 structures
///
/// Each encoded value is appended to an internal buffer as a TLV triplet.
/// Constructed values take their already-encoded children as input, so a
/// structure is built inside-out with one encoder per level.
#[derive(Debug, Clone, Default)]
pub struct BerEncoder {
    buffer: Vec<u8>,
}

impl BerEncoder {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new BER encoder with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode a TLV (Tag-Length-Value) triplet
    ///
    /// # Arguments
    /// * `tag` - BER tag
    /// * `value` - Value bytes (already encoded)
    pub fn encode_tlv(&mut self, tag: &Tag, value: &[u8]) -> BerResult<()> {
        if u32::try_from(value.len()).is_err() {
            return Err(BerError::Encoding(format!(
                "Value of {} bytes cannot be given a 4-octet length",
                value.len()
            )));
        }
        self.buffer.extend_from_slice(&tag.encode());
        self.buffer.extend_from_slice(&Length::encode(value.len()));
        self.buffer.extend_from_slice(value);
        Ok(())
    }

    /// Encode an INTEGER with minimal two's complement contents
    pub fn encode_integer(&mut self, value: i64) -> BerResult<()> {
        let tag = Tag::universal(false, universal::INTEGER);
        self.encode_tlv(&tag, &Value::integer_bytes(value))
    }

    /// Encode an ENUMERATED value
    pub fn encode_enumerated(&mut self, value: i64) -> BerResult<()> {
        let tag = Tag::universal(false, universal::ENUMERATED);
        self.encode_tlv(&tag, &Value::integer_bytes(value))
    }

    /// Encode a BOOLEAN
    pub fn encode_boolean(&mut self, value: bool) -> BerResult<()> {
        self.buffer.extend_from_slice(&Value::encode_boolean(value));
        Ok(())
    }

    /// Encode an OCTET STRING
    pub fn encode_octet_string(&mut self, value: &[u8]) -> BerResult<()> {
        let tag = Tag::universal(false, universal::OCTET_STRING);
        self.encode_tlv(&tag, value)
    }

    /// Encode a GeneralString (used for Kerberos realms and name components)
    pub fn encode_general_string(&mut self, value: &str) -> BerResult<()> {
        let tag = Tag::universal(false, universal::GENERAL_STRING);
        self.encode_tlv(&tag, value.as_bytes())
    }

    /// Encode a GeneralizedTime from its textual form, e.g. `20240102030405Z`
    pub fn encode_generalized_time(&mut self, value: &str) -> BerResult<()> {
        let tag = Tag::universal(false, universal::GENERALIZED_TIME);
        self.encode_tlv(&tag, value.as_bytes())
    }

    /// Encode an OBJECT IDENTIFIER
    pub fn encode_object_identifier(&mut self, oid: &[u32]) -> BerResult<()> {
        let tag = Tag::universal(false, universal::OBJECT_IDENTIFIER);
        self.encode_tlv(&tag, &Value::oid_bytes(oid)?)
    }

    /// Encode a SEQUENCE around already-encoded elements
    pub fn encode_sequence(&mut self, elements: &[u8]) -> BerResult<()> {
        let tag = Tag::universal(true, universal::SEQUENCE);
        self.encode_tlv(&tag, elements)
    }

    /// Encode a context-specific tag around `value`
    ///
    /// With `constructed` set this is an EXPLICIT tag wrapping a complete TLV.
    pub fn encode_context_specific(
        &mut self,
        tag_number: u32,
        value: &[u8],
        constructed: bool,
    ) -> BerResult<()> {
        let tag = Tag::context_specific(constructed, tag_number);
        self.encode_tlv(&tag, value)
    }

    /// Encode an application tag around `value`
    pub fn encode_application(
        &mut self,
        tag_number: u32,
        value: &[u8],
        constructed: bool,
    ) -> BerResult<()> {
        let tag = Tag::application(constructed, tag_number);
        self.encode_tlv(&tag, value)
    }

    /// Encode `[tag_number] EXPLICIT` around whatever `f` encodes
    pub fn encode_explicit<F>(&mut self, tag_number: u32, f: F) -> BerResult<()>
    where
        F: FnOnce(&mut BerEncoder) -> BerResult<()>,
    {
        let mut inner = BerEncoder::new();
        f(&mut inner)?;
        self.encode_context_specific(tag_number, inner.as_bytes(), true)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
