//! BER tag encoding and byte-by-byte accumulation

use ber_core::config::TAG_OCTETS_LIMIT;
use ber_core::{BerError, BerResult};
use std::hash::{Hash, Hasher};

/// Constructed bit of the identifier octet
pub const CONSTRUCTED_FLAG: u8 = 0x20;
/// Class bits of the identifier octet
pub const CLASS_MASK: u8 = 0xC0;
/// Tag number bits of the identifier octet; all ones announce the long form
pub const SHORT_TAG_MASK: u8 = 0x1F;
/// Continuation bit of long-form tag octets
pub const TAG_CONTINUATION: u8 = 0x80;

pub const UNIVERSAL_CLASS: u8 = 0x00;
pub const APPLICATION_CLASS: u8 = 0x40;
pub const CONTEXT_CLASS: u8 = 0x80;
pub const PRIVATE_CLASS: u8 = 0xC0;

/// Universal tag numbers used by the codec
pub mod universal {
    pub const BOOLEAN: u32 = 1;
    pub const INTEGER: u32 = 2;
    pub const BIT_STRING: u32 = 3;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const OBJECT_IDENTIFIER: u32 = 6;
    pub const ENUMERATED: u32 = 10;
    pub const UTF8_STRING: u32 = 12;
    pub const SEQUENCE: u32 = 16;
    pub const SET: u32 = 17;
    pub const GENERALIZED_TIME: u32 = 24;
    pub const GENERAL_STRING: u32 = 27;
}

/// Identifier octets of the universal types, as they appear on the wire
pub const BOOLEAN_TAG: u8 = 0x01;
pub const INTEGER_TAG: u8 = 0x02;
pub const OCTET_STRING_TAG: u8 = 0x04;
pub const OBJECT_IDENTIFIER_TAG: u8 = 0x06;
pub const ENUMERATED_TAG: u8 = 0x0A;
pub const SEQUENCE_TAG: u8 = 0x30;
pub const GENERALIZED_TIME_TAG: u8 = 0x18;
pub const GENERAL_STRING_TAG: u8 = 0x1B;

/// BER Tag Class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: Standard ASN.1 types (INTEGER, OCTET STRING, etc.)
/// - **Application**: Application-specific types
/// - **Context-specific**: Context-dependent types (used in SEQUENCE/SET)
/// - **Private**: Private/implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TagClass {
    /// Universal class (00)
    #[default]
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl TagClass {
    /// Get tag class from the top two bits of an identifier octet
    pub fn from_bits(byte: u8) -> Self {
        match byte & CLASS_MASK {
            UNIVERSAL_CLASS => TagClass::Universal,
            APPLICATION_CLASS => TagClass::Application,
            CONTEXT_CLASS => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    /// Convert tag class to identifier octet bits
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// Progress of a tag through the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagState {
    /// No octet read yet
    #[default]
    Start,
    /// Long form, continuation octets outstanding
    Pending,
    /// Tag fully known
    End,
    /// Tag number exceeded the allowed octets
    Overflow,
}

/// BER Tag
///
/// A tag is built either from its parts with [`Tag::new`] (for encoding) or
/// octet by octet with [`Tag::accumulate`] while decoding. Equality only
/// compares class, constructed flag and number.
///
/// # Encoding Format
///
/// Short form (tag number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
///
/// Long form (tag number > 30):
/// ```text
/// First byte:      C C P 1 1 1 1 1
/// Following bytes: 1 T T T T T T T  (last byte has bit 8 = 0)
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Tag {
    class: TagClass,
    constructed: bool,
    number: u32,
    raw: [u8; TAG_OCTETS_LIMIT],
    len: usize,
    state: TagState,
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class
            && self.constructed == other.constructed
            && self.number == other.number
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class.hash(state);
        self.constructed.hash(state);
        self.number.hash(state);
    }
}

impl Tag {
    /// Create a new BER tag
    pub fn new(class: TagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
            raw: [0; TAG_OCTETS_LIMIT],
            len: 0,
            state: TagState::End,
        }
    }

    /// Create a Universal class tag
    pub fn universal(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::Universal, constructed, number)
    }

    /// Create an Application class tag
    pub fn application(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::Application, constructed, number)
    }

    /// Create a Context-specific class tag
    pub fn context_specific(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::ContextSpecific, constructed, number)
    }

    /// Create a Private class tag
    pub fn private(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::Private, constructed, number)
    }

    pub fn class(&self) -> TagClass {
        self.class
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn state(&self) -> TagState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == TagState::End
    }

    /// Octets read so far while decoding
    pub fn num_bytes_read(&self) -> usize {
        self.len
    }

    /// Raw octets accumulated while decoding
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw[..self.len]
    }

    /// The identifier octet, the key grammars dispatch on
    pub fn leading_byte(&self) -> u8 {
        if self.len > 0 {
            return self.raw[0];
        }
        let number_bits = if self.number <= 30 {
            self.number as u8
        } else {
            SHORT_TAG_MASK
        };
        self.class.to_bits() | self.constructed_bit() | number_bits
    }

    /// Number of octets this tag occupies on the wire
    pub fn encoded_len(&self) -> usize {
        if self.len > 0 {
            return self.len;
        }
        if self.number <= 30 {
            1
        } else {
            1 + (32 - self.number.leading_zeros() as usize).div_ceil(7)
        }
    }

    fn constructed_bit(&self) -> u8 {
        if self.constructed { CONSTRUCTED_FLAG } else { 0x00 }
    }

    /// Forget everything accumulated so far
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed the next input octet
    ///
    /// # Arguments
    /// * `byte` - Next octet of the identifier field
    /// * `max_octets` - Most octets the tag may use, capped at 5
    ///
    /// # Returns
    /// `Ok(true)` once the tag is complete, `Ok(false)` while long-form
    /// continuation octets are outstanding.
    ///
    /// # Error Handling
    /// Returns `TagOverflow` as soon as a continuation octet would need a
    /// further octet beyond `max_octets`.
    pub fn accumulate(&mut self, byte: u8, max_octets: usize) -> BerResult<bool> {
        let max = max_octets.clamp(1, TAG_OCTETS_LIMIT);
        match self.state {
            TagState::Start => {
                self.raw[0] = byte;
                self.len = 1;
                self.class = TagClass::from_bits(byte);
                self.constructed = byte & CONSTRUCTED_FLAG != 0;
                self.number = 0;
                if byte & SHORT_TAG_MASK != SHORT_TAG_MASK {
                    self.number = (byte & SHORT_TAG_MASK) as u32;
                    self.state = TagState::End;
                    return Ok(true);
                }
                if max == 1 {
                    self.state = TagState::Overflow;
                    return Err(BerError::TagOverflow { max });
                }
                self.state = TagState::Pending;
                Ok(false)
            }
            TagState::Pending => {
                self.raw[self.len] = byte;
                self.len += 1;
                // At most four 7-bit groups, so the number stays within 28 bits
                self.number = (self.number << 7) | (byte & !TAG_CONTINUATION) as u32;
                if byte & TAG_CONTINUATION == 0 {
                    self.state = TagState::End;
                    return Ok(true);
                }
                if self.len >= max {
                    self.state = TagState::Overflow;
                    return Err(BerError::TagOverflow { max });
                }
                Ok(false)
            }
            TagState::End => Ok(true),
            TagState::Overflow => Err(BerError::TagOverflow { max }),
        }
    }

    /// Encode tag to bytes
    ///
    /// # Encoding Strategy
    /// - If tag number <= 30: Use short form (1 byte)
    /// - If tag number > 30: Use long form (multiple bytes)
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.encoded_len());
        let first = self.class.to_bits() | self.constructed_bit();

        if self.number <= 30 {
            result.push(first | self.number as u8);
            return result;
        }

        result.push(first | SHORT_TAG_MASK);
        let mut groups = Vec::new();
        let mut remaining = self.number;
        while remaining > 0 {
            groups.push((remaining & 0x7F) as u8);
            remaining >>= 7;
        }
        for (i, &group) in groups.iter().rev().enumerate() {
            if i < groups.len() - 1 {
                result.push(group | TAG_CONTINUATION);
            } else {
                result.push(group);
            }
        }
        result
    }

    /// Decode a tag from the start of a complete buffer
    ///
    /// # Returns
    /// Returns `Ok((Tag, bytes_consumed))` if successful
    pub fn decode(data: &[u8]) -> BerResult<(Self, usize)> {
        let mut tag = Tag::default();
        for &byte in data {
            if tag.accumulate(byte, TAG_OCTETS_LIMIT)? {
                return Ok((tag, tag.len));
            }
        }
        Err(BerError::Truncated { consumed: data.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_short_form() {
        let tag = Tag::universal(false, universal::INTEGER);
        assert_eq!(tag.encode(), vec![0x02]);
        assert_eq!(tag.leading_byte(), INTEGER_TAG);
    }

    #[test]
    fn test_tag_constructed() {
        let tag = Tag::application(true, 30);
        assert_eq!(tag.encode(), vec![0x7E]);
        assert_eq!(tag.encoded_len(), 1);
    }

    #[test]
    fn test_tag_long_form_encode() {
        let tag = Tag::context_specific(false, 201);
        assert_eq!(tag.encode(), vec![0x9F, 0x81, 0x49]);
        assert_eq!(tag.encoded_len(), 3);
        assert_eq!(tag.leading_byte(), 0x9F);
    }

    #[test]
    fn test_accumulate_short_form() {
        let mut tag = Tag::default();
        assert!(tag.accumulate(0xA3, 5).unwrap());
        assert_eq!(tag.class(), TagClass::ContextSpecific);
        assert!(tag.is_constructed());
        assert_eq!(tag.number(), 3);
        assert_eq!(tag.raw_bytes(), &[0xA3]);
    }

    #[test]
    fn test_accumulate_long_form_split() {
        let mut tag = Tag::default();
        assert!(!tag.accumulate(0x5F, 5).unwrap());
        assert_eq!(tag.state(), TagState::Pending);
        assert!(!tag.accumulate(0x81, 5).unwrap());
        assert!(tag.accumulate(0x49, 5).unwrap());
        assert_eq!(tag.class(), TagClass::Application);
        assert_eq!(tag.number(), 201);
        assert_eq!(tag.num_bytes_read(), 3);
        assert_eq!(tag, Tag::application(false, 201));
    }

    #[test]
    fn test_accumulate_largest_tag() {
        let (tag, consumed) = Tag::decode(&[0x1F, 0xFF, 0xFF, 0xFF, 0x7F]).unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(tag.number(), (1 << 28) - 1);
    }

    #[test]
    fn test_accumulate_overflow() {
        let data = [0x1F, 0x81, 0x81, 0x81, 0x81, 0x81, 0x01];
        assert_eq!(Tag::decode(&data), Err(BerError::TagOverflow { max: 5 }));
    }

    #[test]
    fn test_accumulate_respects_configured_max() {
        let mut tag = Tag::default();
        assert!(!tag.accumulate(0x1F, 2).unwrap());
        assert_eq!(tag.accumulate(0x81, 2), Err(BerError::TagOverflow { max: 2 }));
        assert_eq!(tag.state(), TagState::Overflow);

        let mut tag = Tag::default();
        assert_eq!(tag.accumulate(0x3F, 1), Err(BerError::TagOverflow { max: 1 }));
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(
            Tag::decode(&[0x1F, 0x81]),
            Err(BerError::Truncated { consumed: 2 })
        );
    }

    #[test]
    fn test_reset() {
        let mut tag = Tag::default();
        tag.accumulate(0x30, 5).unwrap();
        tag.reset();
        assert_eq!(tag.state(), TagState::Start);
        assert_eq!(tag.num_bytes_read(), 0);
    }

    #[test]
    fn test_private_class() {
        let tag = Tag::private(false, 5);
        assert_eq!(tag.encode(), vec![0xC5]);

        let tag = Tag::private(true, 40);
        let encoded = tag.encode();
        assert_eq!(encoded, vec![0xFF, 0x28]);
        let (decoded, used) = Tag::decode(&encoded).unwrap();
        assert_eq!(used, 2);
        assert_eq!(decoded.class(), TagClass::Private);
        assert_eq!(decoded, tag);
    }
}
