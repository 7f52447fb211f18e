//! Complete-buffer BER reader
//!
//! A cursor over a slice that already holds whole TLVs. Useful for tools and
//! tests that inspect an encoding; network input goes through the resumable
//! [`crate::Asn1Decoder`] instead.

use crate::ber::length::Length;
use crate::ber::tag::{universal, Tag, TagClass};
use crate::ber::value::Value;
use ber_core::{BerError, BerResult, DecoderConfig};

/// Sequential TLV reader over a byte slice
pub struct BerReader<'a> {
    buffer: &'a [u8],
    position: usize,
    config: DecoderConfig,
}

impl<'a> BerReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_config(buffer, DecoderConfig::default())
    }

    pub fn with_config(buffer: &'a [u8], config: DecoderConfig) -> Self {
        Self {
            buffer,
            position: 0,
            config,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.buffer.len()
    }

    fn read_bytes(&mut self, count: usize) -> BerResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(BerError::Truncated {
                consumed: self.buffer.len(),
            });
        }
        let start = self.position;
        self.position += count;
        Ok(&self.buffer[start..start + count])
    }

    /// Read one TLV
    ///
    /// # Returns
    /// Returns `Ok((tag, value_bytes))`; constructed values are returned
    /// undecoded and can be read with a nested `BerReader`.
    pub fn read_tlv(&mut self) -> BerResult<(Tag, &'a [u8])> {
        let (tag, tag_len) = Tag::decode(&self.buffer[self.position..])?;
        self.position += tag_len;

        let (length, length_len) = Length::decode(&self.buffer[self.position..], &self.config)?;
        self.position += length_len;

        let value = self.read_bytes(length.value())?;
        Ok((tag, value))
    }

    /// Read a TLV and check its tag
    pub fn read_expected(&mut self, expected: &Tag) -> BerResult<&'a [u8]> {
        let (tag, value) = self.read_tlv()?;
        if tag != *expected {
            return Err(BerError::InvalidValue(format!(
                "Expected tag 0x{:02X}, got 0x{:02X}",
                expected.leading_byte(),
                tag.leading_byte()
            )));
        }
        Ok(value)
    }

    /// Read an INTEGER
    pub fn read_integer(&mut self) -> BerResult<i64> {
        let value = self.read_expected(&Tag::universal(false, universal::INTEGER))?;
        Value::decode_integer(value)
    }

    /// Read an OCTET STRING
    pub fn read_octet_string(&mut self) -> BerResult<&'a [u8]> {
        self.read_expected(&Tag::universal(false, universal::OCTET_STRING))
    }

    /// Read the contents of a SEQUENCE
    pub fn read_sequence(&mut self) -> BerResult<BerReader<'a>> {
        let value = self.read_expected(&Tag::universal(true, universal::SEQUENCE))?;
        Ok(BerReader::with_config(value, self.config))
    }

    /// Read the contents of a constructed context-specific tag
    pub fn read_explicit(&mut self, tag_number: u32) -> BerResult<BerReader<'a>> {
        let (tag, value) = self.read_tlv()?;
        if tag.class() != TagClass::ContextSpecific || tag.number() != tag_number {
            return Err(BerError::InvalidValue(format!(
                "Expected context-specific tag {}, got {:?}",
                tag_number, tag
            )));
        }
        Ok(BerReader::with_config(value, self.config))
    }

    /// Skip a TLV
    ///
    /// # Returns
    /// Returns the number of bytes skipped.
    pub fn skip_tlv(&mut self) -> BerResult<usize> {
        let start = self.position;
        self.read_tlv()?;
        Ok(self.position - start)
    }
}
