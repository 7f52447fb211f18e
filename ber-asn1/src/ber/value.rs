//! TLV content octets and primitive value helpers
//!
//! [`Value`] is the growable buffer the decoder fills while content octets
//! trickle in. The associated functions encode and decode the contents of
//! primitive ASN.1 types.

use crate::ber::length::Length;
use crate::ber::tag::{
    BOOLEAN_TAG, ENUMERATED_TAG, INTEGER_TAG, OBJECT_IDENTIFIER_TAG, OCTET_STRING_TAG,
};
use ber_core::{BerError, BerResult};
use bytes::{Buf, BufMut, BytesMut};

/// Progress of the content octets through the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueState {
    /// Buffer sized, nothing written yet
    #[default]
    Start,
    Pending,
    End,
}

/// Content octets of the TLV being decoded
///
/// The buffer is sized once the length is known and is only ever appended
/// to. Its capacity survives [`Value::reset`] so a reused TLV slot does not
/// reallocate for every PDU.
#[derive(Debug, Clone, Default)]
pub struct Value {
    data: BytesMut,
    expected: usize,
    state: ValueState,
}

impl Value {
    /// Size the buffer for `length` content octets
    pub fn allocate(&mut self, length: usize) {
        self.data.clear();
        self.data.reserve(length);
        self.expected = length;
        self.state = if length == 0 { ValueState::End } else { ValueState::Start };
    }

    /// Copy as many octets from `src` as still fit
    ///
    /// # Returns
    /// The number of octets consumed from `src`
    pub fn add_data<B: Buf>(&mut self, src: &mut B) -> usize {
        let count = self.remaining().min(src.remaining());
        if count == 0 {
            return 0;
        }
        self.data.put(src.take(count));
        assert!(
            self.data.len() <= self.expected,
            "value buffer written past its allocated size"
        );
        self.state = if self.data.len() == self.expected {
            ValueState::End
        } else {
            ValueState::Pending
        };
        count
    }

    /// Octets still missing
    pub fn remaining(&self) -> usize {
        self.expected - self.data.len()
    }

    pub fn is_complete(&self) -> bool {
        self.state == ValueState::End
    }

    pub fn state(&self) -> ValueState {
        self.state
    }

    /// Allocated size, i.e. the decoded length
    pub fn expected_len(&self) -> usize {
        self.expected
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn reset(&mut self) {
        self.data.clear();
        self.expected = 0;
        self.state = ValueState::Start;
    }

    /// Encode a BOOLEAN TLV: `01 01 FF` for true, `01 01 00` for false
    pub fn encode_boolean(value: bool) -> Vec<u8> {
        vec![BOOLEAN_TAG, 0x01, if value { 0xFF } else { 0x00 }]
    }

    /// Minimal two's complement, big-endian content octets of an INTEGER
    ///
    /// No redundant leading `0x00` or `0xFF` octet is emitted unless it is
    /// needed to keep the sign: 127 is `7F`, 128 is `00 80`, -129 is `FF 7F`.
    pub fn integer_bytes(value: i64) -> Vec<u8> {
        if value == 0 {
            return vec![0];
        }

        let mut bytes = Vec::with_capacity(8);
        let mut temp = value;
        if value < 0 {
            while temp != -1 {
                bytes.push((temp & 0xFF) as u8);
                temp >>= 8;
            }
            // Most significant byte must carry the sign bit
            if bytes.last().is_none_or(|b| b & 0x80 == 0) {
                bytes.push(0xFF);
            }
        } else {
            while temp > 0 {
                bytes.push((temp & 0xFF) as u8);
                temp >>= 8;
            }
            if bytes.last().is_some_and(|b| b & 0x80 != 0) {
                bytes.push(0x00);
            }
        }

        bytes.reverse();
        bytes
    }

    /// Encode an INTEGER TLV
    pub fn encode_integer(value: i64) -> Vec<u8> {
        Self::encode_primitive(INTEGER_TAG, &Self::integer_bytes(value))
    }

    /// Encode an ENUMERATED TLV, same contents as INTEGER
    pub fn encode_enumerated(value: i64) -> Vec<u8> {
        Self::encode_primitive(ENUMERATED_TAG, &Self::integer_bytes(value))
    }

    /// Encode an OCTET STRING TLV; an empty string is `04 00`
    pub fn encode_octet_string(value: &[u8]) -> Vec<u8> {
        Self::encode_primitive(OCTET_STRING_TAG, value)
    }

    /// Encode an OBJECT IDENTIFIER TLV
    pub fn encode_oid(oid: &[u32]) -> BerResult<Vec<u8>> {
        Ok(Self::encode_primitive(OBJECT_IDENTIFIER_TAG, &Self::oid_bytes(oid)?))
    }

    /// Content octets of an OBJECT IDENTIFIER
    ///
    /// The first two arcs are folded into `40 * X + Y`; every subidentifier
    /// is written in base 128 with the continuation bit on all but its last
    /// octet.
    pub fn oid_bytes(oid: &[u32]) -> BerResult<Vec<u8>> {
        if oid.len() < 2 {
            return Err(BerError::Encoding(
                "Object identifier must have at least 2 components".to_string(),
            ));
        }
        if oid[0] > 2 || (oid[0] < 2 && oid[1] >= 40) {
            return Err(BerError::Encoding(format!(
                "Invalid leading arcs {}.{}",
                oid[0], oid[1]
            )));
        }

        let first = 40u32
            .checked_mul(oid[0])
            .and_then(|x| x.checked_add(oid[1]))
            .ok_or_else(|| BerError::Encoding("OID component too large".to_string()))?;

        let mut bytes = Vec::new();
        push_base128(&mut bytes, first);
        for &component in &oid[2..] {
            push_base128(&mut bytes, component);
        }
        Ok(bytes)
    }

    fn encode_primitive(tag: u8, contents: &[u8]) -> Vec<u8> {
        let length = Length::encode(contents.len());
        let mut result = Vec::with_capacity(1 + length.len() + contents.len());
        result.push(tag);
        result.extend_from_slice(&length);
        result.extend_from_slice(contents);
        result
    }

    /// Decode BOOLEAN contents; any non-zero octet is true
    pub fn decode_boolean(bytes: &[u8]) -> BerResult<bool> {
        match bytes {
            [b] => Ok(*b != 0),
            _ => Err(BerError::InvalidValue(format!(
                "BOOLEAN must be 1 octet, got {}",
                bytes.len()
            ))),
        }
    }

    /// Decode INTEGER contents (two's complement, big-endian, up to 8 octets)
    pub fn decode_integer(bytes: &[u8]) -> BerResult<i64> {
        if bytes.is_empty() {
            return Err(BerError::InvalidValue("Empty integer encoding".to_string()));
        }
        if bytes.len() > 8 {
            return Err(BerError::InvalidValue(format!(
                "Integer too large: {} bytes (max 8)",
                bytes.len()
            )));
        }

        let mut value: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        for &byte in bytes {
            value = (value << 8) | byte as i64;
        }
        Ok(value)
    }

    /// Decode INTEGER contents that must fit an `i32`
    pub fn decode_i32(bytes: &[u8]) -> BerResult<i32> {
        let value = Self::decode_integer(bytes)?;
        i32::try_from(value)
            .map_err(|_| BerError::InvalidValue(format!("Integer {} out of 32-bit range", value)))
    }

    /// Decode ENUMERATED contents
    pub fn decode_enumerated(bytes: &[u8]) -> BerResult<i64> {
        Self::decode_integer(bytes)
    }

    /// Decode OBJECT IDENTIFIER contents
    pub fn decode_oid(bytes: &[u8]) -> BerResult<Vec<u32>> {
        if bytes.is_empty() {
            return Err(BerError::InvalidValue("Empty object identifier encoding".to_string()));
        }

        let mut subidentifiers = Vec::new();
        let mut current: u32 = 0;
        let mut in_progress = false;
        for &byte in bytes {
            current = current
                .checked_mul(128)
                .map(|x| x | (byte & 0x7F) as u32)
                .ok_or_else(|| BerError::InvalidValue("OID component overflow".to_string()))?;
            in_progress = byte & 0x80 != 0;
            if !in_progress {
                subidentifiers.push(current);
                current = 0;
            }
        }
        if in_progress {
            return Err(BerError::InvalidValue("Truncated OID component".to_string()));
        }

        let first = subidentifiers[0];
        let mut oid = match first {
            0..=39 => vec![0, first],
            40..=79 => vec![1, first - 40],
            _ => vec![2, first - 80],
        };
        oid.extend_from_slice(&subidentifiers[1..]);
        Ok(oid)
    }

    /// Decode string contents as UTF-8
    pub fn decode_utf8(bytes: &[u8]) -> BerResult<String> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| BerError::InvalidValue(format!("Invalid string encoding: {}", e)))
    }
}

fn push_base128(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut count = 0;
    let mut temp = value;
    loop {
        groups[count] = (temp & 0x7F) as u8;
        count += 1;
        temp >>= 7;
        if temp == 0 {
            break;
        }
    }
    for i in (0..count).rev() {
        let continuation = if i > 0 { 0x80 } else { 0x00 };
        out.push(groups[i] | continuation);
    }
}
