//! BER length encoding and byte-by-byte accumulation
//!
//! Definite form only:
//! - Short form: one octet, bit 8 = 0, value 0-127
//! - Long form: initial octet `0x80 | n`, followed by `n` big-endian octets
//!
//! The indefinite form (initial octet `0x80`) is always rejected.

use ber_core::config::LENGTH_OCTETS_LIMIT;
use ber_core::{BerError, BerResult, DecoderConfig};

/// Long form flag of the initial length octet
pub const LONG_FORM_FLAG: u8 = 0x80;
/// Value bits of a short-form length octet
pub const SHORT_FORM_MASK: u8 = 0x7F;

/// Progress of a length field through the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthState {
    #[default]
    Start,
    /// Long form, length octets outstanding
    Pending,
    End,
}

/// BER Length
///
/// Tracks how many long-form octets are expected and how many were read,
/// so the field can be split across any number of input chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Length {
    value: usize,
    expected: usize,
    read: usize,
    state: LengthState,
}

impl Length {
    /// The decoded length of the following value
    pub fn value(&self) -> usize {
        self.value
    }

    pub fn state(&self) -> LengthState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == LengthState::End
    }

    /// Long-form octets announced by the initial octet (0 in short form)
    pub fn num_bytes_expected(&self) -> usize {
        self.expected
    }

    /// Long-form octets read so far
    pub fn num_bytes_read(&self) -> usize {
        self.read
    }

    /// Octets the length field occupies, initial octet included
    pub fn encoded_len(&self) -> usize {
        1 + self.expected
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed the next input octet
    ///
    /// # Returns
    /// `Ok(true)` once the length is complete.
    ///
    /// # Error Handling
    /// - `UnsupportedIndefiniteLength` if the initial octet is `0x80`
    /// - `LengthOverflow` if the long form announces more octets than
    ///   `config.max_length_length` allows
    pub fn accumulate(&mut self, byte: u8, config: &DecoderConfig) -> BerResult<bool> {
        match self.state {
            LengthState::Start => {
                if byte & LONG_FORM_FLAG == 0 {
                    self.value = byte as usize;
                    self.state = LengthState::End;
                    return Ok(true);
                }

                let octets = (byte & SHORT_FORM_MASK) as usize;
                if octets == 0 {
                    return Err(BerError::UnsupportedIndefiniteLength);
                }
                let max = config.max_length_length.min(LENGTH_OCTETS_LIMIT);
                if octets > max {
                    return Err(BerError::LengthOverflow { octets, max });
                }

                self.expected = octets;
                self.read = 0;
                self.value = 0;
                self.state = LengthState::Pending;
                Ok(false)
            }
            LengthState::Pending => {
                // At most four octets, so a 32-bit value always fits
                self.value = (self.value << 8) | byte as usize;
                self.read += 1;
                if self.read == self.expected {
                    self.state = LengthState::End;
                    return Ok(true);
                }
                Ok(false)
            }
            LengthState::End => Ok(true),
        }
    }

    /// Octets needed to encode `length`
    pub fn encoded_size(length: usize) -> usize {
        if length < 128 {
            1
        } else {
            1 + (usize::BITS - length.leading_zeros()).div_ceil(8) as usize
        }
    }

    /// Encode a length in its minimal definite form
    ///
    /// # Returns
    /// Encoded length bytes (1 byte for short form, 2-9 bytes for long form)
    pub fn encode(length: usize) -> Vec<u8> {
        if length < 128 {
            return vec![length as u8];
        }

        let num_bytes = Self::encoded_size(length) - 1;
        let mut result = Vec::with_capacity(num_bytes + 1);
        result.push(LONG_FORM_FLAG | num_bytes as u8);
        for i in (0..num_bytes).rev() {
            result.push(((length >> (i * 8)) & 0xFF) as u8);
        }
        result
    }

    /// Decode a length from the start of a complete buffer
    ///
    /// # Returns
    /// Returns `Ok((Length, bytes_consumed))` if successful
    pub fn decode(data: &[u8], config: &DecoderConfig) -> BerResult<(Self, usize)> {
        let mut length = Length::default();
        for &byte in data {
            if length.accumulate(byte, config)? {
                return Ok((length, length.encoded_len()));
            }
        }
        Err(BerError::Truncated { consumed: data.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_short() {
        assert_eq!(Length::encode(100), vec![100]);
        let (length, consumed) = Length::decode(&[100], &DecoderConfig::default()).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(length.value(), 100);
    }

    #[test]
    fn test_length_long() {
        assert_eq!(Length::encode(128), vec![0x81, 0x80]);
        assert_eq!(Length::encode(1000), vec![0x82, 0x03, 0xE8]);
        assert_eq!(Length::encoded_size(1000), 3);
        assert_eq!(Length::encoded_size(0x0100_0000), 5);
    }

    #[test]
    fn test_accumulate_long_form_split() {
        let config = DecoderConfig::default();
        let mut length = Length::default();
        assert!(!length.accumulate(0x82, &config).unwrap());
        assert_eq!(length.state(), LengthState::Pending);
        assert_eq!(length.num_bytes_expected(), 2);
        assert!(!length.accumulate(0x01, &config).unwrap());
        assert_eq!(length.num_bytes_read(), 1);
        assert!(length.accumulate(0x2C, &config).unwrap());
        assert_eq!(length.value(), 300);
        assert_eq!(length.encoded_len(), 3);
    }

    #[test]
    fn test_indefinite_form_rejected() {
        let config = DecoderConfig::default().with_indefinite_length_allowed(true);
        assert_eq!(
            Length::decode(&[0x80, 0x00, 0x00], &config),
            Err(BerError::UnsupportedIndefiniteLength)
        );
    }

    #[test]
    fn test_length_overflow() {
        let config = DecoderConfig::short_form_only();
        assert_eq!(
            Length::decode(&[0x81, 0x80], &config),
            Err(BerError::LengthOverflow { octets: 1, max: 0 })
        );

        let config = DecoderConfig::default();
        assert_eq!(
            Length::decode(&[0x85, 0, 0, 0, 0, 1], &config),
            Err(BerError::LengthOverflow { octets: 5, max: 4 })
        );
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(
            Length::decode(&[0x82, 0x01], &DecoderConfig::default()),
            Err(BerError::Truncated { consumed: 2 })
        );
    }
}
