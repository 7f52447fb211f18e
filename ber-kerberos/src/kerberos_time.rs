//! KerberosTime: GeneralizedTime restricted to `YYYYMMDDHHMMSSZ`

use ber_core::{BerError, BerResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const KERBEROS_TIME_LEN: usize = 15;

/// UTC timestamp without fractional seconds
///
/// RFC 4120 §5.2.3 forbids fractional seconds and requires the `Z` suffix,
/// so the textual form is always 15 characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KerberosTime(String);

impl KerberosTime {
    /// Parse and validate the textual form
    ///
    /// # Error Handling
    /// Returns `InvalidValue` if the text is not `YYYYMMDDHHMMSSZ` or a
    /// field is out of range.
    pub fn parse(text: &str) -> BerResult<Self> {
        let bytes = text.as_bytes();
        let valid_shape = bytes.len() == KERBEROS_TIME_LEN
            && bytes[..14].iter().all(u8::is_ascii_digit)
            && bytes[14] == b'Z';
        if !valid_shape {
            return Err(BerError::InvalidValue(format!(
                "KerberosTime must be YYYYMMDDHHMMSSZ, got {:?}",
                text
            )));
        }

        let time = Self(text.to_string());
        let ranges = [
            ("month", time.month(), 1, 12),
            ("day", time.day(), 1, 31),
            ("hour", time.hour(), 0, 23),
            ("minute", time.minute(), 0, 59),
            // 60 for a leap second
            ("second", time.second(), 0, 60),
        ];
        for (field, value, min, max) in ranges {
            if value < min || value > max {
                return Err(BerError::InvalidValue(format!(
                    "KerberosTime {} {} out of range in {}",
                    field, value, text
                )));
            }
        }
        Ok(time)
    }

    /// Parse the content octets of a GeneralizedTime
    pub fn from_bytes(bytes: &[u8]) -> BerResult<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| BerError::InvalidValue("KerberosTime is not ASCII".to_string()))?;
        Self::parse(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn field(&self, start: usize, len: usize) -> u32 {
        self.0.as_bytes()[start..start + len]
            .iter()
            .fold(0, |acc, digit| acc * 10 + (digit - b'0') as u32)
    }

    pub fn year(&self) -> u32 {
        self.field(0, 4)
    }

    pub fn month(&self) -> u32 {
        self.field(4, 2)
    }

    pub fn day(&self) -> u32 {
        self.field(6, 2)
    }

    pub fn hour(&self) -> u32 {
        self.field(8, 2)
    }

    pub fn minute(&self) -> u32 {
        self.field(10, 2)
    }

    pub fn second(&self) -> u32 {
        self.field(12, 2)
    }
}

impl fmt::Display for KerberosTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for KerberosTime {
    type Error = BerError;

    fn try_from(text: String) -> BerResult<Self> {
        Self::parse(&text)
    }
}

impl From<KerberosTime> for String {
    fn from(time: KerberosTime) -> Self {
        time.0
    }
}
