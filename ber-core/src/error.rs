use std::fmt;
use thiserror::Error;

/// Main error type for BER decoding and encoding
///
/// Every variant except [`BerError::Encoding`], [`BerError::InvalidGrammar`]
/// and [`BerError::InvalidConfig`] is terminal for the decode that raised it:
/// the container that produced it refuses any further input.
///
/// Running out of input in the middle of a TLV is not an error. The decoder
/// returns normally and keeps its partial state until more bytes arrive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BerError {
    #[error("Tag overflow: tag identifier exceeds {max} octets")]
    TagOverflow { max: usize },

    #[error("Indefinite length form is not supported")]
    UnsupportedIndefiniteLength,

    #[error("Length overflow: {octets} length octets exceed the maximum of {max}")]
    LengthOverflow { octets: usize, max: usize },

    #[error("Length too large: {length} bytes at offset {offset} exceed the PDU limit of {limit}")]
    LengthTooLarge { length: u64, offset: usize, limit: usize },

    #[error("Unexpected tag 0x{tag:02X} in {grammar} state {state}, expected {expected}")]
    UnexpectedTag {
        grammar: &'static str,
        state: String,
        tag: u8,
        expected: ExpectedTags,
    },

    #[error("Resource limit exceeded: {0}")]
    ResourceLimitExceeded(ResourceLimit),

    #[error("Length mismatch: {needed} bytes do not fit in the {available} bytes left")]
    LengthMismatch { needed: usize, available: usize },

    #[error("Trailing data: {remaining} bytes left after a complete PDU")]
    TrailingData { remaining: usize },

    #[error("Truncated PDU: stream ended after {consumed} bytes")]
    Truncated { consumed: usize },

    #[error("Incomplete message: {grammar} ended in non-final state {state}")]
    IncompleteMessage { grammar: &'static str, state: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid grammar: {0}")]
    InvalidGrammar(String),

    #[error("Invalid decoder configuration: {0}")]
    InvalidConfig(String),

    #[error("Decoder has failed and cannot be reused")]
    DecoderFailed,

    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Result type alias for BER operations
pub type BerResult<T> = Result<T, BerError>;

/// Guard tripped by [`BerError::ResourceLimitExceeded`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLimit {
    /// Constructed nesting went deeper than allowed
    Depth { max: usize },
    /// More bytes were consumed for one PDU than allowed
    PduSize { max: usize },
}

impl fmt::Display for ResourceLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceLimit::Depth { max } => write!(f, "nesting depth above {}", max),
            ResourceLimit::PduSize { max } => write!(f, "PDU larger than {} bytes", max),
        }
    }
}

/// Tag bytes a grammar would have accepted, kept for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedTags(pub Vec<u8>);

impl ExpectedTags {
    pub fn contains(&self, tag: u8) -> bool {
        self.0.contains(&tag)
    }
}

impl fmt::Display for ExpectedTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "end of PDU");
        }
        write!(f, "one of [")?;
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "0x{:02X}", tag)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_tag_message_lists_alternatives() {
        let err = BerError::UnexpectedTag {
            grammar: "KRB-ERROR",
            state: "RealmTag".to_string(),
            tag: 0xAA,
            expected: ExpectedTags(vec![0xA8, 0xA9]),
        };
        assert_eq!(
            err.to_string(),
            "Unexpected tag 0xAA in KRB-ERROR state RealmTag, expected one of [0xA8, 0xA9]"
        );
    }

    #[test]
    fn test_expected_tags_empty() {
        assert_eq!(ExpectedTags::default().to_string(), "end of PDU");
        assert!(!ExpectedTags::default().contains(0x30));
    }

    #[test]
    fn test_resource_limit_display() {
        let err = BerError::ResourceLimitExceeded(ResourceLimit::Depth { max: 4 });
        assert_eq!(err.to_string(), "Resource limit exceeded: nesting depth above 4");
    }
}
