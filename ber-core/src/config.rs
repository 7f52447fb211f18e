//! Decoder configuration
//!
//! Limits applied by the TLV decoder to resist malformed or hostile input.

use crate::error::{BerError, BerResult};
use serde::{Deserialize, Serialize};

/// Hard cap on tag octets: identifier octet plus four 7-bit continuation
/// octets, enough for a 28-bit tag number
pub const TAG_OCTETS_LIMIT: usize = 5;

/// Hard cap on long-form length octets (32-bit lengths)
pub const LENGTH_OCTETS_LIMIT: usize = 4;

/// Default largest PDU accepted by a decode (1 MiB)
pub const DEFAULT_MAX_PDU_SIZE: usize = 1024 * 1024;

/// Default deepest constructed nesting accepted by a decode
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Limits applied while decoding one PDU
///
/// # Length Octets
///
/// `max_length_length` counts the octets that follow a long-form initial
/// length octet (`0x81`..`0x84`). Zero restricts input to short-form lengths
/// (0-127), see [`DecoderConfig::short_form_only`].
///
/// # Indefinite Length
///
/// `indefinite_length_allowed` is carried for management parity only. The
/// decoder never scans for end-of-contents octets, so the indefinite form is
/// rejected whatever this flag says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Maximum long-form length octets after the initial length octet
    pub max_length_length: usize,
    /// Maximum tag octets, identifier octet included
    pub max_tag_length: usize,
    /// Whether the indefinite length form was requested
    pub indefinite_length_allowed: bool,
    /// Maximum encoded size of one PDU
    pub max_pdu_size: usize,
    /// Maximum nesting depth of constructed TLVs
    pub max_depth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_length_length: LENGTH_OCTETS_LIMIT,
            max_tag_length: TAG_OCTETS_LIMIT,
            indefinite_length_allowed: false,
            max_pdu_size: DEFAULT_MAX_PDU_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecoderConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept short-form lengths only
    pub fn short_form_only() -> Self {
        Self {
            max_length_length: 0,
            ..Self::default()
        }
    }

    pub fn with_max_length_length(mut self, octets: usize) -> Self {
        self.max_length_length = octets;
        self
    }

    pub fn with_max_tag_length(mut self, octets: usize) -> Self {
        self.max_tag_length = octets;
        self
    }

    pub fn with_indefinite_length_allowed(mut self, allowed: bool) -> Self {
        self.indefinite_length_allowed = allowed;
        self
    }

    pub fn with_max_pdu_size(mut self, size: usize) -> Self {
        self.max_pdu_size = size;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Check the configuration against the hard limits of the decoder
    ///
    /// # Returns
    /// `Ok(())` if every limit is representable, `Err(BerError::InvalidConfig)` otherwise
    pub fn validate(&self) -> BerResult<()> {
        if self.max_length_length > LENGTH_OCTETS_LIMIT {
            return Err(BerError::InvalidConfig(format!(
                "max_length_length {} exceeds {}",
                self.max_length_length, LENGTH_OCTETS_LIMIT
            )));
        }
        if self.max_tag_length == 0 || self.max_tag_length > TAG_OCTETS_LIMIT {
            return Err(BerError::InvalidConfig(format!(
                "max_tag_length {} must be within 1..={}",
                self.max_tag_length, TAG_OCTETS_LIMIT
            )));
        }
        if self.max_depth == 0 {
            return Err(BerError::InvalidConfig("max_depth must be at least 1".to_string()));
        }
        if self.max_pdu_size < 2 {
            return Err(BerError::InvalidConfig(format!(
                "max_pdu_size {} cannot hold a single TLV",
                self.max_pdu_size
            )));
        }
        if self.indefinite_length_allowed {
            log::warn!("indefinite length form requested but not implemented, it stays rejected");
        }
        Ok(())
    }

    /// Configuration for decoding a gathered value found at `depth`
    ///
    /// The nested decode inherits every limit, with the depth budget reduced
    /// by the levels already open in the enclosing decode.
    pub fn nested(&self, depth: usize) -> Self {
        Self {
            max_depth: self.max_depth.saturating_sub(depth).max(1),
            ..*self
        }
    }
}
