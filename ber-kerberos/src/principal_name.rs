//! PrincipalName and its grammar
//!
//! ```text
//! PrincipalName ::= SEQUENCE {
//!     name-type   [0] Int32,
//!     name-string [1] SEQUENCE OF KerberosString
//! }
//! ```
//!
//! A PrincipalName inside KRB-ERROR is gathered whole by the enclosing
//! grammar and decoded here as a PDU of its own.

use crate::constants::PrincipalNameType;
use ber_asn1::ber::tag::{GENERAL_STRING_TAG, INTEGER_TAG, SEQUENCE_TAG};
use ber_asn1::{BerEncoder, Decodable, Grammar, GrammarState, TlvEvent};
use ber_core::{BerError, BerResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kerberos principal: a name type and one or more name components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalName {
    pub name_type: PrincipalNameType,
    pub name_string: Vec<String>,
}

impl PrincipalName {
    pub fn new<S: Into<String>>(
        name_type: PrincipalNameType,
        components: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name_type,
            name_string: components.into_iter().map(Into::into).collect(),
        }
    }

    /// `krbtgt/REALM`, the ticket-granting service of `realm`
    pub fn krbtgt(realm: &str) -> Self {
        Self::new(PrincipalNameType::NT_SRV_INST, ["krbtgt", realm])
    }

    /// Append the encoded SEQUENCE to `encoder`
    pub fn encode(&self, encoder: &mut BerEncoder) -> BerResult<()> {
        let mut names = BerEncoder::new();
        for component in &self.name_string {
            names.encode_general_string(component)?;
        }
        let mut body = BerEncoder::new();
        body.encode_explicit(0, |e| e.encode_integer(self.name_type.0 as i64))?;
        body.encode_explicit(1, |e| e.encode_sequence(names.as_bytes()))?;
        encoder.encode_sequence(body.as_bytes())
    }
}

impl fmt::Display for PrincipalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name_string.join("/"))
    }
}

/// Grammar states of PrincipalName
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalNameState {
    Start,
    Seq,
    NameTypeTag,
    NameType,
    NameStringTag,
    NameStringSeq,
    NameString,
}

impl GrammarState for PrincipalNameState {
    const COUNT: usize = 7;
    const START: Self = PrincipalNameState::Start;

    fn index(self) -> usize {
        self as usize
    }

    fn depth(self) -> Option<usize> {
        match self {
            PrincipalNameState::Start => None,
            PrincipalNameState::Seq => Some(0),
            PrincipalNameState::NameTypeTag | PrincipalNameState::NameStringTag => Some(1),
            PrincipalNameState::NameType | PrincipalNameState::NameStringSeq => Some(2),
            PrincipalNameState::NameString => Some(3),
        }
    }
}

/// PrincipalName under construction
#[derive(Debug, Default)]
pub struct PrincipalNameBuilder {
    name_type: Option<PrincipalNameType>,
    name_string: Vec<String>,
}

impl Decodable for PrincipalNameBuilder {
    type State = PrincipalNameState;
    type Output = PrincipalName;

    fn build(self) -> BerResult<PrincipalName> {
        let name_type = self
            .name_type
            .ok_or_else(|| BerError::InvalidValue("PrincipalName without name-type".to_string()))?;
        Ok(PrincipalName {
            name_type,
            name_string: self.name_string,
        })
    }
}

fn store_name_type(builder: &mut PrincipalNameBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    builder.name_type = Some(PrincipalNameType(event.int32()?));
    Ok(())
}

fn store_name_component(builder: &mut PrincipalNameBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    builder.name_string.push(event.string()?);
    Ok(())
}

/// Build the PrincipalName grammar
pub fn principal_name_grammar() -> BerResult<Grammar<PrincipalNameBuilder>> {
    use PrincipalNameState::*;

    Grammar::builder("PrincipalName")
        .on(Start, SEQUENCE_TAG, Seq)
        .on(Seq, 0xA0, NameTypeTag)
        .on_action(NameTypeTag, INTEGER_TAG, NameType, store_name_type)
        .on(NameType, 0xA1, NameStringTag)
        .on(NameStringTag, SEQUENCE_TAG, NameStringSeq)
        .on_action(NameStringSeq, GENERAL_STRING_TAG, NameString, store_name_component)
        .on_action(NameString, GENERAL_STRING_TAG, NameString, store_name_component)
        .accept(NameString)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ber_asn1::Asn1Decoder;
    use ber_core::DecoderConfig;

    fn decode(bytes: &[u8]) -> BerResult<PrincipalName> {
        let grammar = principal_name_grammar().unwrap();
        Asn1Decoder::decode_complete(
            &grammar,
            PrincipalNameBuilder::default(),
            bytes,
            DecoderConfig::default(),
        )
    }

    #[test]
    fn test_encode_krbtgt() {
        let mut encoder = BerEncoder::new();
        PrincipalName::krbtgt("EXAMPLE.COM").encode(&mut encoder).unwrap();
        let mut expected = vec![
            0x30, 0x1E, 0xA0, 0x03, 0x02, 0x01, 0x02, 0xA1, 0x17, 0x30, 0x15, 0x1B, 0x06,
        ];
        expected.extend_from_slice(b"krbtgt");
        expected.extend_from_slice(&[0x1B, 0x0B]);
        expected.extend_from_slice(b"EXAMPLE.COM");
        assert_eq!(encoder.into_bytes(), expected);
    }

    #[test]
    fn test_decode_multi_component() {
        let name = PrincipalName::new(PrincipalNameType::NT_SRV_HST, ["host", "kdc.example.com"]);
        let mut encoder = BerEncoder::new();
        name.encode(&mut encoder).unwrap();
        let decoded = decode(encoder.as_bytes()).unwrap();
        assert_eq!(decoded, name);
        assert_eq!(decoded.to_string(), "host/kdc.example.com");
    }

    #[test]
    fn test_empty_name_string_rejected() {
        let bytes = [0x30, 0x09, 0xA0, 0x03, 0x02, 0x01, 0x01, 0xA1, 0x02, 0x30, 0x00];
        assert!(matches!(
            decode(&bytes),
            Err(BerError::IncompleteMessage { grammar: "PrincipalName", .. })
        ));
    }

    #[test]
    fn test_name_type_out_of_range() {
        // name-type of five octets does not fit Int32
        let bytes = [
            0x30, 0x10, 0xA0, 0x07, 0x02, 0x05, 0x01, 0x00, 0x00, 0x00, 0x00, 0xA1, 0x05, 0x30,
            0x03, 0x1B, 0x01, b'a',
        ];
        assert!(matches!(decode(&bytes), Err(BerError::InvalidValue(_))));
    }
}
