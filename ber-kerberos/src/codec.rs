//! Grammar registry for the Kerberos messages
//!
//! Grammars are built once and never change afterwards, so a single
//! [`KerberosCodec`] can be shared by every connection of a server. Each
//! decode gets its own [`Container`].

use crate::grammar::{krb_error_grammar, KrbErrorBuilder};
use crate::krb_error::KrbError;
use crate::principal_name::{principal_name_grammar, PrincipalName, PrincipalNameBuilder};
use ber_asn1::{Asn1Decoder, Container, Grammar};
use ber_core::{BerResult, DecoderConfig};
use std::sync::Arc;

/// Owner of the KRB-ERROR and PrincipalName grammars
pub struct KerberosCodec {
    principal_grammar: Arc<Grammar<PrincipalNameBuilder>>,
    krb_error_grammar: Grammar<KrbErrorBuilder>,
    config: DecoderConfig,
}

impl KerberosCodec {
    /// Build the grammars with the default decoder configuration
    pub fn new() -> BerResult<Self> {
        Self::with_config(DecoderConfig::default())
    }

    /// Build the grammars; every decode uses `config`
    ///
    /// # Error Handling
    /// Returns `InvalidConfig` for a configuration outside the hard limits.
    pub fn with_config(config: DecoderConfig) -> BerResult<Self> {
        config.validate()?;
        let codec = Self {
            principal_grammar: Arc::new(principal_name_grammar()?),
            krb_error_grammar: krb_error_grammar()?,
            config,
        };
        log::info!(
            "Kerberos codec ready ({} KRB-ERROR transitions)",
            codec.krb_error_grammar.transition_count()
        );
        Ok(codec)
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn krb_error_grammar(&self) -> &Grammar<KrbErrorBuilder> {
        &self.krb_error_grammar
    }

    pub fn principal_name_grammar(&self) -> &Grammar<PrincipalNameBuilder> {
        &self.principal_grammar
    }

    /// Fresh target for a KRB-ERROR decode
    pub fn krb_error_builder(&self) -> KrbErrorBuilder {
        KrbErrorBuilder::new(Arc::clone(&self.principal_grammar))
    }

    /// Container for decoding a KRB-ERROR fed in chunks
    pub fn krb_error_container(&self) -> BerResult<Container<'_, KrbErrorBuilder>> {
        Container::with_config(&self.krb_error_grammar, self.krb_error_builder(), self.config)
    }

    /// Decode a KRB-ERROR that fills `data` exactly
    pub fn decode_krb_error(&self, data: &[u8]) -> BerResult<KrbError> {
        Asn1Decoder::decode_complete(
            &self.krb_error_grammar,
            self.krb_error_builder(),
            data,
            self.config,
        )
    }

    /// Decode a PrincipalName SEQUENCE that fills `data` exactly
    pub fn decode_principal_name(&self, data: &[u8]) -> BerResult<PrincipalName> {
        Asn1Decoder::decode_complete(
            &self.principal_grammar,
            PrincipalNameBuilder::default(),
            data,
            self.config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ErrorCode, PrincipalNameType};
    use crate::kerberos_time::KerberosTime;
    use ber_asn1::{BerEncoder, DecodeStatus};
    use ber_core::BerError;

    const STIME: &str = "20240102030405Z";

    fn explicit(
        encoder: &mut BerEncoder,
        n: u32,
        f: impl FnOnce(&mut BerEncoder) -> BerResult<()>,
    ) {
        encoder.encode_explicit(n, f).unwrap();
    }

    fn krbtgt_sname(e: &mut BerEncoder) -> BerResult<()> {
        PrincipalName::krbtgt("EXAMPLE.COM").encode(e)
    }

    /// KRB-ERROR body fields in the order given, wrapped in SEQUENCE and
    /// [APPLICATION 30]
    fn wrap(body: &BerEncoder) -> Vec<u8> {
        let mut sequence = BerEncoder::new();
        sequence.encode_sequence(body.as_bytes()).unwrap();
        let mut message = BerEncoder::new();
        message.encode_application(30, sequence.as_bytes(), true).unwrap();
        message.into_bytes()
    }

    fn head(body: &mut BerEncoder, pvno: i64) {
        explicit(body, 0, |e| e.encode_integer(pvno));
        explicit(body, 1, |e| e.encode_integer(30));
        explicit(body, 4, |e| e.encode_generalized_time(STIME));
        explicit(body, 5, |e| e.encode_integer(0));
        explicit(body, 6, |e| e.encode_integer(0));
    }

    /// pvno, msg-type, stime, susec, error-code, crealm, realm, sname
    fn minimal_bytes() -> Vec<u8> {
        let mut body = BerEncoder::new();
        head(&mut body, 5);
        explicit(&mut body, 7, |e| e.encode_general_string("EXAMPLE.COM"));
        explicit(&mut body, 9, |e| e.encode_general_string("EXAMPLE.COM"));
        explicit(&mut body, 10, krbtgt_sname);
        wrap(&body)
    }

    fn full_error() -> KrbError {
        KrbError::new(
            ErrorCode::KDC_ERR_PREAUTH_REQUIRED,
            "EXAMPLE.COM",
            PrincipalName::krbtgt("EXAMPLE.COM"),
            KerberosTime::parse(STIME).unwrap(),
            999_999,
        )
        .with_client_time(KerberosTime::parse("20240102030400Z").unwrap(), 42)
        .with_client(
            "EXAMPLE.COM",
            PrincipalName::new(PrincipalNameType::NT_PRINCIPAL, ["alice"]),
        )
        .with_e_text("pre-authentication required")
        .with_e_data(vec![0x30, 0x03, 0x02, 0x01, 0x02])
    }

    #[test]
    fn test_minimal_message() {
        let bytes = minimal_bytes();
        assert_eq!(&bytes[..4], &[0x7E, 0x69, 0x30, 0x67]);

        let codec = KerberosCodec::new().unwrap();
        let error = codec.decode_krb_error(&bytes).unwrap();
        assert_eq!(error.pvno, 5);
        assert_eq!(error.msg_type, 30);
        assert_eq!(error.stime.as_str(), STIME);
        assert_eq!(error.susec, 0);
        assert_eq!(error.error_code, ErrorCode::KDC_ERR_NONE);
        assert_eq!(error.crealm.as_deref(), Some("EXAMPLE.COM"));
        assert_eq!(error.realm, "EXAMPLE.COM");
        assert_eq!(error.sname, PrincipalName::krbtgt("EXAMPLE.COM"));
        assert!(error.ctime.is_none());
        assert!(error.cusec.is_none());
        assert!(error.cname.is_none());
        assert!(error.e_text.is_none());
        assert!(error.e_data.is_none());
    }

    #[test]
    fn test_sname_before_crealm_rejected() {
        let mut body = BerEncoder::new();
        head(&mut body, 5);
        explicit(&mut body, 10, krbtgt_sname);
        explicit(&mut body, 7, |e| e.encode_general_string("EXAMPLE.COM"));
        explicit(&mut body, 9, |e| e.encode_general_string("EXAMPLE.COM"));

        let codec = KerberosCodec::new().unwrap();
        match codec.decode_krb_error(&wrap(&body)) {
            Err(BerError::UnexpectedTag { grammar, state, tag, expected }) => {
                assert_eq!(grammar, "KRB-ERROR");
                assert_eq!(state, "ErrCode");
                assert_eq!(tag, 0xAA);
                assert!(expected.contains(0xA7));
                assert!(expected.contains(0xA9));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_missing_sname_is_incomplete() {
        let mut body = BerEncoder::new();
        head(&mut body, 5);
        explicit(&mut body, 9, |e| e.encode_general_string("EXAMPLE.COM"));

        let codec = KerberosCodec::new().unwrap();
        assert!(matches!(
            codec.decode_krb_error(&wrap(&body)),
            Err(BerError::IncompleteMessage { grammar: "KRB-ERROR", state, .. }) if state == "Realm"
        ));
    }

    #[test]
    fn test_bad_pvno() {
        let mut body = BerEncoder::new();
        head(&mut body, 4);
        explicit(&mut body, 9, |e| e.encode_general_string("EXAMPLE.COM"));
        explicit(&mut body, 10, krbtgt_sname);

        let codec = KerberosCodec::new().unwrap();
        assert!(matches!(
            codec.decode_krb_error(&wrap(&body)),
            Err(BerError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_susec_out_of_range() {
        let mut body = BerEncoder::new();
        explicit(&mut body, 0, |e| e.encode_integer(5));
        explicit(&mut body, 1, |e| e.encode_integer(30));
        explicit(&mut body, 4, |e| e.encode_generalized_time(STIME));
        explicit(&mut body, 5, |e| e.encode_integer(1_000_000));

        let codec = KerberosCodec::new().unwrap();
        assert!(matches!(
            codec.decode_krb_error(&wrap(&body)),
            Err(BerError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_full_round_trip() {
        let error = full_error();
        let bytes = error.encode().unwrap();
        let codec = KerberosCodec::new().unwrap();
        assert_eq!(codec.decode_krb_error(&bytes).unwrap(), error);
    }

    #[test]
    fn test_chunk_boundary_invariance() {
        let error = full_error();
        let bytes = error.encode().unwrap();
        let codec = KerberosCodec::new().unwrap();
        let whole = codec.decode_krb_error(&bytes).unwrap();

        for chunk in [1, 2, 5, 13] {
            let mut container = codec.krb_error_container().unwrap();
            let mut status = DecodeStatus::NeedMoreData;
            for piece in bytes.chunks(chunk) {
                let mut input = piece;
                status = container.feed(&mut input).unwrap();
                assert!(input.is_empty());
            }
            assert_eq!(status, DecodeStatus::Decoded);
            assert_eq!(container.finish().unwrap(), whole);
        }
    }

    #[test]
    fn test_container_reuse() {
        let codec = KerberosCodec::new().unwrap();
        let first = minimal_bytes();
        let second = full_error().encode().unwrap();

        let mut container = codec.krb_error_container().unwrap();
        let mut input: &[u8] = &first;
        assert_eq!(container.feed(&mut input).unwrap(), DecodeStatus::Decoded);
        let decoded = container.finish_and_reset(codec.krb_error_builder()).unwrap();
        assert_eq!(decoded.error_code, ErrorCode::KDC_ERR_NONE);

        let mut input: &[u8] = &second;
        assert_eq!(container.feed(&mut input).unwrap(), DecodeStatus::Decoded);
        assert_eq!(container.finish().unwrap(), full_error());
    }

    #[test]
    fn test_principal_name_smuggled_into_wrapper() {
        // [10] holding a bare GeneralString instead of a PrincipalName
        let mut body = BerEncoder::new();
        head(&mut body, 5);
        explicit(&mut body, 9, |e| e.encode_general_string("EXAMPLE.COM"));
        explicit(&mut body, 10, |e| e.encode_general_string("krbtgt"));

        let codec = KerberosCodec::new().unwrap();
        assert!(matches!(
            codec.decode_krb_error(&wrap(&body)),
            Err(BerError::UnexpectedTag { grammar: "PrincipalName", tag: 0x1B, .. })
        ));
    }

    #[test]
    fn test_short_form_only_codec() {
        let codec = KerberosCodec::with_config(DecoderConfig::short_form_only()).unwrap();
        assert!(codec.decode_krb_error(&minimal_bytes()).is_ok());

        let long = full_error().with_e_data(vec![0; 200]).encode().unwrap();
        assert!(matches!(
            codec.decode_krb_error(&long),
            Err(BerError::LengthOverflow { octets: 2, max: 0 })
        ));
    }
}
