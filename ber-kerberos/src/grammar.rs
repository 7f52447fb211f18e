//! KRB-ERROR grammar
//!
//! Every field is wrapped in an EXPLICIT context tag, so each field takes
//! two transitions: one on the `[n]` wrapper (depth 2) and one on the
//! universal TLV inside it (depth 3). Optional fields are skipped by extra
//! transitions out of the preceding state. The two PrincipalName fields are
//! gathered whole and handed to the PrincipalName grammar.

use crate::constants::{ErrorCode, KRB5_PVNO, KRB_ERROR_MSG_TYPE, KRB_ERROR_TAG, MAX_MICROSECONDS};
use crate::kerberos_time::KerberosTime;
use crate::krb_error::KrbError;
use crate::principal_name::{PrincipalName, PrincipalNameBuilder};
use ber_asn1::ber::tag::{
    GENERAL_STRING_TAG, GENERALIZED_TIME_TAG, INTEGER_TAG, OCTET_STRING_TAG, SEQUENCE_TAG,
};
use ber_asn1::{Asn1Decoder, Decodable, Grammar, GrammarState, TlvEvent};
use ber_core::{BerError, BerResult};
use std::sync::Arc;

/// Grammar states of KRB-ERROR
///
/// `*Tag` states are entered on an `[n]` wrapper, the state without the
/// suffix on the value inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KrbErrorState {
    Start,
    KrbErrTag,
    KrbErrSeq,
    PvnoTag,
    Pvno,
    MsgTypeTag,
    MsgType,
    CtimeTag,
    Ctime,
    CusecTag,
    Cusec,
    StimeTag,
    Stime,
    SusecTag,
    Susec,
    ErrCodeTag,
    ErrCode,
    CrealmTag,
    Crealm,
    Cname,
    RealmTag,
    Realm,
    Sname,
    EtextTag,
    Etext,
    EdataTag,
    Edata,
}

impl GrammarState for KrbErrorState {
    const COUNT: usize = 27;
    const START: Self = KrbErrorState::Start;

    fn index(self) -> usize {
        self as usize
    }

    fn depth(self) -> Option<usize> {
        use KrbErrorState::*;

        match self {
            Start => None,
            KrbErrTag => Some(0),
            KrbErrSeq => Some(1),
            PvnoTag | MsgTypeTag | CtimeTag | CusecTag | StimeTag | SusecTag | ErrCodeTag
            | CrealmTag | Cname | RealmTag | Sname | EtextTag | EdataTag => Some(2),
            Pvno | MsgType | Ctime | Cusec | Stime | Susec | ErrCode | Crealm | Realm | Etext
            | Edata => Some(3),
        }
    }
}

/// KRB-ERROR under construction
pub struct KrbErrorBuilder {
    principal_grammar: Arc<Grammar<PrincipalNameBuilder>>,
    pvno: Option<u32>,
    msg_type: Option<u32>,
    ctime: Option<KerberosTime>,
    cusec: Option<u32>,
    stime: Option<KerberosTime>,
    susec: Option<u32>,
    error_code: Option<ErrorCode>,
    crealm: Option<String>,
    cname: Option<PrincipalName>,
    realm: Option<String>,
    sname: Option<PrincipalName>,
    e_text: Option<String>,
    e_data: Option<Vec<u8>>,
}

impl KrbErrorBuilder {
    /// Create an empty builder decoding principal names with `principal_grammar`
    pub fn new(principal_grammar: Arc<Grammar<PrincipalNameBuilder>>) -> Self {
        Self {
            principal_grammar,
            pvno: None,
            msg_type: None,
            ctime: None,
            cusec: None,
            stime: None,
            susec: None,
            error_code: None,
            crealm: None,
            cname: None,
            realm: None,
            sname: None,
            e_text: None,
            e_data: None,
        }
    }
}

fn missing(field: &str) -> BerError {
    BerError::InvalidValue(format!("KRB-ERROR without {}", field))
}

impl Decodable for KrbErrorBuilder {
    type State = KrbErrorState;
    type Output = KrbError;

    fn build(self) -> BerResult<KrbError> {
        Ok(KrbError {
            pvno: self.pvno.ok_or_else(|| missing("pvno"))?,
            msg_type: self.msg_type.ok_or_else(|| missing("msg-type"))?,
            ctime: self.ctime,
            cusec: self.cusec,
            stime: self.stime.ok_or_else(|| missing("stime"))?,
            susec: self.susec.ok_or_else(|| missing("susec"))?,
            error_code: self.error_code.ok_or_else(|| missing("error-code"))?,
            crealm: self.crealm,
            cname: self.cname,
            realm: self.realm.ok_or_else(|| missing("realm"))?,
            sname: self.sname.ok_or_else(|| missing("sname"))?,
            e_text: self.e_text,
            e_data: self.e_data,
        })
    }
}

fn microseconds(event: &TlvEvent<'_>, field: &str) -> BerResult<u32> {
    let value = event.integer()?;
    if !(0..=MAX_MICROSECONDS).contains(&value) {
        return Err(BerError::InvalidValue(format!(
            "{} {} outside 0..={}",
            field, value, MAX_MICROSECONDS
        )));
    }
    Ok(value as u32)
}

fn principal_name(builder: &KrbErrorBuilder, event: &TlvEvent<'_>) -> BerResult<PrincipalName> {
    let config = event.config().nested(event.depth() + 1);
    Asn1Decoder::decode_complete(
        &builder.principal_grammar,
        PrincipalNameBuilder::default(),
        event.value(),
        config,
    )
}

fn store_pvno(builder: &mut KrbErrorBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    let pvno = event.integer()?;
    if pvno != KRB5_PVNO {
        return Err(BerError::InvalidValue(format!(
            "pvno must be {}, got {}",
            KRB5_PVNO, pvno
        )));
    }
    builder.pvno = Some(pvno as u32);
    Ok(())
}

fn store_msg_type(builder: &mut KrbErrorBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    let msg_type = event.integer()?;
    if msg_type != KRB_ERROR_MSG_TYPE {
        return Err(BerError::InvalidValue(format!(
            "msg-type must be {}, got {}",
            KRB_ERROR_MSG_TYPE, msg_type
        )));
    }
    builder.msg_type = Some(msg_type as u32);
    Ok(())
}

fn store_ctime(builder: &mut KrbErrorBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    builder.ctime = Some(KerberosTime::from_bytes(event.value())?);
    Ok(())
}

fn store_cusec(builder: &mut KrbErrorBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    builder.cusec = Some(microseconds(event, "cusec")?);
    Ok(())
}

fn store_stime(builder: &mut KrbErrorBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    builder.stime = Some(KerberosTime::from_bytes(event.value())?);
    Ok(())
}

fn store_susec(builder: &mut KrbErrorBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    builder.susec = Some(microseconds(event, "susec")?);
    Ok(())
}

fn store_error_code(builder: &mut KrbErrorBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    builder.error_code = Some(ErrorCode(event.int32()?));
    Ok(())
}

fn store_crealm(builder: &mut KrbErrorBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    builder.crealm = Some(event.string()?);
    Ok(())
}

fn store_cname(builder: &mut KrbErrorBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    let cname = principal_name(builder, event)?;
    builder.cname = Some(cname);
    Ok(())
}

fn store_realm(builder: &mut KrbErrorBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    builder.realm = Some(event.string()?);
    Ok(())
}

fn store_sname(builder: &mut KrbErrorBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    let sname = principal_name(builder, event)?;
    builder.sname = Some(sname);
    Ok(())
}

fn store_e_text(builder: &mut KrbErrorBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    builder.e_text = Some(event.string()?);
    Ok(())
}

fn store_e_data(builder: &mut KrbErrorBuilder, event: &TlvEvent<'_>) -> BerResult<()> {
    builder.e_data = Some(event.value().to_vec());
    Ok(())
}

/// Build the KRB-ERROR grammar
pub fn krb_error_grammar() -> BerResult<Grammar<KrbErrorBuilder>> {
    use KrbErrorState::*;

    Grammar::builder("KRB-ERROR")
        .on(Start, KRB_ERROR_TAG, KrbErrTag)
        .on(KrbErrTag, SEQUENCE_TAG, KrbErrSeq)
        // pvno, msg-type
        .on(KrbErrSeq, 0xA0, PvnoTag)
        .on_action(PvnoTag, INTEGER_TAG, Pvno, store_pvno)
        .on(Pvno, 0xA1, MsgTypeTag)
        .on_action(MsgTypeTag, INTEGER_TAG, MsgType, store_msg_type)
        // ctime, cusec: both optional
        .on(MsgType, 0xA2, CtimeTag)
        .on(MsgType, 0xA3, CusecTag)
        .on(MsgType, 0xA4, StimeTag)
        .on_action(CtimeTag, GENERALIZED_TIME_TAG, Ctime, store_ctime)
        .on(Ctime, 0xA3, CusecTag)
        .on(Ctime, 0xA4, StimeTag)
        .on_action(CusecTag, INTEGER_TAG, Cusec, store_cusec)
        .on(Cusec, 0xA4, StimeTag)
        // stime, susec, error-code
        .on_action(StimeTag, GENERALIZED_TIME_TAG, Stime, store_stime)
        .on(Stime, 0xA5, SusecTag)
        .on_action(SusecTag, INTEGER_TAG, Susec, store_susec)
        .on(Susec, 0xA6, ErrCodeTag)
        .on_action(ErrCodeTag, INTEGER_TAG, ErrCode, store_error_code)
        // crealm, cname: both optional
        .on(ErrCode, 0xA7, CrealmTag)
        .gather(ErrCode, 0xA8, Cname, store_cname)
        .on(ErrCode, 0xA9, RealmTag)
        .on_action(CrealmTag, GENERAL_STRING_TAG, Crealm, store_crealm)
        .gather(Crealm, 0xA8, Cname, store_cname)
        .on(Crealm, 0xA9, RealmTag)
        .on(Cname, 0xA9, RealmTag)
        // realm, sname
        .on_action(RealmTag, GENERAL_STRING_TAG, Realm, store_realm)
        .gather(Realm, 0xAA, Sname, store_sname)
        // e-text, e-data: both optional
        .on(Sname, 0xAB, EtextTag)
        .on(Sname, 0xAC, EdataTag)
        .on_action(EtextTag, GENERAL_STRING_TAG, Etext, store_e_text)
        .on(Etext, 0xAC, EdataTag)
        .on_action(EdataTag, OCTET_STRING_TAG, Edata, store_e_data)
        .accept(Sname)
        .accept(Etext)
        .accept(Edata)
        .build()
}
