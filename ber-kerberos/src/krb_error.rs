//! KRB-ERROR message
//!
//! ```text
//! KRB-ERROR ::= [APPLICATION 30] SEQUENCE {
//!     pvno        [0] INTEGER (5),
//!     msg-type    [1] INTEGER (30),
//!     ctime       [2] KerberosTime OPTIONAL,
//!     cusec       [3] Microseconds OPTIONAL,
//!     stime       [4] KerberosTime,
//!     susec       [5] Microseconds,
//!     error-code  [6] Int32,
//!     crealm      [7] Realm OPTIONAL,
//!     cname       [8] PrincipalName OPTIONAL,
//!     realm       [9] Realm,
//!     sname       [10] PrincipalName,
//!     e-text      [11] KerberosString OPTIONAL,
//!     e-data      [12] OCTET STRING OPTIONAL
//! }
//! ```

use crate::constants::{ErrorCode, KRB5_PVNO, KRB_ERROR_MSG_TYPE};
use crate::kerberos_time::KerberosTime;
use crate::principal_name::PrincipalName;
use ber_asn1::BerEncoder;
use ber_core::BerResult;
use serde::{Deserialize, Serialize};

/// Kerberos error message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KrbError {
    pub pvno: u32,
    pub msg_type: u32,
    pub ctime: Option<KerberosTime>,
    pub cusec: Option<u32>,
    pub stime: KerberosTime,
    pub susec: u32,
    pub error_code: ErrorCode,
    pub crealm: Option<String>,
    pub cname: Option<PrincipalName>,
    pub realm: String,
    pub sname: PrincipalName,
    pub e_text: Option<String>,
    #[serde(with = "serde_bytes")]
    pub e_data: Option<Vec<u8>>,
}

impl KrbError {
    /// Create an error carrying only the mandatory fields
    ///
    /// # Arguments
    /// * `error_code` - Reason for the error
    /// * `realm` - Realm of the server that issued it
    /// * `sname` - Name of that server
    /// * `stime` - Server time
    /// * `susec` - Microseconds part of the server time
    pub fn new(
        error_code: ErrorCode,
        realm: impl Into<String>,
        sname: PrincipalName,
        stime: KerberosTime,
        susec: u32,
    ) -> Self {
        Self {
            pvno: KRB5_PVNO as u32,
            msg_type: KRB_ERROR_MSG_TYPE as u32,
            ctime: None,
            cusec: None,
            stime,
            susec,
            error_code,
            crealm: None,
            cname: None,
            realm: realm.into(),
            sname,
            e_text: None,
            e_data: None,
        }
    }

    pub fn with_client_time(mut self, ctime: KerberosTime, cusec: u32) -> Self {
        self.ctime = Some(ctime);
        self.cusec = Some(cusec);
        self
    }

    pub fn with_client(mut self, crealm: impl Into<String>, cname: PrincipalName) -> Self {
        self.crealm = Some(crealm.into());
        self.cname = Some(cname);
        self
    }

    pub fn with_e_text(mut self, e_text: impl Into<String>) -> Self {
        self.e_text = Some(e_text.into());
        self
    }

    pub fn with_e_data(mut self, e_data: Vec<u8>) -> Self {
        self.e_data = Some(e_data);
        self
    }

    /// Encode the message, `[APPLICATION 30]` wrapper included
    pub fn encode(&self) -> BerResult<Vec<u8>> {
        let mut body = BerEncoder::with_capacity(128);
        body.encode_explicit(0, |e| e.encode_integer(self.pvno as i64))?;
        body.encode_explicit(1, |e| e.encode_integer(self.msg_type as i64))?;
        if let Some(ctime) = &self.ctime {
            body.encode_explicit(2, |e| e.encode_generalized_time(ctime.as_str()))?;
        }
        if let Some(cusec) = self.cusec {
            body.encode_explicit(3, |e| e.encode_integer(cusec as i64))?;
        }
        body.encode_explicit(4, |e| e.encode_generalized_time(self.stime.as_str()))?;
        body.encode_explicit(5, |e| e.encode_integer(self.susec as i64))?;
        body.encode_explicit(6, |e| e.encode_integer(self.error_code.0 as i64))?;
        if let Some(crealm) = &self.crealm {
            body.encode_explicit(7, |e| e.encode_general_string(crealm))?;
        }
        if let Some(cname) = &self.cname {
            body.encode_explicit(8, |e| cname.encode(e))?;
        }
        body.encode_explicit(9, |e| e.encode_general_string(&self.realm))?;
        body.encode_explicit(10, |e| self.sname.encode(e))?;
        if let Some(e_text) = &self.e_text {
            body.encode_explicit(11, |e| e.encode_general_string(e_text))?;
        }
        if let Some(e_data) = &self.e_data {
            body.encode_explicit(12, |e| e.encode_octet_string(e_data))?;
        }

        let mut sequence = BerEncoder::new();
        sequence.encode_sequence(body.as_bytes())?;
        let mut message = BerEncoder::with_capacity(sequence.len() + 4);
        message.encode_application(KRB_ERROR_MSG_TYPE as u32, sequence.as_bytes(), true)?;
        Ok(message.into_bytes())
    }
}
