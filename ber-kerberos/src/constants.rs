//! Kerberos protocol constants (RFC 4120)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version number carried in `pvno`
pub const KRB5_PVNO: i64 = 5;

/// Message type of KRB-ERROR, also its APPLICATION tag number
pub const KRB_ERROR_MSG_TYPE: i64 = 30;

/// Identifier octet of `[APPLICATION 30]` constructed
pub const KRB_ERROR_TAG: u8 = 0x7E;

/// Largest value of a microseconds field
pub const MAX_MICROSECONDS: i64 = 999_999;

/// KRB-ERROR `error-code` (RFC 4120 §7.5.9)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    pub const KDC_ERR_NONE: ErrorCode = ErrorCode(0);
    pub const KDC_ERR_NAME_EXP: ErrorCode = ErrorCode(1);
    pub const KDC_ERR_SERVICE_EXP: ErrorCode = ErrorCode(2);
    pub const KDC_ERR_BAD_PVNO: ErrorCode = ErrorCode(3);
    pub const KDC_ERR_C_OLD_MAST_KVNO: ErrorCode = ErrorCode(4);
    pub const KDC_ERR_S_OLD_MAST_KVNO: ErrorCode = ErrorCode(5);
    pub const KDC_ERR_C_PRINCIPAL_UNKNOWN: ErrorCode = ErrorCode(6);
    pub const KDC_ERR_S_PRINCIPAL_UNKNOWN: ErrorCode = ErrorCode(7);
    pub const KDC_ERR_PRINCIPAL_NOT_UNIQUE: ErrorCode = ErrorCode(8);
    pub const KDC_ERR_NULL_KEY: ErrorCode = ErrorCode(9);
    pub const KDC_ERR_CANNOT_POSTDATE: ErrorCode = ErrorCode(10);
    pub const KDC_ERR_NEVER_VALID: ErrorCode = ErrorCode(11);
    pub const KDC_ERR_POLICY: ErrorCode = ErrorCode(12);
    pub const KDC_ERR_BADOPTION: ErrorCode = ErrorCode(13);
    pub const KDC_ERR_ETYPE_NOSUPP: ErrorCode = ErrorCode(14);
    pub const KDC_ERR_SUMTYPE_NOSUPP: ErrorCode = ErrorCode(15);
    pub const KDC_ERR_PADATA_TYPE_NOSUPP: ErrorCode = ErrorCode(16);
    pub const KDC_ERR_TRTYPE_NOSUPP: ErrorCode = ErrorCode(17);
    pub const KDC_ERR_CLIENT_REVOKED: ErrorCode = ErrorCode(18);
    pub const KDC_ERR_SERVICE_REVOKED: ErrorCode = ErrorCode(19);
    pub const KDC_ERR_TGT_REVOKED: ErrorCode = ErrorCode(20);
    pub const KDC_ERR_CLIENT_NOTYET: ErrorCode = ErrorCode(21);
    pub const KDC_ERR_SERVICE_NOTYET: ErrorCode = ErrorCode(22);
    pub const KDC_ERR_KEY_EXPIRED: ErrorCode = ErrorCode(23);
    pub const KDC_ERR_PREAUTH_FAILED: ErrorCode = ErrorCode(24);
    pub const KDC_ERR_PREAUTH_REQUIRED: ErrorCode = ErrorCode(25);
    pub const KDC_ERR_SERVER_NOMATCH: ErrorCode = ErrorCode(26);
    pub const KDC_ERR_MUST_USE_USER2USER: ErrorCode = ErrorCode(27);
    pub const KDC_ERR_PATH_NOT_ACCEPTED: ErrorCode = ErrorCode(28);
    pub const KDC_ERR_SVC_UNAVAILABLE: ErrorCode = ErrorCode(29);
    pub const KRB_AP_ERR_BAD_INTEGRITY: ErrorCode = ErrorCode(31);
    pub const KRB_AP_ERR_TKT_EXPIRED: ErrorCode = ErrorCode(32);
    pub const KRB_AP_ERR_TKT_NYV: ErrorCode = ErrorCode(33);
    pub const KRB_AP_ERR_REPEAT: ErrorCode = ErrorCode(34);
    pub const KRB_AP_ERR_NOT_US: ErrorCode = ErrorCode(35);
    pub const KRB_AP_ERR_BADMATCH: ErrorCode = ErrorCode(36);
    pub const KRB_AP_ERR_SKEW: ErrorCode = ErrorCode(37);
    pub const KRB_AP_ERR_BADADDR: ErrorCode = ErrorCode(38);
    pub const KRB_AP_ERR_BADVERSION: ErrorCode = ErrorCode(39);
    pub const KRB_AP_ERR_MSG_TYPE: ErrorCode = ErrorCode(40);
    pub const KRB_AP_ERR_MODIFIED: ErrorCode = ErrorCode(41);
    pub const KRB_AP_ERR_BADORDER: ErrorCode = ErrorCode(42);
    pub const KRB_AP_ERR_BADKEYVER: ErrorCode = ErrorCode(44);
    pub const KRB_AP_ERR_NOKEY: ErrorCode = ErrorCode(45);
    pub const KRB_AP_ERR_MUT_FAIL: ErrorCode = ErrorCode(46);
    pub const KRB_AP_ERR_BADDIRECTION: ErrorCode = ErrorCode(47);
    pub const KRB_AP_ERR_METHOD: ErrorCode = ErrorCode(48);
    pub const KRB_AP_ERR_BADSEQ: ErrorCode = ErrorCode(49);
    pub const KRB_AP_ERR_INAPP_CKSUM: ErrorCode = ErrorCode(50);
    pub const KRB_AP_PATH_NOT_ACCEPTED: ErrorCode = ErrorCode(51);
    pub const KRB_ERR_RESPONSE_TOO_BIG: ErrorCode = ErrorCode(52);
    pub const KRB_ERR_GENERIC: ErrorCode = ErrorCode(60);
    pub const KRB_ERR_FIELD_TOOLONG: ErrorCode = ErrorCode(61);

    /// Mnemonic of a registered code
    pub fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            0 => "KDC_ERR_NONE",
            1 => "KDC_ERR_NAME_EXP",
            2 => "KDC_ERR_SERVICE_EXP",
            3 => "KDC_ERR_BAD_PVNO",
            4 => "KDC_ERR_C_OLD_MAST_KVNO",
            5 => "KDC_ERR_S_OLD_MAST_KVNO",
            6 => "KDC_ERR_C_PRINCIPAL_UNKNOWN",
            7 => "KDC_ERR_S_PRINCIPAL_UNKNOWN",
            8 => "KDC_ERR_PRINCIPAL_NOT_UNIQUE",
            9 => "KDC_ERR_NULL_KEY",
            10 => "KDC_ERR_CANNOT_POSTDATE",
            11 => "KDC_ERR_NEVER_VALID",
            12 => "KDC_ERR_POLICY",
            13 => "KDC_ERR_BADOPTION",
            14 => "KDC_ERR_ETYPE_NOSUPP",
            15 => "KDC_ERR_SUMTYPE_NOSUPP",
            16 => "KDC_ERR_PADATA_TYPE_NOSUPP",
            17 => "KDC_ERR_TRTYPE_NOSUPP",
            18 => "KDC_ERR_CLIENT_REVOKED",
            19 => "KDC_ERR_SERVICE_REVOKED",
            20 => "KDC_ERR_TGT_REVOKED",
            21 => "KDC_ERR_CLIENT_NOTYET",
            22 => "KDC_ERR_SERVICE_NOTYET",
            23 => "KDC_ERR_KEY_EXPIRED",
            24 => "KDC_ERR_PREAUTH_FAILED",
            25 => "KDC_ERR_PREAUTH_REQUIRED",
            26 => "KDC_ERR_SERVER_NOMATCH",
            27 => "KDC_ERR_MUST_USE_USER2USER",
            28 => "KDC_ERR_PATH_NOT_ACCEPTED",
            29 => "KDC_ERR_SVC_UNAVAILABLE",
            31 => "KRB_AP_ERR_BAD_INTEGRITY",
            32 => "KRB_AP_ERR_TKT_EXPIRED",
            33 => "KRB_AP_ERR_TKT_NYV",
            34 => "KRB_AP_ERR_REPEAT",
            35 => "KRB_AP_ERR_NOT_US",
            36 => "KRB_AP_ERR_BADMATCH",
            37 => "KRB_AP_ERR_SKEW",
            38 => "KRB_AP_ERR_BADADDR",
            39 => "KRB_AP_ERR_BADVERSION",
            40 => "KRB_AP_ERR_MSG_TYPE",
            41 => "KRB_AP_ERR_MODIFIED",
            42 => "KRB_AP_ERR_BADORDER",
            44 => "KRB_AP_ERR_BADKEYVER",
            45 => "KRB_AP_ERR_NOKEY",
            46 => "KRB_AP_ERR_MUT_FAIL",
            47 => "KRB_AP_ERR_BADDIRECTION",
            48 => "KRB_AP_ERR_METHOD",
            49 => "KRB_AP_ERR_BADSEQ",
            50 => "KRB_AP_ERR_INAPP_CKSUM",
            51 => "KRB_AP_PATH_NOT_ACCEPTED",
            52 => "KRB_ERR_RESPONSE_TOO_BIG",
            60 => "KRB_ERR_GENERIC",
            61 => "KRB_ERR_FIELD_TOOLONG",
            _  => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => f.debug_tuple("ErrorCode").field(&self.0).finish(),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "error code {}", self.0),
        }
    }
}

/// PrincipalName `name-type` (RFC 4120 §6.2)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalNameType(pub i32);

impl PrincipalNameType {
    pub const NT_UNKNOWN: PrincipalNameType = PrincipalNameType(0);
    pub const NT_PRINCIPAL: PrincipalNameType = PrincipalNameType(1);
    pub const NT_SRV_INST: PrincipalNameType = PrincipalNameType(2);
    pub const NT_SRV_HST: PrincipalNameType = PrincipalNameType(3);
    pub const NT_SRV_XHST: PrincipalNameType = PrincipalNameType(4);
    pub const NT_UID: PrincipalNameType = PrincipalNameType(5);
    pub const NT_X500_PRINCIPAL: PrincipalNameType = PrincipalNameType(6);
    pub const NT_SMTP_NAME: PrincipalNameType = PrincipalNameType(7);
    pub const NT_ENTERPRISE: PrincipalNameType = PrincipalNameType(10);
}

impl fmt::Debug for PrincipalNameType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            0 => f.write_str("NT-UNKNOWN"),
            1 => f.write_str("NT-PRINCIPAL"),
            2 => f.write_str("NT-SRV-INST"),
            3 => f.write_str("NT-SRV-HST"),
            4 => f.write_str("NT-SRV-XHST"),
            5 => f.write_str("NT-UID"),
            6 => f.write_str("NT-X500-PRINCIPAL"),
            7 => f.write_str("NT-SMTP-NAME"),
            10 => f.write_str("NT-ENTERPRISE"),
            n => f.debug_tuple("PrincipalNameType").field(&n).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_names() {
        assert_eq!(ErrorCode::KDC_ERR_PREAUTH_REQUIRED.name(), Some("KDC_ERR_PREAUTH_REQUIRED"));
        assert_eq!(ErrorCode(30).name(), None);
        assert_eq!(format!("{:?}", ErrorCode::KRB_AP_ERR_SKEW), "KRB_AP_ERR_SKEW");
        assert_eq!(format!("{:?}", ErrorCode(1000)), "ErrorCode(1000)");
        assert_eq!(ErrorCode::KRB_ERR_GENERIC.to_string(), "KRB_ERR_GENERIC (60)");
    }

    #[test]
    fn test_name_type_debug() {
        assert_eq!(format!("{:?}", PrincipalNameType::NT_SRV_INST), "NT-SRV-INST");
        assert_eq!(format!("{:?}", PrincipalNameType(-128)), "PrincipalNameType(-128)");
    }
}
