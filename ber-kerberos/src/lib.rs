//! Kerberos message codec
//!
//! This crate illustrates how a message type extends the BER decoder: it
//! declares grammar states, an object that actions populate, and a grammar
//! wiring tags to actions. No decoder code is involved.
//!
//! # Messages
//!
//! - KRB-ERROR (RFC 4120 §5.9.1), see [`KrbError`]
//! - PrincipalName, decoded as a gathered sub-structure

pub mod codec;
pub mod constants;
pub mod grammar;
pub mod kerberos_time;
pub mod krb_error;
pub mod principal_name;

pub use codec::KerberosCodec;
pub use constants::{ErrorCode, PrincipalNameType};
pub use grammar::{KrbErrorBuilder, KrbErrorState};
pub use kerberos_time::KerberosTime;
pub use krb_error::KrbError;
pub use principal_name::{PrincipalName, PrincipalNameBuilder, PrincipalNameState};
