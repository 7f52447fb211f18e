//! Core types and utilities for the BER TLV codec
//!
//! This crate provides the error taxonomy and the decoder configuration
//! shared by every layer of the codec.

pub mod config;
pub mod error;

pub use config::DecoderConfig;
pub use error::{BerError, BerResult, ExpectedTags, ResourceLimit};
