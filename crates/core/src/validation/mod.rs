//! Field-level verification of decoded transactions against test vectors.
//!
//! [`ExpectedTransaction::verify`] is the field contract; [`Fixture::run`]
//! combines decoding, sender derivation and the field contract into a single
//! pass/fail verdict.

use crate::rlp::DecodeError;
use crate::signer::SignatureError;
use alloy_primitives::{Address, Bytes, U256};
use std::fmt;
use thiserror::Error;

mod fields;
pub mod fixture;

pub use fixture::{load_fixtures, run_all, ExpectedTransaction, Fixture, FixtureError, FixtureOutcome};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("RLP decoding failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("sender mismatch: got {got}, want {want}")]
    SenderMismatch { got: Address, want: Address },

    #[error("field validation failed after RLP decoding: {0}")]
    FieldMismatch(#[from] FieldMismatch),

    #[error("sender is expected but the fixture has no transaction fields")]
    MissingExpectedTransaction,

    #[error("field validation succeeded but should fail")]
    UnexpectedValidationSuccess,
}

/// Transaction fields in the order they are compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxField {
    Data,
    GasLimit,
    GasPrice,
    Nonce,
    R,
    S,
    V,
    To,
    Value,
}

impl TxField {
    /// Name as used in the fixture JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::GasLimit => "gasLimit",
            Self::GasPrice => "gasPrice",
            Self::Nonce => "nonce",
            Self::R => "r",
            Self::S => "s",
            Self::V => "v",
            Self::To => "to",
            Self::Value => "value",
        }
    }
}

impl fmt::Display for TxField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Bytes(Bytes),
    Uint(U256),
    /// `None` is a contract creation.
    Recipient(Option<Address>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => write!(f, "{bytes}"),
            Self::Uint(value) => write!(f, "{value}"),
            Self::Recipient(Some(address)) => write!(f, "{address}"),
            Self::Recipient(None) => f.write_str("none (contract creation)"),
        }
    }
}

/// First field where a decoded transaction differs from the expectation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} mismatch: got {got}, want {want}")]
pub struct FieldMismatch {
    pub field: TxField,
    pub got: FieldValue,
    pub want: FieldValue,
}
