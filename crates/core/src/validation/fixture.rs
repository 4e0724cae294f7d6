//! JSON transaction test vectors and the pass/fail policy applied to them.

use super::VerifyError;
use crate::config::ChainConfig;
use crate::signer::{make_signer, PublicKeyRecovery, Secp256k1Recovery};
use crate::types::transaction::Transaction;
use alloy_primitives::{Address, Bytes, U256};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("malformed fixture file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("fixture {name}: {source}")]
    Entry {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Transaction fields a vector expects after decoding.
///
/// `to` is the zero address for contract creations.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedTransaction {
    #[serde(deserialize_with = "serde_hex::bytes")]
    pub data: Bytes,
    #[serde(deserialize_with = "serde_hex::quantity_u64")]
    pub gas_limit: u64,
    #[serde(deserialize_with = "serde_hex::quantity_u256")]
    pub gas_price: U256,
    #[serde(deserialize_with = "serde_hex::quantity_u64")]
    pub nonce: u64,
    #[serde(deserialize_with = "serde_hex::quantity_u256")]
    pub value: U256,
    #[serde(deserialize_with = "serde_hex::address_or_zero")]
    pub to: Address,
    #[serde(deserialize_with = "serde_hex::quantity_u256")]
    pub r: U256,
    #[serde(deserialize_with = "serde_hex::quantity_u256")]
    pub s: U256,
    #[serde(deserialize_with = "serde_hex::quantity_u256")]
    pub v: U256,
}

/// One transaction test vector.
///
/// A missing `sender` means the vector must be rejected; a missing
/// `transaction` means the bytes must not decode.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(deserialize_with = "serde_hex::quantity_u64")]
    pub block_number: u64,
    #[serde(deserialize_with = "serde_hex::bytes")]
    pub rlp: Bytes,
    #[serde(default, deserialize_with = "serde_hex::optional_address")]
    pub sender: Option<Address>,
    #[serde(default)]
    pub transaction: Option<ExpectedTransaction>,
}

impl Fixture {
    pub fn run(&self, config: &ChainConfig) -> Result<(), VerifyError> {
        self.run_with(config, &Secp256k1Recovery)
    }

    /// Decodes the vector, derives its sender with the signer in force at
    /// `block_number` and checks the result against the expectations.
    pub fn run_with<R>(&self, config: &ChainConfig, recovery: &R) -> Result<(), VerifyError>
    where
        R: PublicKeyRecovery + ?Sized,
    {
        let tx = match Transaction::decode(&self.rlp) {
            Ok(tx) => tx,
            Err(err) if self.transaction.is_none() => {
                debug!(target: "txcheck::fixture", %err, "decode rejected as expected");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        // a signature that cannot be recovered fails the run whatever the
        // vector expects
        let signer = make_signer(config, self.block_number);
        let got = signer.sender_with(recovery, &tx)?;

        let Some(want) = self.sender else {
            let Some(expected) = &self.transaction else {
                return Ok(());
            };
            return match expected.verify(&tx) {
                Ok(()) => Err(VerifyError::UnexpectedValidationSuccess),
                Err(mismatch) => {
                    debug!(target: "txcheck::fixture", %mismatch, "fields rejected as expected");
                    Ok(())
                }
            };
        };

        if got != want {
            return Err(VerifyError::SenderMismatch { got, want });
        }

        let expected = self
            .transaction
            .as_ref()
            .ok_or(VerifyError::MissingExpectedTransaction)?;
        expected.verify(&tx)?;
        Ok(())
    }
}

/// Result of running one named fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureOutcome {
    pub name: String,
    pub result: Result<(), VerifyError>,
}

impl FixtureOutcome {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Parses a fixture file: an object mapping test names to vectors.
///
/// Entries come back sorted by name.
pub fn load_fixtures(json: &str) -> Result<Vec<(String, Fixture)>, FixtureError> {
    let entries: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
    entries
        .into_iter()
        .map(|(name, value)| match serde_json::from_value::<Fixture>(value) {
            Ok(fixture) => Ok((name, fixture)),
            Err(source) => Err(FixtureError::Entry { name, source }),
        })
        .collect()
}

/// Runs every fixture independently, keeping input order.
pub fn run_all(fixtures: &[(String, Fixture)], config: &ChainConfig) -> Vec<FixtureOutcome> {
    fixtures
        .iter()
        .map(|(name, fixture)| {
            let result = fixture.run(config);
            debug!(target: "txcheck::fixture", name = %name, passed = result.is_ok(), "fixture finished");
            FixtureOutcome { name: name.clone(), result }
        })
        .collect()
}

/// Hex helpers for the fixture JSON. Quantities are `0x`-prefixed hex or
/// decimal; `"0x"` and `""` read as zero.
mod serde_hex {
    use alloy_primitives::{Address, Bytes, U256};
    use serde::{de::Error as _, Deserialize, Deserializer};

    fn strip(s: &str) -> &str {
        s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
    }

    fn is_hex(s: &str) -> bool {
        s.starts_with("0x") || s.starts_with("0X")
    }

    pub(super) fn parse_u64(s: &str) -> Result<u64, String> {
        let digits = strip(s);
        if digits.is_empty() {
            return Ok(0);
        }
        let radix = if is_hex(s) { 16 } else { 10 };
        u64::from_str_radix(digits, radix).map_err(|e| format!("invalid quantity {s:?}: {e}"))
    }

    pub(super) fn parse_u256(s: &str) -> Result<U256, String> {
        let digits = strip(s);
        if digits.is_empty() {
            return Ok(U256::ZERO);
        }
        let radix = if is_hex(s) { 16 } else { 10 };
        U256::from_str_radix(digits, radix).map_err(|e| format!("invalid quantity {s:?}: {e}"))
    }

    fn parse_address(s: &str) -> Result<Address, String> {
        let bytes = hex::decode(strip(s)).map_err(|e| format!("invalid address {s:?}: {e}"))?;
        if bytes.len() != 20 {
            return Err(format!("expected 20 address bytes, got {}", bytes.len()));
        }
        Ok(Address::from_slice(&bytes))
    }

    pub fn bytes<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(strip(&s)).map(Bytes::from).map_err(D::Error::custom)
    }

    pub fn quantity_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_u64(&s).map_err(D::Error::custom)
    }

    pub fn quantity_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_u256(&s).map_err(D::Error::custom)
    }

    pub fn address_or_zero<'de, D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if strip(&s).is_empty() {
            return Ok(Address::ZERO);
        }
        parse_address(&s).map_err(D::Error::custom)
    }

    pub fn optional_address<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) if !strip(&s).is_empty() => parse_address(&s).map(Some).map_err(D::Error::custom),
            _ => Ok(None),
        }
    }
}
