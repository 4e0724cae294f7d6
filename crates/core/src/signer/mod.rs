//! Fork-aware signature schemes.
//!
//! A [`Signer`] is picked from the chain configuration and block height with
//! [`make_signer`]. It decides which signing preimage applies to a
//! transaction's `v` value and recovers the sender through a
//! [`PublicKeyRecovery`] backend.

mod recovery;

pub use recovery::{public_key_to_address, PublicKeyRecovery, Secp256k1Recovery, SECP256K1_ORDER};

#[cfg(test)]
pub(crate) use recovery::SECP256K1_HALF_ORDER;

use crate::config::{ChainConfig, Fork};
use crate::types::transaction::Transaction;
use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_rlp::{Encodable, Header};
use thiserror::Error;
use tracing::trace;

/// Offset added to the recovery id in a legacy `v` value.
const LEGACY_V_OFFSET: u64 = 27;
/// Offset added to `2 * chain_id + recovery id` in a replay-protected `v`.
const PROTECTED_V_OFFSET: u64 = 35;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature r value is zero")]
    ZeroR,

    #[error("signature s value is zero")]
    ZeroS,

    #[error("signature r value is not below the curve order")]
    ROutOfRange,

    #[error("signature s value is not below the curve order")]
    SOutOfRange,

    #[error("invalid v value {v}")]
    InvalidV { v: U256 },

    #[error("v value {v} requires replay protection, which is not active at this height")]
    ForkNotActive { v: U256 },

    #[error("chain id mismatch: expected {expected}, got {got}")]
    ChainIdMismatch { expected: u64, got: U256 },

    #[error("public key recovery failed: {0}")]
    RecoveryFailed(String),
}

/// Signing rule set in force at a given height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signer {
    /// Pre-replay-protection rules: `v` is 27 or 28.
    Base,
    /// Chain id committed in the preimage; legacy `v` remains accepted.
    ReplayProtected { chain_id: u64 },
}

/// Selects the signer for `block_number`. Only the height matters, never the
/// transaction.
pub fn make_signer(config: &ChainConfig, block_number: u64) -> Signer {
    if config.is_active(Fork::Eip155, block_number) {
        Signer::ReplayProtected { chain_id: config.chain_id }
    } else {
        Signer::Base
    }
}

impl Signer {
    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Self::Base => None,
            Self::ReplayProtected { chain_id } => Some(*chain_id),
        }
    }

    /// Hash the transaction's signature commits to under this scheme.
    pub fn signing_hash(&self, tx: &Transaction) -> B256 {
        let mut fields = Vec::new();
        tx.encode_unsigned_fields(&mut fields);
        if let Self::ReplayProtected { chain_id } = self {
            chain_id.encode(&mut fields);
            0u8.encode(&mut fields);
            0u8.encode(&mut fields);
        }

        let mut out = Vec::with_capacity(fields.len() + 9);
        Header { list: true, payload_length: fields.len() }.encode(&mut out);
        out.extend_from_slice(&fields);
        keccak256(&out)
    }

    /// Recovers the sender with the default secp256k1 backend.
    pub fn sender(&self, tx: &Transaction) -> Result<Address, SignatureError> {
        self.sender_with(&Secp256k1Recovery, tx)
    }

    pub fn sender_with<R>(&self, recovery: &R, tx: &Transaction) -> Result<Address, SignatureError>
    where
        R: PublicKeyRecovery + ?Sized,
    {
        let order = recovery.curve_order();
        if tx.r.is_zero() {
            return Err(SignatureError::ZeroR);
        }
        if tx.s.is_zero() {
            return Err(SignatureError::ZeroS);
        }
        if tx.r >= order {
            return Err(SignatureError::ROutOfRange);
        }
        if tx.s >= order {
            return Err(SignatureError::SOutOfRange);
        }

        let (hash, recovery_id) = self.resolve_v(tx)?;
        let public_key = recovery.recover(&hash, tx.r, tx.s, recovery_id)?;
        Ok(public_key_to_address(&public_key))
    }

    /// Maps `v` to the preimage and recovery id it implies under this signer.
    fn resolve_v(&self, tx: &Transaction) -> Result<(B256, u8), SignatureError> {
        let v = tx.v;
        let legacy = U256::from(LEGACY_V_OFFSET);
        if v == legacy || v == legacy + U256::from(1) {
            // legacy form, valid under every signer
            let recovery_id: u8 = if v == legacy { 0 } else { 1 };
            trace!(target: "txcheck::signer", signer = ?self, recovery_id, "legacy signature");
            return Ok((Signer::Base.signing_hash(tx), recovery_id));
        }

        let protected = U256::from(PROTECTED_V_OFFSET);
        if v < protected {
            return Err(SignatureError::InvalidV { v });
        }

        match self {
            Self::Base => Err(SignatureError::ForkNotActive { v }),
            Self::ReplayProtected { chain_id } => {
                let offset = v - protected;
                let got = offset >> 1usize;
                if got != U256::from(*chain_id) {
                    return Err(SignatureError::ChainIdMismatch { expected: *chain_id, got });
                }
                let recovery_id = u8::from(offset.bit(0));
                trace!(target: "txcheck::signer", chain_id, recovery_id, "replay-protected signature");
                Ok((self.signing_hash(tx), recovery_id))
            }
        }
    }
}
