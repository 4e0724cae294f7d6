use super::SignatureError;
use alloy_primitives::{keccak256, Address, B256, B512, U256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

/// Order `n` of the secp256k1 group.
pub const SECP256K1_ORDER: U256 = U256::from_limbs([
    0xBFD2_5E8C_D036_4141,
    0xBAAE_DCE6_AF48_A03B,
    0xFFFF_FFFF_FFFF_FFFE,
    0xFFFF_FFFF_FFFF_FFFF,
]);

/// `n / 2`, the bound for "low S" signatures.
pub(crate) const SECP256K1_HALF_ORDER: U256 = U256::from_limbs([
    0xDFE9_2F46_681B_20A0,
    0x5D57_6E73_57A4_501D,
    0xFFFF_FFFF_FFFF_FFFF,
    0x7FFF_FFFF_FFFF_FFFF,
]);

/// Public-key recovery from a prehashed message and an `(r, s, recovery id)`
/// signature.
pub trait PublicKeyRecovery: Send + Sync {
    /// Upper bound (exclusive) for `r` and `s`.
    fn curve_order(&self) -> U256;

    /// Returns the 64-byte uncompressed public key, without the SEC1 tag.
    fn recover(
        &self,
        prehash: &B256,
        r: U256,
        s: U256,
        recovery_id: u8,
    ) -> Result<B512, SignatureError>;
}

/// secp256k1 recovery backed by `k256`.
///
/// Signatures in the upper half of the curve order are folded into the lower
/// half (with the parity flipped) before recovery, so both forms yield the
/// same key.
#[derive(Clone, Copy, Debug, Default)]
pub struct Secp256k1Recovery;

impl PublicKeyRecovery for Secp256k1Recovery {
    fn curve_order(&self) -> U256 {
        SECP256K1_ORDER
    }

    fn recover(
        &self,
        prehash: &B256,
        r: U256,
        s: U256,
        recovery_id: u8,
    ) -> Result<B512, SignatureError> {
        let (s, recovery_id) = if s > SECP256K1_HALF_ORDER {
            (SECP256K1_ORDER - s, recovery_id ^ 1)
        } else {
            (s, recovery_id)
        };

        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&r.to_be_bytes::<32>());
        compact[32..].copy_from_slice(&s.to_be_bytes::<32>());

        let signature = Signature::from_slice(&compact)
            .map_err(|e| SignatureError::RecoveryFailed(format!("invalid signature format: {e}")))?;
        let recovery_id = RecoveryId::from_byte(recovery_id)
            .ok_or_else(|| SignatureError::RecoveryFailed(format!("invalid recovery id {recovery_id}")))?;

        let vk = VerifyingKey::recover_from_prehash(prehash.as_slice(), &signature, recovery_id)
            .map_err(|e| SignatureError::RecoveryFailed(format!("failed to recover public key: {e}")))?;

        let full_pubkey = vk.to_encoded_point(false);
        // skip 0x04 prefix
        Ok(B512::from_slice(&full_pubkey.as_bytes()[1..]))
    }
}

/// Last 20 bytes of the Keccak-256 hash of the public key.
pub fn public_key_to_address(public_key: &B512) -> Address {
    Address::from_slice(&keccak256(public_key)[12..])
}
