//! Signature domains, signing hashes and sender recovery.

use core::fmt::Debug;

use alloy_primitives::{Address, ChainId, FixedBytes, Signature, B256, U256};
use auto_impl::auto_impl;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::{
    check_transaction_supported,
    constants::{
        domain::DOMAIN_TRANSACTION_SSZ, limits::SECP256K1_SIGNATURE_SIZE, tx_type::SSZ_TX_TYPE,
        SECP256K1_ORDER,
    },
    legacy,
    ssz::{self, field, Schema, SszError},
    SignatureError, SignedTransaction, SszObject, TransactionError, TransactionPayload, Value,
};

/// `ExecutionDomainData` schema.
pub static EXECUTION_DOMAIN_DATA_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::Container(vec![
        field("domain_type", Schema::ByteVector(4)),
        field("chain_id", Schema::UINT256),
    ])
});

/// `ExecutionSigningData` schema.
pub static EXECUTION_SIGNING_DATA_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::Container(vec![field("object_root", Schema::BYTES32), field("domain", Schema::BYTES32)])
});

/// Computes the signature domain of `domain_type` on `chain_id`.
pub fn compute_domain(domain_type: [u8; 4], chain_id: ChainId) -> Result<B256, SszError> {
    let value = Value::Container(vec![Value::bytes(domain_type.to_vec()), Value::uint(chain_id)]);
    ssz::hash_tree_root(&EXECUTION_DOMAIN_DATA_SCHEMA, &value)
}

/// Computes the root signed over `object_root` in `domain`.
pub fn compute_signing_root(object_root: B256, domain: B256) -> Result<B256, SszError> {
    let value = Value::Container(vec![Value::fixed(object_root), Value::fixed(domain)]);
    ssz::hash_tree_root(&EXECUTION_SIGNING_DATA_SCHEMA, &value)
}

/// Signing hash of a native SSZ transaction payload.
pub fn compute_ssz_sig_hash(payload: &TransactionPayload, chain_id: ChainId) -> Result<B256, TransactionError> {
    let domain = compute_domain(DOMAIN_TRANSACTION_SSZ, chain_id)?;
    Ok(compute_signing_root(payload.hash_tree_root()?, domain)?)
}

/// Hash that `tx` is signed over.
///
/// Native SSZ transactions sign the root of their payload in the transaction domain. Every
/// other transaction signs the hash its legacy encoding would have been signed over, so
/// converted transactions keep the hash they were originally signed with.
pub fn compute_sig_hash(tx: &SignedTransaction, chain_id: ChainId) -> Result<B256, TransactionError> {
    match tx.tx_type() {
        Some(SSZ_TX_TYPE) => compute_ssz_sig_hash(&tx.payload, chain_id),
        _ => Ok(legacy::legacy_hashes(&legacy::to_legacy(tx, chain_id)?).0),
    }
}

/// Identifying hash of `tx`.
///
/// For native SSZ transactions this is the root of the signed transaction. Other transactions
/// keep the hash of their legacy encoding.
pub fn compute_tx_hash(tx: &SignedTransaction, chain_id: ChainId) -> Result<B256, TransactionError> {
    match tx.tx_type() {
        Some(SSZ_TX_TYPE) => Ok(tx.hash_tree_root()?),
        _ => Ok(legacy::legacy_hashes(&legacy::to_legacy(tx, chain_id)?).1),
    }
}

/// Packs a signature as `r || s || y_parity`.
pub fn pack_signature(signature: &Signature) -> FixedBytes<SECP256K1_SIGNATURE_SIZE> {
    let mut packed = [0u8; SECP256K1_SIGNATURE_SIZE];
    packed[..32].copy_from_slice(&signature.r().to_be_bytes::<32>());
    packed[32..64].copy_from_slice(&signature.s().to_be_bytes::<32>());
    packed[64] = u8::from(signature.v());
    FixedBytes(packed)
}

/// Parses a packed `r || s || y_parity` signature, requiring `0 < r, s < n` and a parity of
/// 0 or 1.
pub fn validate_signature(packed: &[u8]) -> Result<Signature, SignatureError> {
    if packed.len() != SECP256K1_SIGNATURE_SIZE {
        return Err(SignatureError::InvalidLength(packed.len()));
    }
    let order = U256::from_be_bytes(SECP256K1_ORDER);
    let r = U256::from_be_slice(&packed[..32]);
    let s = U256::from_be_slice(&packed[32..64]);
    if r.is_zero() || r >= order {
        return Err(SignatureError::InvalidR);
    }
    if s.is_zero() || s >= order {
        return Err(SignatureError::InvalidS);
    }
    let y_parity = match packed[64] {
        0 => false,
        1 => true,
        other => return Err(SignatureError::InvalidParity(other)),
    };
    Ok(Signature::new(r, s, y_parity))
}

/// Recovers secp256k1 public keys from prehashed signatures.
///
/// The default implementation is [`K256Recover`]. Other backends, such as a native secp256k1
/// binding or a test double, can be plugged in wherever a recoverer is taken.
#[auto_impl(&, Box, Arc)]
pub trait EcdsaRecover: Debug + Send + Sync {
    /// Recovers the uncompressed SEC1 public key (`0x04 || x || y`) that produced
    /// `signature` (`r || s`) over `digest`.
    fn recover_public_key(
        &self,
        digest: &B256,
        signature: &[u8; 64],
        recovery_id: u8,
    ) -> Result<[u8; 65], SignatureError>;
}

/// [`EcdsaRecover`] backed by the pure Rust `k256` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct K256Recover;

impl EcdsaRecover for K256Recover {
    fn recover_public_key(
        &self,
        digest: &B256,
        signature: &[u8; 64],
        recovery_id: u8,
    ) -> Result<[u8; 65], SignatureError> {
        use k256::ecdsa::{RecoveryId, Signature as K256Signature, VerifyingKey};

        let mut signature =
            K256Signature::from_slice(signature).map_err(|_| SignatureError::RecoveryFailed)?;
        let mut recovery_id = recovery_id;
        // k256 only verifies low-s signatures; pre-Homestead legacy transactions may be high-s.
        if let Some(normalized) = signature.normalize_s() {
            signature = normalized;
            recovery_id ^= 1;
        }
        let recovery_id = RecoveryId::from_byte(recovery_id).ok_or(SignatureError::RecoveryFailed)?;
        let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
            .map_err(|_| SignatureError::RecoveryFailed)?;
        let point = key.to_encoded_point(false);
        point.as_bytes().try_into().map_err(|_| SignatureError::RecoveryFailed)
    }
}

/// Recovers the address that produced the packed `signature` over `digest`.
pub fn recover_sender<R: EcdsaRecover + ?Sized>(
    recover: &R,
    digest: &B256,
    signature: &[u8],
) -> Result<Address, SignatureError> {
    let parsed = validate_signature(signature)?;
    let mut rs = [0u8; 64];
    rs.copy_from_slice(&signature[..64]);
    let public_key = recover.recover_public_key(digest, &rs, u8::from(parsed.v()))?;
    Ok(Address::from_raw_public_key(&public_key[1..]))
}

/// Fully validates a transaction: supported field combination, well formed signature and a
/// signature that recovers to `from`. Returns the sender.
pub fn validate_transaction<R: EcdsaRecover + ?Sized>(
    recover: &R,
    tx: &SignedTransaction,
    chain_id: ChainId,
) -> Result<Address, TransactionError> {
    check_transaction_supported(tx)?;
    let sig_hash = compute_sig_hash(tx, chain_id)?;
    let recovered = recover_sender(recover, &sig_hash, tx.signature.ecdsa_signature.as_slice())?;
    if recovered != tx.signature.from {
        return Err(TransactionError::SignatureMismatch { recovered, claimed: tx.signature.from });
    }
    debug!(target: "ssz_tx::signing", %sig_hash, sender = %recovered, tx_type = ?tx.tx_type(), "Validated transaction");
    Ok(recovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sign_prehash, TEST_SIGNER};
    use alloy_primitives::hex;

    #[test]
    fn test_domain_layout() {
        // chain id 1: root of (domain_type padded to a chunk, chain id little endian)
        let mut domain_chunk = B256::ZERO;
        domain_chunk[..4].copy_from_slice(&DOMAIN_TRANSACTION_SSZ);
        let mut chain_chunk = B256::ZERO;
        chain_chunk[0] = 1;
        assert_eq!(
            compute_domain(DOMAIN_TRANSACTION_SSZ, 1).unwrap(),
            ssz::hash_pair(&domain_chunk, &chain_chunk)
        );
        assert_ne!(
            compute_domain(DOMAIN_TRANSACTION_SSZ, 1).unwrap(),
            compute_domain(DOMAIN_TRANSACTION_SSZ, 2).unwrap()
        );
    }

    #[test]
    fn test_pack_roundtrip() {
        let signature = Signature::new(U256::from(5), U256::from(7), true);
        let packed = pack_signature(&signature);
        assert_eq!(packed[31], 5);
        assert_eq!(packed[63], 7);
        assert_eq!(packed[64], 1);
        assert_eq!(validate_signature(packed.as_slice()), Ok(signature));
    }

    #[test]
    fn test_recover_matches_signer() {
        let digest = B256::repeat_byte(0x42);
        let signature = sign_prehash(&TEST_SIGNER, &digest);
        let packed = pack_signature(&signature);
        let sender = recover_sender(&K256Recover, &digest, packed.as_slice()).unwrap();
        assert_eq!(sender, crate::test_utils::signer_address(&TEST_SIGNER));
    }

    #[test]
    fn test_recover_rejects_parity_byte() {
        let mut packed = [1u8; 65];
        packed[64] = 27;
        assert_eq!(
            recover_sender(&K256Recover, &B256::ZERO, &packed),
            Err(SignatureError::InvalidParity(27))
        );
        assert_eq!(
            recover_sender(&K256Recover, &B256::ZERO, &hex!("00")),
            Err(SignatureError::InvalidLength(1))
        );
    }
}
