use alloy_primitives::{Address, ChainId, Signature, B256, U256};
use k256::ecdsa::SigningKey;
use once_cell::sync::Lazy;

use crate::{
    compute_ssz_sig_hash, constants::tx_type::SSZ_TX_TYPE, pack_signature, SignedTransaction,
    TransactionPayload, TransactionSignature,
};

/// Chain id used by the test fixtures.
pub const TEST_CHAIN_ID: ChainId = 1;

/// Key that signs every test fixture.
pub static TEST_SIGNER: Lazy<SigningKey> =
    Lazy::new(|| SigningKey::from_slice(&[0x11; 32]).expect("valid secret key"));

/// Signs `digest` with `key`, returning a low-s signature.
pub fn sign_prehash(key: &SigningKey, digest: &B256) -> Signature {
    let (signature, recovery_id) =
        key.sign_prehash_recoverable(digest.as_slice()).expect("signing a 32 byte digest");
    let (r, s) = signature.split_bytes();
    Signature::new(U256::from_be_slice(&r), U256::from_be_slice(&s), recovery_id.is_y_odd())
}

/// Address controlled by `key`.
pub fn signer_address(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    Address::from_raw_public_key(&point.as_bytes()[1..])
}

/// Signs `payload` as a native SSZ transaction with [`TEST_SIGNER`].
pub fn sign_native(payload: TransactionPayload, chain_id: ChainId) -> SignedTransaction {
    let sig_hash = compute_ssz_sig_hash(&payload, chain_id).unwrap();
    let signature = sign_prehash(&TEST_SIGNER, &sig_hash);
    SignedTransaction {
        payload,
        signature: TransactionSignature {
            from: signer_address(&TEST_SIGNER),
            ecdsa_signature: pack_signature(&signature),
            tx_type: Some(SSZ_TX_TYPE),
        },
    }
}
