//! This module defines the `MintKeyset` and `Keysets` structs, which manage a mint's per-denomination keys.
//!
//! Each keyset is deterministically derived from a master seed and a derivation path, so that a
//! wallet that re-fetches the public keys gets identical points every time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use bitcoin_hashes::{sha256, Hash};
use itertools::Itertools;
use secp256k1::{PublicKey, Secp256k1, SecretKey};

use crate::error::MokshaCoreError;

/// Number of supported denominations: `2^0 ..= 2^(MAX_ORDER - 1)`.
pub const MAX_ORDER: u64 = 64;

#[derive(Debug, Clone)]
pub struct MintKeyset {
    pub private_keys: HashMap<u64, SecretKey>,
    pub public_keys: HashMap<u64, PublicKey>,
    pub keyset_id: String,
    pub mint_pubkey: PublicKey,
}

impl MintKeyset {
    pub fn new(seed: &str, derivation_path: &str) -> Self {
        let private_keys = derive_keys(seed, derivation_path);
        let public_keys = derive_pubkeys(&private_keys);
        Self {
            private_keys,
            keyset_id: derive_keyset_id(&public_keys),
            public_keys,
            mint_pubkey: derive_pubkey(seed).expect("invalid seed"),
        }
    }

    /// The amounts this keyset can sign for: every power of two it holds a key for.
    pub fn supported_amounts(&self) -> Vec<u64> {
        let mut amounts: Vec<u64> = self.public_keys.keys().copied().collect();
        amounts.sort_unstable();
        amounts
    }

    pub fn is_supported(&self, amount: u64) -> bool {
        self.public_keys.contains_key(&amount)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct Keysets {
    pub keysets: Vec<String>,
}

impl Keysets {
    pub fn new(keysets: Vec<String>) -> Self {
        Self { keysets }
    }

    pub fn current_keyset(
        &self,
        mint_keys: &HashMap<u64, PublicKey>,
    ) -> Result<String, MokshaCoreError> {
        let computed_id = derive_keyset_id(mint_keys);
        if self.keysets.contains(&computed_id) {
            Ok(computed_id)
        } else {
            Err(MokshaCoreError::InvalidKeysetid)
        }
    }
}

/// Derives one secret key per supported denomination from a master key using a derivation path.
pub fn derive_keys(master_key: &str, derivation_path: &str) -> HashMap<u64, SecretKey> {
    let mut keys = HashMap::new();
    for i in 0..MAX_ORDER {
        let hash = sha256::Hash::hash(format!("{master_key}{derivation_path}{i}").as_bytes());
        let key = SecretKey::from_slice(hash.as_byte_array()).expect("32 bytes is a valid scalar");
        keys.insert(2u64.pow(i as u32), key);
    }
    keys
}

pub fn derive_pubkeys(keys: &HashMap<u64, SecretKey>) -> HashMap<u64, PublicKey> {
    let secp = Secp256k1::new();
    keys.iter()
        .map(|(amt, key)| (*amt, key.public_key(&secp)))
        .collect()
}

/// Derives a keyset ID by hashing the sorted, concatenated public keys and taking a 12-char
/// base64 prefix of the digest.
pub fn derive_keyset_id(keys: &HashMap<u64, PublicKey>) -> String {
    use base64::{engine::general_purpose, Engine as _};

    let pubkeys_concat = keys
        .iter()
        .sorted_by(|(amt_a, _), (amt_b, _)| amt_a.cmp(amt_b))
        .map(|(_, pubkey)| pubkey)
        .join("");
    let hashed_pubkeys = sha256::Hash::hash(pubkeys_concat.as_bytes()).to_byte_array();
    general_purpose::STANDARD.encode(hashed_pubkeys)[..12].to_string()
}

pub fn derive_pubkey(seed: &str) -> Result<PublicKey, MokshaCoreError> {
    let hash = sha256::Hash::hash(seed.as_bytes());
    let key = SecretKey::from_slice(hash.as_byte_array())?;
    let secp = Secp256k1::new();
    Ok(key.public_key(&secp))
}
