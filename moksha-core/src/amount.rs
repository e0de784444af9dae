//! This module defines the `Amount` and `SplitAmount` structs, which are used for representing and splitting amounts in Cashu.
//!
//! The `Amount` struct represents an amount in satoshis, with a single `u64` field for the amount. The struct provides a `split` method that decomposes the amount into a `SplitAmount`, the ascending powers of two whose sum equals the original amount.
//!
//! The `SplitAmount` struct represents a split amount and provides a `create_secrets` method that generates one fresh random secret per denomination.

use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount(pub u64);

impl Amount {
    pub fn split(&self) -> SplitAmount {
        split_amount(self.0).into()
    }
}

impl From<u64> for Amount {
    fn from(amount: u64) -> Self {
        Self(amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAmount(Vec<u64>);

impl From<Vec<u64>> for SplitAmount {
    fn from(from: Vec<u64>) -> Self {
        Self(from)
    }
}

impl SplitAmount {
    pub fn create_secrets(&self) -> Vec<String> {
        (0..self.0.len())
            .map(|_| generate_random_secret())
            .collect::<Vec<String>>()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }
}

impl IntoIterator for SplitAmount {
    type Item = u64;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Splits a decimal amount into a vector of distinct powers of two, ascending
/// by bit position. Empty for `amount == 0`.
pub fn split_amount(amount: u64) -> Vec<u64> {
    (0..u64::BITS)
        .filter(|i| amount & (1 << i) != 0)
        .map(|i| 1u64 << i)
        .collect()
}

/// 128 bits of randomness, URL-safe base64 encoded, no padding.
pub fn generate_random_secret() -> String {
    let mut rng = rand::thread_rng();
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
