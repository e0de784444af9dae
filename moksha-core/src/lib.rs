//! Pure cryptographic and protocol types shared by the mint and the wallet: the BDHKE
//! implementation, denomination algebra, keysets, proofs, tokens, and the HTTP DTOs that
//! connect them. No network or storage I/O lives here.

pub mod amount;
pub mod blind;
pub mod dhke;
pub mod error;
pub mod keyset;
pub mod primitives;
pub mod proof;
pub mod token;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;
