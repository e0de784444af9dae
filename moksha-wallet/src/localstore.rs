//! The wallet's persistence collaborator: a flat table of proofs currently held, each tagged
//! with whether it has been set aside ("reserved") for an in-flight send.

use async_trait::async_trait;
use moksha_core::proof::Proof;

use crate::error::MokshaWalletError;

#[cfg(not(target_arch = "wasm32"))]
pub mod memory;
#[cfg(not(target_arch = "wasm32"))]
pub mod sqlite;

/// A proof as held in the wallet's store, with send-tracking metadata layered on top of the
/// wire-format `Proof`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProof {
    pub proof: Proof,
    pub reserved: bool,
    pub send_id: Option<String>,
}

impl StoredProof {
    pub fn new(proof: Proof) -> Self {
        Self {
            proof,
            reserved: false,
            send_id: None,
        }
    }
}

#[async_trait]
pub trait LocalStore: Send + Sync {
    /// All proofs currently stored, including reserved ones.
    async fn get_proofs(&self) -> Result<Vec<StoredProof>, MokshaWalletError>;

    async fn add_proofs(&self, proofs: &[Proof]) -> Result<(), MokshaWalletError>;

    async fn delete_proofs(&self, secrets: &[String]) -> Result<(), MokshaWalletError>;

    async fn update_proof_reserved(
        &self,
        secrets: &[String],
        reserved: bool,
        send_id: Option<&str>,
    ) -> Result<(), MokshaWalletError>;

    async fn secret_used(&self, secret: &str) -> Result<bool, MokshaWalletError>;

    /// Atomically swaps `remove` out of the store for `add` — the transaction boundary that
    /// keeps a split or redeem from ever observing a half-consumed state.
    async fn replace_proofs(
        &self,
        remove: &[String],
        add: &[Proof],
    ) -> Result<(), MokshaWalletError>;

    async fn migrate(&self);
}
