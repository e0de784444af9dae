use std::sync::Arc;

use async_trait::async_trait;
use moksha_core::proof::Proof;
use tokio::sync::Mutex;

use crate::error::MokshaWalletError;

use super::{LocalStore, StoredProof};

/// An in-memory store, useful for tests and ephemeral wallets.
#[derive(Default, Debug, Clone)]
pub struct MemoryLocalStore {
    proofs: Arc<Mutex<Vec<StoredProof>>>,
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn migrate(&self) {}

    async fn get_proofs(&self) -> Result<Vec<StoredProof>, MokshaWalletError> {
        Ok(self.proofs.lock().await.clone())
    }

    async fn add_proofs(&self, proofs: &[Proof]) -> Result<(), MokshaWalletError> {
        let mut guard = self.proofs.lock().await;
        for proof in proofs {
            guard.push(StoredProof::new(proof.clone()));
        }
        Ok(())
    }

    async fn delete_proofs(&self, secrets: &[String]) -> Result<(), MokshaWalletError> {
        self.proofs
            .lock()
            .await
            .retain(|p| !secrets.contains(&p.proof.secret));
        Ok(())
    }

    async fn update_proof_reserved(
        &self,
        secrets: &[String],
        reserved: bool,
        send_id: Option<&str>,
    ) -> Result<(), MokshaWalletError> {
        let mut guard = self.proofs.lock().await;
        for stored in guard.iter_mut() {
            if secrets.contains(&stored.proof.secret) {
                stored.reserved = reserved;
                stored.send_id = send_id.map(str::to_owned);
            }
        }
        Ok(())
    }

    async fn secret_used(&self, secret: &str) -> Result<bool, MokshaWalletError> {
        Ok(self.proofs.lock().await.iter().any(|p| p.proof.secret == secret))
    }

    async fn replace_proofs(
        &self,
        remove: &[String],
        add: &[Proof],
    ) -> Result<(), MokshaWalletError> {
        let mut guard = self.proofs.lock().await;
        guard.retain(|p| !remove.contains(&p.proof.secret));
        for proof in add {
            guard.push(StoredProof::new(proof.clone()));
        }
        Ok(())
    }
}
