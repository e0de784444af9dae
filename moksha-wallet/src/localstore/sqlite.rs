use async_trait::async_trait;
use moksha_core::proof::Proof;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::Row;

use crate::error::MokshaWalletError;

use super::{LocalStore, StoredProof};

#[derive(Clone, Debug)]
pub struct SqliteLocalStore {
    pool: sqlx::SqlitePool,
}

impl SqliteLocalStore {
    pub async fn with_path(absolute_path: String) -> Result<Self, MokshaWalletError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite://{absolute_path}?mode=rwc"))
            .await?;
        let store = Self { pool };
        store.migrate().await;
        Ok(store)
    }

    pub async fn new_memory() -> Result<Self, MokshaWalletError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.migrate().await;
        Ok(store)
    }
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn migrate(&self) {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .expect("could not run wallet migrations");
    }

    async fn get_proofs(&self) -> Result<Vec<StoredProof>, MokshaWalletError> {
        let rows = sqlx::query("SELECT keyset_id, amount, c, secret, reserved, send_id FROM proofs")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let keyset_id: String = row.get(0);
                let amount: i64 = row.get(1);
                let c: String = row.get(2);
                let secret: String = row.get(3);
                let reserved: bool = row.get(4);
                let send_id: Option<String> = row.get(5);
                StoredProof {
                    proof: Proof::new(
                        amount as u64,
                        secret,
                        moksha_core::dhke::public_key_from_hex(&c),
                        keyset_id,
                    ),
                    reserved,
                    send_id,
                }
            })
            .collect())
    }

    async fn add_proofs(&self, proofs: &[Proof]) -> Result<(), MokshaWalletError> {
        let mut tx = self.pool.begin().await?;
        for proof in proofs {
            insert_proof(&mut tx, proof).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_proofs(&self, secrets: &[String]) -> Result<(), MokshaWalletError> {
        let mut tx = self.pool.begin().await?;
        for secret in secrets {
            sqlx::query("DELETE FROM proofs WHERE secret = ?")
                .bind(secret)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn update_proof_reserved(
        &self,
        secrets: &[String],
        reserved: bool,
        send_id: Option<&str>,
    ) -> Result<(), MokshaWalletError> {
        let mut tx = self.pool.begin().await?;
        for secret in secrets {
            sqlx::query("UPDATE proofs SET reserved = ?, send_id = ? WHERE secret = ?")
                .bind(reserved)
                .bind(send_id)
                .bind(secret)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn secret_used(&self, secret: &str) -> Result<bool, MokshaWalletError> {
        let row = sqlx::query("SELECT 1 FROM proofs WHERE secret = ?")
            .bind(secret)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn replace_proofs(
        &self,
        remove: &[String],
        add: &[Proof],
    ) -> Result<(), MokshaWalletError> {
        let mut tx = self.pool.begin().await?;
        for secret in remove {
            sqlx::query("DELETE FROM proofs WHERE secret = ?")
                .bind(secret)
                .execute(&mut *tx)
                .await?;
        }
        for proof in add {
            insert_proof(&mut tx, proof).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

async fn insert_proof(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    proof: &Proof,
) -> Result<(), MokshaWalletError> {
    sqlx::query(
        "INSERT INTO proofs (keyset_id, amount, c, secret, reserved, send_id) VALUES (?, ?, ?, ?, 0, NULL)",
    )
    .bind(&proof.keyset_id)
    .bind(proof.amount as i64)
    .bind(proof.c.to_string())
    .bind(&proof.secret)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
