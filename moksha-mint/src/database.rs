//! This module defines the `Database` trait, the mint's persistence collaborator, along with a
//! `sqlx::SqlitePool`-backed implementation. The `secret` primary key on `used_proofs` is what
//! turns a duplicate-spend insert into an atomic rejection instead of a read-then-write race.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use moksha_core::proof::{Proof, Proofs};
use sqlx::sqlite::SqlitePoolOptions;

use crate::{error::MokshaMintError, model::PendingInvoice};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Send + Sync {
    async fn get_used_proofs(&self) -> Result<Proofs, MokshaMintError>;
    async fn secret_used(&self, secret: &str) -> Result<bool, MokshaMintError>;
    async fn add_used_proofs(&self, proofs: &Proofs) -> Result<(), MokshaMintError>;

    async fn get_pending_invoice(
        &self,
        payment_hash: &str,
    ) -> Result<PendingInvoice, MokshaMintError>;
    async fn add_pending_invoice(&self, invoice: &PendingInvoice) -> Result<(), MokshaMintError>;
    async fn delete_pending_invoice(&self, payment_hash: &str) -> Result<(), MokshaMintError>;
}

#[derive(Clone)]
pub struct SqliteDB {
    pool: sqlx::SqlitePool,
}

impl SqliteDB {
    pub async fn new(db_url: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            pool: SqlitePoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await?,
        })
    }

    pub async fn migrate(&self) {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .expect("could not run mint migrations");
    }
}

#[async_trait]
impl Database for SqliteDB {
    async fn get_used_proofs(&self) -> Result<Proofs, MokshaMintError> {
        let rows = sqlx::query!("SELECT amount, secret, c, keyset_id FROM used_proofs")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                Proof::new(
                    row.amount as u64,
                    row.secret,
                    moksha_core::dhke::public_key_from_hex(&row.c),
                    row.keyset_id,
                )
            })
            .collect::<Vec<Proof>>()
            .into())
    }

    async fn secret_used(&self, secret: &str) -> Result<bool, MokshaMintError> {
        let row = sqlx::query!("SELECT 1 as present FROM used_proofs WHERE secret = ?", secret)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn add_used_proofs(&self, proofs: &Proofs) -> Result<(), MokshaMintError> {
        let mut tx = self.pool.begin().await?;
        for proof in proofs.proofs() {
            let c = proof.c.to_string();
            sqlx::query!(
                "INSERT INTO used_proofs (amount, secret, c, keyset_id) VALUES (?, ?, ?, ?)",
                proof.amount as i64,
                proof.secret,
                c,
                proof.keyset_id,
            )
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_pending_invoice(
        &self,
        payment_hash: &str,
    ) -> Result<PendingInvoice, MokshaMintError> {
        let row = sqlx::query!(
            "SELECT payment_hash, amount, payment_request FROM pending_invoices WHERE payment_hash = ?",
            payment_hash
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| MokshaMintError::InvoiceNotFound(payment_hash.to_owned()))?;

        Ok(PendingInvoice::new(
            row.payment_hash,
            row.amount as u64,
            row.payment_request,
        ))
    }

    async fn add_pending_invoice(&self, invoice: &PendingInvoice) -> Result<(), MokshaMintError> {
        sqlx::query!(
            "INSERT INTO pending_invoices (payment_hash, amount, payment_request) VALUES (?, ?, ?)",
            invoice.payment_hash,
            invoice.amount as i64,
            invoice.payment_request,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_pending_invoice(&self, payment_hash: &str) -> Result<(), MokshaMintError> {
        sqlx::query!(
            "DELETE FROM pending_invoices WHERE payment_hash = ?",
            payment_hash
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
