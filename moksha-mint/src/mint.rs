//! This module defines `Mint`, the ledger at the core of the mint: blind-signs outputs, swaps
//! proofs for fresh ones, melts proofs against a Lightning payment, and enforces the
//! single-spend invariant over `Database`.

use std::collections::HashSet;
use std::sync::Arc;

use moksha_core::amount::Amount;
use moksha_core::blind::BlindedMessage;
use moksha_core::dhke::Dhke;
use moksha_core::keyset::{Keysets, MintKeyset};
use moksha_core::proof::Proofs;
use secp256k1::PublicKey;
use tracing::instrument;

use crate::config::MintConfig;
use crate::database::{Database, SqliteDB};
use crate::error::MokshaMintError;
use crate::lightning::{Lightning, LnbitsLightning, StubLightning};
use crate::model::PendingInvoice;

#[derive(Clone)]
pub struct Mint<DB: Database = SqliteDB> {
    pub lightning: Arc<dyn Lightning + Send + Sync>,
    pub keyset: MintKeyset,
    pub db: DB,
    pub dhke: Dhke,
    pub config: MintConfig,
}

impl<DB> Mint<DB>
where
    DB: Database,
{
    pub fn new(lightning: Arc<dyn Lightning + Send + Sync>, db: DB, config: MintConfig) -> Self {
        Self {
            lightning,
            keyset: MintKeyset::new(&config.privatekey.clone(), &config.derivation_path()),
            db,
            dhke: Dhke::new(),
            config,
        }
    }

    pub fn get_keys(&self) -> &std::collections::HashMap<u64, PublicKey> {
        &self.keyset.public_keys
    }

    pub fn get_keysets(&self) -> Keysets {
        Keysets::new(vec![self.keyset.keyset_id.clone()])
    }

    pub fn fee_reserve(&self, amount: u64) -> u64 {
        self.config.lightning_fee.fee_reserve(amount)
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn create_invoice(&self, amount: u64) -> Result<(String, String), MokshaMintError> {
        if amount == 0 {
            return Err(MokshaMintError::InvalidAmount);
        }

        let invoice = self.lightning.create_invoice(amount).await?;
        self.db
            .add_pending_invoice(&PendingInvoice::new(
                invoice.payment_hash.clone(),
                amount,
                invoice.payment_request.clone(),
            ))
            .await?;
        Ok((invoice.payment_request, invoice.payment_hash))
    }

    pub fn create_blinded_signatures(
        &self,
        outputs: &[BlindedMessage],
    ) -> Result<Vec<moksha_core::blind::BlindedSignature>, MokshaMintError> {
        outputs
            .iter()
            .map(|msg| {
                let private_key = self
                    .keyset
                    .private_keys
                    .get(&msg.amount)
                    .ok_or(MokshaMintError::UnknownAmount(msg.amount))?;
                let c_ = self.dhke.step2_bob(msg.b_, private_key)?;
                Ok(moksha_core::blind::BlindedSignature {
                    amount: msg.amount,
                    c_,
                    id: Some(self.keyset.keyset_id.clone()),
                })
            })
            .collect()
    }

    #[instrument(level = "debug", skip(self, outputs), err)]
    pub async fn mint_tokens(
        &self,
        payment_hash: &str,
        outputs: &[BlindedMessage],
    ) -> Result<Vec<moksha_core::blind::BlindedSignature>, MokshaMintError> {
        let invoice = self.db.get_pending_invoice(payment_hash).await?;

        if !self
            .lightning
            .is_invoice_paid(&invoice.payment_request)
            .await?
        {
            return Err(MokshaMintError::InvoiceNotPaidYet);
        }

        let requested: u64 = outputs.iter().map(|o| o.amount).sum();
        if requested != invoice.amount {
            return Err(MokshaMintError::SwapAmountMismatch(format!(
                "invoice amount {} != outputs amount {requested}",
                invoice.amount
            )));
        }

        for msg in outputs {
            if !self.keyset.is_supported(msg.amount) {
                return Err(MokshaMintError::UnknownAmount(msg.amount));
            }
        }

        let signatures = self.create_blinded_signatures(outputs)?;
        self.db.delete_pending_invoice(payment_hash).await?;
        Ok(signatures)
    }

    fn has_duplicate_secrets(proofs: &Proofs) -> bool {
        let mut seen = HashSet::new();
        !proofs.proofs().iter().all(|p| seen.insert(p.secret.clone()))
    }

    async fn check_not_spent(&self, proofs: &Proofs) -> Result<(), MokshaMintError> {
        for proof in proofs.proofs() {
            if self.db.secret_used(&proof.secret).await? {
                return Err(MokshaMintError::AlreadySpent(proof.secret.clone()));
            }
        }
        Ok(())
    }

    fn verify_proofs(&self, proofs: &Proofs) -> Result<(), MokshaMintError> {
        for proof in proofs.proofs() {
            let key = self
                .keyset
                .private_keys
                .get(&proof.amount)
                .ok_or(MokshaMintError::UnknownAmount(proof.amount))?;
            if !self.dhke.verify(*key, proof.c, proof.secret.clone())? {
                return Err(MokshaMintError::InvalidProof(proof.secret.clone()));
            }
        }
        Ok(())
    }

    #[instrument(level = "debug", skip_all, err)]
    pub async fn swap(
        &self,
        proofs: &Proofs,
        requested_amount: u64,
        outputs: &[BlindedMessage],
        fst_count: usize,
    ) -> Result<
        (
            Vec<moksha_core::blind::BlindedSignature>,
            Vec<moksha_core::blind::BlindedSignature>,
        ),
        MokshaMintError,
    > {
        if Self::has_duplicate_secrets(proofs) {
            return Err(MokshaMintError::DuplicateInput);
        }
        self.check_not_spent(proofs).await?;
        self.verify_proofs(proofs)?;

        let total = proofs.total_amount();
        if requested_amount > total {
            return Err(MokshaMintError::SwapAmountMismatch(format!(
                "requested {requested_amount} exceeds input total {total}"
            )));
        }

        let (fst_outputs, snd_outputs) = outputs.split_at(fst_count.min(outputs.len()));
        let fst = self.create_blinded_signatures(fst_outputs)?;
        let snd = self.create_blinded_signatures(snd_outputs)?;

        let fst_total: u64 = fst.iter().map(|s| s.amount).sum();
        let snd_total: u64 = snd.iter().map(|s| s.amount).sum();
        if fst_total != total - requested_amount || snd_total != requested_amount {
            return Err(MokshaMintError::SwapAmountMismatch(format!(
                "split mismatch: fst={fst_total} snd={snd_total} total={total} requested={requested_amount}"
            )));
        }

        self.db.add_used_proofs(proofs).await?;
        Ok((fst, snd))
    }

    #[instrument(level = "debug", skip(self, proofs), err)]
    pub async fn check(
        &self,
        proofs: &Proofs,
    ) -> Result<std::collections::HashMap<usize, bool>, MokshaMintError> {
        let mut result = std::collections::HashMap::new();
        for (i, proof) in proofs.proofs().iter().enumerate() {
            result.insert(i, !self.db.secret_used(&proof.secret).await?);
        }
        Ok(result)
    }

    #[instrument(level = "debug", skip(self, proofs), err)]
    pub async fn melt(
        &self,
        proofs: &Proofs,
        amount: u64,
        invoice: &str,
    ) -> Result<(bool, Option<String>), MokshaMintError> {
        let fee = self.fee_reserve(amount);
        if proofs.total_amount() < amount + fee {
            return Err(MokshaMintError::SwapAmountMismatch(format!(
                "proofs {} do not cover amount {amount} + fee {fee}",
                proofs.total_amount()
            )));
        }

        if Self::has_duplicate_secrets(proofs) {
            return Err(MokshaMintError::DuplicateInput);
        }
        self.check_not_spent(proofs).await?;
        self.verify_proofs(proofs)?;

        let result = self.lightning.pay_invoice(invoice).await;
        match result {
            Err(_) => Ok((false, None)),
            Ok(paid) => {
                self.db.add_used_proofs(proofs).await?;
                Ok((true, Some(paid.payment_hash)))
            }
        }
    }
}

#[derive(Default)]
pub struct MintBuilder {
    lightning: Option<Arc<dyn Lightning + Send + Sync>>,
    config: Option<MintConfig>,
}

impl MintBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lightning(mut self, lightning: Arc<dyn Lightning + Send + Sync>) -> Self {
        self.lightning = Some(lightning);
        self
    }

    pub fn with_config(mut self, config: MintConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub async fn build(self) -> Result<Mint<SqliteDB>, MokshaMintError> {
        let config = self.config.expect("mint config not set");

        let lightning: Arc<dyn Lightning + Send + Sync> = match self.lightning {
            Some(ln) => ln,
            None => match &config.lightning {
                crate::config::LightningType::Stub => Arc::new(StubLightning),
                crate::config::LightningType::Lnbits(settings) => Arc::new(LnbitsLightning::new(
                    settings.admin_key.clone(),
                    settings.url.clone(),
                )),
            },
        };

        let db = SqliteDB::new(&config.database.db_url).await?;
        db.migrate().await;

        Ok(Mint::new(lightning, db, config))
    }
}
