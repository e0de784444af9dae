//! The wallet engine: turns the mint's HTTP API and a local proof store into mint/send/receive/
//! melt operations over the BDHKE blind-signature scheme.

use std::collections::HashMap;

use base64::{engine::general_purpose, Engine as _};
use moksha_core::amount::Amount;
use moksha_core::blind::BlindedMessage;
use moksha_core::dhke::Dhke;
use moksha_core::keyset::derive_keyset_id;
use moksha_core::primitives::PaymentRequest;
use moksha_core::proof::Proof;
use moksha_core::token::TokenV3;
use secp256k1::PublicKey;
use url::Url;
use uuid::Uuid;

use crate::client::CashuClient;
use crate::error::MokshaWalletError;
use crate::localstore::LocalStore;
use crate::secret::{generate_deterministic_secrets, generate_unique_random_secrets};

const CASHU_TOKEN_PREFIX: &str = "cashuA";

pub struct Wallet<L: LocalStore, C: CashuClient> {
    client: C,
    localstore: L,
    dhke: Dhke,
    mint_url: Url,
    keys: HashMap<u64, PublicKey>,
    keyset_id: String,
}

impl<L: LocalStore, C: CashuClient> Wallet<L, C> {
    /// Constructs a wallet that has not yet loaded the mint's keyset. Call [`Wallet::load_mint`]
    /// before any other operation.
    pub fn new(client: C, localstore: L, mint_url: Url) -> Self {
        Self {
            client,
            localstore,
            dhke: Dhke::new(),
            mint_url,
            keys: HashMap::new(),
            keyset_id: String::new(),
        }
    }

    /// Fetches the mint's active keyset and derives its id the same way the mint does, so
    /// every `BlindedMessage` this wallet builds names a keyset the mint actually recognizes.
    pub async fn load_mint(&mut self) -> Result<(), MokshaWalletError> {
        let keys = self.client.get_keys(&self.mint_url).await?;
        if keys.is_empty() {
            return Err(MokshaWalletError::TransportError(
                "mint returned an empty keyset".to_owned(),
            ));
        }
        self.keyset_id = derive_keyset_id(&keys);
        self.keys = keys;
        Ok(())
    }

    pub async fn request_mint(&self, amount: u64) -> Result<PaymentRequest, MokshaWalletError> {
        self.client.request_mint(&self.mint_url, amount).await
    }

    /// Completes a mint after the returned invoice has been paid: builds one blinded message per
    /// denomination, submits them, unblinds the signatures, and persists the resulting proofs.
    pub async fn mint(
        &mut self,
        amount: u64,
        payment_hash: &str,
    ) -> Result<Vec<Proof>, MokshaWalletError> {
        let split = Amount(amount).split();
        let secrets = generate_unique_random_secrets(&self.localstore, split.len()).await?;

        let mut blinding_factors = Vec::with_capacity(split.len());
        let mut outputs = Vec::with_capacity(split.len());
        for (amt, secret) in split.as_slice().iter().zip(secrets.iter()) {
            let (b_, r) = self.dhke.step1_alice(secret.clone(), None)?;
            blinding_factors.push(r);
            outputs.push(BlindedMessage {
                amount: *amt,
                b_,
                id: self.keyset_id.clone(),
            });
        }

        let response = self
            .client
            .post_mint(&self.mint_url, payment_hash, outputs)
            .await?;

        let proofs = self.unblind_signatures(&response.promises, &secrets, &blinding_factors)?;
        self.localstore.add_proofs(&proofs).await?;
        Ok(proofs)
    }

    /// Splits `proofs` into two new proof sets: one worth `amount` and one worth the remainder.
    /// When `send_secret` is given, the `amount`-valued half gets deterministic secrets so a
    /// receiver who knows `send_secret` can reconstruct them without any interaction.
    pub async fn split(
        &mut self,
        proofs: &[Proof],
        amount: u64,
        send_secret: Option<&str>,
    ) -> Result<(Vec<Proof>, Vec<Proof>), MokshaWalletError> {
        if amount == 0 {
            return Err(MokshaWalletError::AmountError(
                "split amount must be greater than zero".to_owned(),
            ));
        }
        let total: u64 = proofs.iter().map(|p| p.amount).sum();
        if amount > total {
            return Err(MokshaWalletError::NotEnoughTokens);
        }
        let remainder = total - amount;

        // The mint partitions `output_data` by `split_amount(total - amount).len()`, taking
        // that prefix as the kept remainder and the suffix as the requested (send) amount, then
        // rejects unless the prefix sums to the remainder and the suffix to the requested
        // amount. Outputs must be built in that same order: remainder first, send second.
        let remainder_split = Amount(remainder).split();
        let send_split = Amount(amount).split();

        let remainder_secrets =
            generate_unique_random_secrets(&self.localstore, remainder_split.len()).await?;
        let send_secrets = match send_secret {
            Some(base) => generate_deterministic_secrets(base, send_split.len()),
            None => generate_unique_random_secrets(&self.localstore, send_split.len()).await?,
        };

        let mut blinding_factors = Vec::with_capacity(remainder_split.len() + send_split.len());
        let mut outputs = Vec::with_capacity(remainder_split.len() + send_split.len());
        for (amt, secret) in remainder_split
            .as_slice()
            .iter()
            .zip(remainder_secrets.iter())
            .chain(send_split.as_slice().iter().zip(send_secrets.iter()))
        {
            let (b_, r) = self.dhke.step1_alice(secret.clone(), None)?;
            blinding_factors.push(r);
            outputs.push(BlindedMessage {
                amount: *amt,
                b_,
                id: self.keyset_id.clone(),
            });
        }

        let input_proofs: moksha_core::proof::Proofs = proofs.to_vec().into();
        let response = self
            .client
            .post_split(&self.mint_url, input_proofs, amount, outputs)
            .await?;

        let all_secrets: Vec<String> = remainder_secrets
            .iter()
            .chain(send_secrets.iter())
            .cloned()
            .collect();
        let all_signatures: Vec<_> = response
            .fst
            .iter()
            .chain(response.snd.iter())
            .cloned()
            .collect();
        let all_proofs =
            self.unblind_signatures(&all_signatures, &all_secrets, &blinding_factors)?;

        let (remainder_proofs, send_proofs) = all_proofs.split_at(remainder_split.len());
        let remainder_proofs = remainder_proofs.to_vec();
        let send_proofs = send_proofs.to_vec();

        let consumed: Vec<String> = proofs.iter().map(|p| p.secret.clone()).collect();
        let mut kept = remainder_proofs.clone();
        kept.extend(send_proofs.clone());
        self.localstore.replace_proofs(&consumed, &kept).await?;

        Ok((send_proofs, remainder_proofs))
    }

    /// Selects unreserved stored proofs covering at least `amount` and splits them so exactly
    /// `amount` can be handed to a recipient.
    pub async fn split_to_send(
        &mut self,
        amount: u64,
        send_secret: Option<&str>,
    ) -> Result<(Vec<Proof>, Vec<Proof>), MokshaWalletError> {
        let stored = self.localstore.get_proofs().await?;
        let available: Vec<Proof> = stored
            .into_iter()
            .filter(|p| !p.reserved)
            .map(|p| p.proof)
            .collect();

        let selectable: moksha_core::proof::Proofs = available.clone().into();
        if selectable.total_amount() < amount {
            return Err(MokshaWalletError::NotEnoughTokens);
        }
        let selected = selectable.proofs_for_amount(amount)?;
        self.split(&selected.proofs(), amount, send_secret).await
    }

    /// Marks `proofs` as reserved (or releases them), tagging them with a fresh send id.
    pub async fn set_reserved(
        &mut self,
        proofs: &[Proof],
        reserved: bool,
    ) -> Result<String, MokshaWalletError> {
        let send_id = Uuid::new_v4().to_string();
        let secrets: Vec<String> = proofs.iter().map(|p| p.secret.clone()).collect();
        self.localstore
            .update_proof_reserved(&secrets, reserved, Some(&send_id))
            .await?;
        Ok(send_id)
    }

    /// Redeems a received token. When `send_secret` is given, the proofs were built
    /// deterministically by the sender and this wallet regenerates the same secrets before
    /// asking the mint to swap them for freshly blinded ones it controls.
    pub async fn redeem(
        &mut self,
        mut proofs: Vec<Proof>,
        send_secret: Option<&str>,
    ) -> Result<Vec<Proof>, MokshaWalletError> {
        if let Some(base) = send_secret {
            let secrets = generate_deterministic_secrets(base, proofs.len());
            for (proof, secret) in proofs.iter_mut().zip(secrets.into_iter()) {
                proof.secret = secret;
            }
        }
        let total: u64 = proofs.iter().map(|p| p.amount).sum();
        let (fst, snd) = self.split(&proofs, total, None).await?;
        Ok(fst.into_iter().chain(snd).collect())
    }

    /// Pays a Lightning invoice with `proofs`. Leaves the local store untouched on failure so
    /// the caller can retry with the same proofs.
    pub async fn melt(
        &mut self,
        proofs: &[Proof],
        amount: u64,
        invoice: &str,
    ) -> Result<bool, MokshaWalletError> {
        let input_proofs: moksha_core::proof::Proofs = proofs.to_vec().into();
        let response = self
            .client
            .post_melt(&self.mint_url, input_proofs, amount, invoice)
            .await?;

        if !response.paid {
            return Err(MokshaWalletError::PaymentFailed);
        }

        let secrets: Vec<String> = proofs.iter().map(|p| p.secret.clone()).collect();
        self.localstore.delete_proofs(&secrets).await?;
        Ok(true)
    }

    /// Asks the mint which of `proofs` are still spendable, dropping the rest from the store.
    pub async fn invalidate(&mut self, proofs: &[Proof]) -> Result<Vec<Proof>, MokshaWalletError> {
        let input_proofs: moksha_core::proof::Proofs = proofs.to_vec().into();
        let response = self.client.post_check(&self.mint_url, input_proofs).await?;

        let mut spent_secrets = Vec::new();
        let mut removed = Vec::new();
        for (idx, proof) in proofs.iter().enumerate() {
            if response.0.get(&idx.to_string()) == Some(&false) {
                spent_secrets.push(proof.secret.clone());
                removed.push(proof.clone());
            }
        }
        self.localstore.delete_proofs(&spent_secrets).await?;
        Ok(removed)
    }

    pub async fn all_proofs(&self) -> Result<Vec<Proof>, MokshaWalletError> {
        let stored = self.localstore.get_proofs().await?;
        Ok(stored.into_iter().map(|p| p.proof).collect())
    }

    pub async fn balance(&self) -> Result<u64, MokshaWalletError> {
        let stored = self.localstore.get_proofs().await?;
        Ok(stored.iter().map(|p| p.proof.amount).sum())
    }

    pub async fn available_balance(&self) -> Result<u64, MokshaWalletError> {
        let stored = self.localstore.get_proofs().await?;
        Ok(stored
            .iter()
            .filter(|p| !p.reserved)
            .map(|p| p.proof.amount)
            .sum())
    }

    /// Encodes `proofs` as a `cashuA...` token string. When `hide_secret` is set, each proof's
    /// `secret` is stripped from the wire JSON before encoding — for a deterministic send, the
    /// recipient reconstructs the same secrets from the shared `send_secret` base and never
    /// needs them on the wire.
    pub fn serialize_token(
        &self,
        proofs: &[Proof],
        hide_secret: bool,
    ) -> Result<String, MokshaWalletError> {
        let proofs_core: moksha_core::proof::Proofs = proofs.to_vec().into();
        let token = TokenV3::new(self.mint_url.clone(), proofs_core);

        if !hide_secret {
            return Ok(token.serialize()?);
        }

        let mut value = serde_json::to_value(&token)?;
        if let Some(tokens) = value.get_mut("token").and_then(|t| t.as_array_mut()) {
            for entry in tokens {
                if let Some(proofs) = entry.get_mut("proofs").and_then(|p| p.as_array_mut()) {
                    for proof in proofs {
                        if let Some(obj) = proof.as_object_mut() {
                            obj.remove("secret");
                        }
                    }
                }
            }
        }
        let json = serde_json::to_string(&value)?;
        Ok(format!(
            "{CASHU_TOKEN_PREFIX}{}",
            general_purpose::URL_SAFE.encode(json)
        ))
    }

    /// Decodes a `cashuA...` token string. Tolerates proofs with `secret` omitted (a token
    /// serialized with `hide_secret = true`); `redeem` fills the real secret back in for the
    /// deterministic-send case, so an empty placeholder here is never actually used.
    pub fn deserialize_token(token: &str) -> Result<Vec<Proof>, MokshaWalletError> {
        let stripped = token
            .strip_prefix(CASHU_TOKEN_PREFIX)
            .ok_or_else(|| MokshaWalletError::DecodeToken("missing cashuA prefix".to_owned()))?;
        let decoded = general_purpose::URL_SAFE
            .decode(stripped)
            .or_else(|_| general_purpose::URL_SAFE_NO_PAD.decode(stripped))
            .map_err(|e| MokshaWalletError::DecodeToken(e.to_string()))?;

        let mut value: serde_json::Value = serde_json::from_slice(&decoded)?;
        if let Some(tokens) = value.get_mut("token").and_then(|t| t.as_array_mut()) {
            for entry in tokens {
                if let Some(proofs) = entry.get_mut("proofs").and_then(|p| p.as_array_mut()) {
                    for proof in proofs {
                        if let Some(obj) = proof.as_object_mut() {
                            obj.entry("secret")
                                .or_insert_with(|| serde_json::Value::String(String::new()));
                        }
                    }
                }
            }
        }

        let token: TokenV3 = serde_json::from_value(value)?;
        Ok(token.proofs().proofs())
    }

    fn unblind_signatures(
        &self,
        signatures: &[moksha_core::blind::BlindedSignature],
        secrets: &[String],
        blinding_factors: &[secp256k1::SecretKey],
    ) -> Result<Vec<Proof>, MokshaWalletError> {
        signatures
            .iter()
            .zip(secrets.iter())
            .zip(blinding_factors.iter())
            .map(|((sig, secret), r)| {
                let mint_pubkey = *self
                    .keys
                    .get(&sig.amount)
                    .ok_or(MokshaWalletError::InvalidProofs)?;
                let c = self.dhke.step3_alice(sig.c_, *r, mint_pubkey)?;
                Ok(Proof::new(
                    sig.amount,
                    secret.clone(),
                    c,
                    self.keyset_id.clone(),
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockCashuClient;
    use crate::localstore::memory::MemoryLocalStore;
    use moksha_core::blind::BlindedSignature;
    use moksha_core::primitives::{CheckResponse, PostMeltResponse, PostMintResponse};
    use std::collections::HashMap as Map;

    fn mint_pair() -> (secp256k1::SecretKey, PublicKey) {
        let key = secp256k1::SecretKey::new(&mut rand::thread_rng());
        let secp = secp256k1::Secp256k1::new();
        (key, key.public_key(&secp))
    }

    #[tokio::test]
    async fn test_mint_unblinds_and_stores_proofs() -> anyhow::Result<()> {
        let dhke = Dhke::new();
        let (priv8, pub8) = mint_pair();
        let mut keys = Map::new();
        keys.insert(8u64, pub8);

        let mut mock = MockCashuClient::new();
        mock.expect_get_keys().returning(move |_| Ok(keys.clone()));
        mock.expect_post_mint().returning(move |_, _, outputs| {
            let sig = dhke.step2_bob(outputs[0].b_, &priv8).unwrap();
            Ok(PostMintResponse {
                promises: vec![BlindedSignature {
                    amount: 8,
                    c_: sig,
                    id: Some("keyset".to_owned()),
                }],
            })
        });

        let mut wallet = Wallet::new(
            mock,
            MemoryLocalStore::default(),
            Url::parse("https://mint.example.com")?,
        );
        wallet.load_mint().await?;
        let proofs = wallet.mint(8, "hash").await?;
        assert_eq!(proofs.len(), 1);
        assert_eq!(proofs[0].amount, 8);
        assert_eq!(wallet.balance().await?, 8);
        Ok(())
    }

    #[tokio::test]
    async fn test_melt_removes_proofs_only_on_success() -> anyhow::Result<()> {
        let (_priv, pub8) = mint_pair();
        let mut keys = Map::new();
        keys.insert(8u64, pub8);

        let mut mock = MockCashuClient::new();
        mock.expect_get_keys().returning(move |_| Ok(keys.clone()));
        mock.expect_post_melt()
            .returning(|_, _, _, _| Ok(PostMeltResponse { paid: false, preimage: None }));

        let mut wallet = Wallet::new(
            mock,
            MemoryLocalStore::default(),
            Url::parse("https://mint.example.com")?,
        );
        wallet.load_mint().await?;

        let dhke = Dhke::new();
        let y = Dhke::hash_to_curve("melt-secret".as_bytes());
        let key = secp256k1::SecretKey::from_slice(&[3u8; 32])?;
        let c = dhke.step2_bob(y, &key)?;
        let proof = Proof::new(8, "melt-secret".to_owned(), c, "keyset".to_owned());
        wallet.localstore.add_proofs(&[proof.clone()]).await?;

        let result = wallet.melt(&[proof], 8, "lnbc1...").await;
        assert!(result.is_err());
        assert_eq!(wallet.balance().await?, 8);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalidate_drops_only_spent_proofs() -> anyhow::Result<()> {
        let (_priv, pub8) = mint_pair();
        let mut keys = Map::new();
        keys.insert(8u64, pub8);

        let mut mock = MockCashuClient::new();
        mock.expect_get_keys().returning(move |_| Ok(keys.clone()));
        mock.expect_post_check().returning(|_, _| {
            let mut spendable = Map::new();
            spendable.insert("0".to_owned(), false);
            Ok(CheckResponse(spendable))
        });

        let mut wallet = Wallet::new(
            mock,
            MemoryLocalStore::default(),
            Url::parse("https://mint.example.com")?,
        );
        wallet.load_mint().await?;

        let dhke = Dhke::new();
        let y = Dhke::hash_to_curve("spent-secret".as_bytes());
        let key = secp256k1::SecretKey::from_slice(&[9u8; 32])?;
        let c = dhke.step2_bob(y, &key)?;
        let proof = Proof::new(8, "spent-secret".to_owned(), c, "keyset".to_owned());
        wallet.localstore.add_proofs(&[proof.clone()]).await?;

        let removed = wallet.invalidate(&[proof]).await?;
        assert_eq!(removed.len(), 1);
        assert_eq!(wallet.balance().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_split_rejects_zero_amount() -> anyhow::Result<()> {
        let mock = MockCashuClient::new();
        let mut wallet = Wallet::new(
            mock,
            MemoryLocalStore::default(),
            Url::parse("https://mint.example.com")?,
        );
        let result = wallet.split(&[], 0, None).await;
        assert!(matches!(result, Err(MokshaWalletError::AmountError(_))));
        Ok(())
    }
}
