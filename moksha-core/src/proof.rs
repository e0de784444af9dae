//! This module defines `Proof`, the wallet's representation of a single unblinded, signed
//! ecash token, and `Proofs`, a collection of them with amount-selection helpers.
//!
//! `script` is a vestigial P2SH extension point: never populated by this protocol, kept only so
//! the wire shape matches what a mint/wallet pair actually exchanges.

use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::error::MokshaCoreError;

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Proof {
    pub amount: u64,
    #[serde(rename = "id")]
    pub keyset_id: String,
    pub secret: String,
    #[serde(rename = "C")]
    #[schema(value_type = String)]
    pub c: PublicKey,
    pub script: Option<P2SHScript>,
}

impl Proof {
    pub const fn new(amount: u64, secret: String, c: PublicKey, id: String) -> Self {
        Self {
            amount,
            secret,
            c,
            keyset_id: id,
            script: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct P2SHScript;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema, Default)]
pub struct Proofs(pub(super) Vec<Proof>);

impl Proofs {
    pub fn new(proofs: Vec<Proof>) -> Self {
        Self(proofs)
    }

    pub fn with_proof(proof: Proof) -> Self {
        Self(vec![proof])
    }

    pub const fn empty() -> Self {
        Self(vec![])
    }

    pub fn total_amount(&self) -> u64 {
        self.0.iter().map(|proof| proof.amount).sum()
    }

    pub fn proofs(&self) -> Vec<Proof> {
        self.0.clone()
    }

    pub fn secrets(&self) -> Vec<String> {
        self.0.iter().map(|proof| proof.secret.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn proofs_for_amount(&self, amount: u64) -> Result<Self, MokshaCoreError> {
        let mut all_proofs = self.0.clone();
        if amount > self.total_amount() {
            return Err(MokshaCoreError::NotEnoughTokens);
        }

        all_proofs.sort_by(|a, b| a.amount.cmp(&b.amount));

        let mut selected_proofs = vec![];
        let mut selected_amount = 0;

        while selected_amount < amount {
            if all_proofs.is_empty() {
                break;
            }

            let proof = all_proofs.pop().expect("proofs is empty");
            selected_amount += proof.amount;
            selected_proofs.push(proof);
        }

        Ok(selected_proofs.into())
    }
}

impl From<Vec<Proof>> for Proofs {
    fn from(from: Vec<Proof>) -> Self {
        Self(from)
    }
}

impl From<Proof> for Proofs {
    fn from(from: Proof) -> Self {
        Self(vec![from])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dhke::Dhke;
    use crate::fixture::read_fixture;
    use crate::token::TokenV3;
    use pretty_assertions::assert_eq;

    fn sample_proof(amount: u64, secret: &str) -> Proof {
        let dhke = Dhke::new();
        let (c, _) = dhke.step1_alice(secret, None).expect("blind failed");
        Proof::new(amount, secret.to_owned(), c, "keyset-id".to_owned())
    }

    #[test]
    fn test_total_amount() {
        let proofs = Proofs::new(vec![
            sample_proof(1, "a"),
            sample_proof(4, "b"),
            sample_proof(8, "c"),
        ]);
        assert_eq!(proofs.total_amount(), 13);
    }

    #[test]
    fn test_secrets() {
        let proofs = Proofs::new(vec![sample_proof(1, "a"), sample_proof(2, "b")]);
        assert_eq!(proofs.secrets(), vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn test_proofs_for_amount_empty() {
        let proofs = Proofs::empty();
        let result = proofs.proofs_for_amount(10);
        assert!(result.is_err());
    }

    #[test]
    fn test_proofs_for_amount_valid() -> anyhow::Result<()> {
        let fixture = read_fixture("token_60.json")?;
        let token: TokenV3 = fixture.try_into()?;

        let result = token.proofs().proofs_for_amount(10)?;
        assert_eq!(32, result.total_amount());
        assert_eq!(1, result.len());
        Ok(())
    }

    #[test]
    fn test_proof() -> anyhow::Result<()> {
        let js = serde_json::json!(
            {
              "id": "DSAl9nvvyfva",
              "amount": 2,
              "secret": "EhpennC9qB3iFlW8FZ_pZw",
              "C": "02c020067db727d586bc3183aecf97fcb800c3f4cc4759f69c626c9db5d8f5b5d4"
            }
        );

        let proof = serde_json::from_value::<Proof>(js)?;
        assert_eq!(proof.amount, 2);
        assert_eq!(proof.keyset_id, "DSAl9nvvyfva".to_string());
        assert_eq!(proof.secret, "EhpennC9qB3iFlW8FZ_pZw".to_string());
        Ok(())
    }
}
