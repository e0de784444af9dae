//! This module defines the blinded message/signature types exchanged between wallet and mint
//! during minting and swapping.

use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::MokshaCoreError;
use crate::keyset::MAX_ORDER;

/// A blinded secret message sent by the wallet to the mint to be signed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct BlindedMessage {
    pub amount: u64,
    #[serde(rename = "B_")]
    #[schema(value_type = String)]
    pub b_: PublicKey,
    pub id: String,
}

/// The mint's blind signature over a `BlindedMessage`, returned to the wallet to be unblinded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct BlindedSignature {
    pub amount: u64,
    #[serde(rename = "C_")]
    #[schema(value_type = String)]
    pub c_: PublicKey,
    pub id: Option<String>,
}

pub trait TotalAmount {
    fn total_amount(&self) -> u64;
}

impl TotalAmount for Vec<BlindedMessage> {
    fn total_amount(&self) -> u64 {
        self.iter().fold(0, |acc, x| acc + x.amount)
    }
}

impl TotalAmount for Vec<BlindedSignature> {
    fn total_amount(&self) -> u64 {
        self.iter().fold(0, |acc, x| acc + x.amount)
    }
}

/// Validates that every blinded message's amount is a supported power-of-two denomination.
pub fn validate_amounts(messages: &[BlindedMessage]) -> Result<(), MokshaCoreError> {
    for msg in messages {
        if msg.amount == 0 || !msg.amount.is_power_of_two() || msg.amount.trailing_zeros() as u64 >= MAX_ORDER {
            return Err(MokshaCoreError::InvalidAmount(msg.amount));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dhke::Dhke;

    fn sample_blinded_message(amount: u64) -> BlindedMessage {
        let dhke = Dhke::new();
        let (b_, _r) = dhke.step1_alice("secret", None).expect("blind failed");
        BlindedMessage {
            amount,
            b_,
            id: "keyset1".to_owned(),
        }
    }

    #[test]
    fn test_total_amount() {
        let messages = vec![
            sample_blinded_message(1),
            sample_blinded_message(4),
            sample_blinded_message(8),
        ];
        assert_eq!(messages.total_amount(), 13);
        assert_eq!(messages.len(), 3);
    }

    #[test]
    fn test_total_amount_signatures() {
        let dhke = Dhke::new();
        let (c_, _) = dhke.step1_alice("secret", None).expect("blind failed");
        let signatures = vec![
            BlindedSignature { amount: 16, c_, id: Some("keyset1".to_owned()) },
            BlindedSignature { amount: 32, c_, id: None },
        ];
        assert_eq!(signatures.total_amount(), 48);
    }

    #[test]
    fn test_validate_amounts_ok() {
        let messages = vec![sample_blinded_message(1), sample_blinded_message(2)];
        assert!(validate_amounts(&messages).is_ok());
    }

    #[test]
    fn test_validate_amounts_rejects_non_power_of_two() {
        let messages = vec![sample_blinded_message(3)];
        assert!(validate_amounts(&messages).is_err());
    }

    #[test]
    fn test_validate_amounts_rejects_zero() {
        let messages = vec![sample_blinded_message(0)];
        assert!(validate_amounts(&messages).is_err());
    }
}
