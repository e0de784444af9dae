//! This module defines the `TokenV3` wire format: the `cashuA`-prefixed, base64url-encoded
//! JSON envelope that wallets exchange out of band (QR codes, clipboard, links).

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::skip_serializing_none;
use url::Url;
use utoipa::ToSchema;

use crate::error::MokshaCoreError;
use crate::proof::Proofs;

const CASHU_TOKEN_PREFIX: &str = "cashuA";

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Token {
    #[serde(
        serialize_with = "serialize_url",
        deserialize_with = "deserialize_url"
    )]
    pub mint: Option<Url>,
    pub proofs: Proofs,
}

fn deserialize_url<'de, D>(deserializer: D) -> Result<Option<Url>, D::Error>
where
    D: Deserializer<'de>,
{
    let url_str: Option<String> = Option::deserialize(deserializer)?;
    match url_str {
        Some(s) => Url::parse(&s).map_err(serde::de::Error::custom).map(Some),
        None => Ok(None),
    }
}

fn serialize_url<S>(url: &Option<Url>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match url {
        Some(url) => {
            let mut url_str = url.as_str().to_owned();
            if url_str.ends_with('/') {
                url_str.pop();
            }
            serializer.serialize_str(&url_str)
        }
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
pub struct TokenV3 {
    #[serde(rename = "token")]
    pub tokens: Vec<Token>,
    pub memo: Option<String>,
}

impl TokenV3 {
    pub fn new(mint: Url, proofs: Proofs) -> Self {
        Self {
            tokens: vec![Token {
                mint: Some(mint),
                proofs,
            }],
            memo: None,
        }
    }

    pub fn with_memo(mint: Url, proofs: Proofs, memo: String) -> Self {
        Self {
            tokens: vec![Token {
                mint: Some(mint),
                proofs,
            }],
            memo: Some(memo),
        }
    }

    pub fn empty() -> Self {
        Self {
            tokens: vec![],
            memo: None,
        }
    }

    pub fn total_amount(&self) -> u64 {
        self.tokens.iter().map(|t| t.proofs.total_amount()).sum()
    }

    pub fn proofs(&self) -> Proofs {
        Proofs::new(
            self.tokens
                .iter()
                .flat_map(|t| t.proofs.proofs())
                .collect(),
        )
    }

    pub fn mint_url(&self) -> Option<&Url> {
        self.tokens.first().and_then(|t| t.mint.as_ref())
    }

    pub fn serialize(&self) -> Result<String, MokshaCoreError> {
        let json = serde_json::to_string(self)?;
        Ok(format!(
            "{}{}",
            CASHU_TOKEN_PREFIX,
            general_purpose::URL_SAFE.encode(json)
        ))
    }

    pub fn deserialize(token: String) -> Result<Self, MokshaCoreError> {
        let stripped = token
            .strip_prefix(CASHU_TOKEN_PREFIX)
            .ok_or(MokshaCoreError::InvalidTokenPrefix)?;
        let decoded = general_purpose::URL_SAFE
            .decode(stripped)
            .or_else(|_| general_purpose::URL_SAFE_NO_PAD.decode(stripped))?;
        Ok(serde_json::from_slice(&decoded)?)
    }
}

impl TryFrom<String> for TokenV3 {
    type Error = MokshaCoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::deserialize(value)
    }
}

impl TryFrom<TokenV3> for String {
    type Error = MokshaCoreError;

    fn try_from(token: TokenV3) -> Result<Self, Self::Error> {
        token.serialize()
    }
}

impl From<(Url, Proofs)> for TokenV3 {
    fn from(from: (Url, Proofs)) -> Self {
        Self {
            tokens: vec![Token {
                mint: Some(from.0),
                proofs: from.1,
            }],
            memo: None,
        }
    }
}
