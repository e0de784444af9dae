//! The wallet's HTTP collaborator: a thin trait over the mint's six endpoints, so the `Wallet`
//! itself never touches `reqwest` directly and can be driven by a mock in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use moksha_core::blind::{BlindedMessage, BlindedSignature};
use moksha_core::primitives::{
    CashuErrorResponse, CheckResponse, MintInfoResponse, PaymentRequest, PostMeltRequest,
    PostMeltResponse, PostMintRequest, PostMintResponse, PostSplitRequest, PostSplitResponse,
};
use moksha_core::proof::Proofs;
use reqwest::{Response, StatusCode};
use secp256k1::PublicKey;
use url::Url;

#[cfg(test)]
use mockall::automock;

use crate::error::MokshaWalletError;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CashuClient: Send + Sync {
    async fn get_keys(&self, mint_url: &Url) -> Result<HashMap<u64, PublicKey>, MokshaWalletError>;

    async fn get_info(&self, mint_url: &Url) -> Result<MintInfoResponse, MokshaWalletError>;

    async fn request_mint(
        &self,
        mint_url: &Url,
        amount: u64,
    ) -> Result<PaymentRequest, MokshaWalletError>;

    async fn post_mint(
        &self,
        mint_url: &Url,
        payment_hash: &str,
        outputs: Vec<BlindedMessage>,
    ) -> Result<PostMintResponse, MokshaWalletError>;

    async fn post_split(
        &self,
        mint_url: &Url,
        proofs: Proofs,
        amount: u64,
        outputs: Vec<BlindedMessage>,
    ) -> Result<PostSplitResponse, MokshaWalletError>;

    async fn post_check(
        &self,
        mint_url: &Url,
        proofs: Proofs,
    ) -> Result<CheckResponse, MokshaWalletError>;

    async fn post_melt(
        &self,
        mint_url: &Url,
        proofs: Proofs,
        amount: u64,
        invoice: &str,
    ) -> Result<PostMeltResponse, MokshaWalletError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestCashuClient {
    http: reqwest::Client,
}

impl ReqwestCashuClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CashuClient for ReqwestCashuClient {
    async fn get_keys(&self, mint_url: &Url) -> Result<HashMap<u64, PublicKey>, MokshaWalletError> {
        let resp = self.http.get(mint_url.join("keys")?).send().await?;
        extract(resp).await
    }

    async fn get_info(&self, mint_url: &Url) -> Result<MintInfoResponse, MokshaWalletError> {
        let resp = self.http.get(mint_url.join("info")?).send().await?;
        extract(resp).await
    }

    async fn request_mint(
        &self,
        mint_url: &Url,
        amount: u64,
    ) -> Result<PaymentRequest, MokshaWalletError> {
        let url = mint_url.join(&format!("mint?amount={amount}"))?;
        let resp = self.http.get(url).send().await?;
        extract(resp).await
    }

    async fn post_mint(
        &self,
        mint_url: &Url,
        payment_hash: &str,
        outputs: Vec<BlindedMessage>,
    ) -> Result<PostMintResponse, MokshaWalletError> {
        let url = mint_url.join(&format!("mint?payment_hash={payment_hash}"))?;
        let resp = self
            .http
            .post(url)
            .json(&PostMintRequest { outputs })
            .send()
            .await?;
        extract(resp).await
    }

    async fn post_split(
        &self,
        mint_url: &Url,
        proofs: Proofs,
        amount: u64,
        output_data: Vec<BlindedMessage>,
    ) -> Result<PostSplitResponse, MokshaWalletError> {
        let resp = self
            .http
            .post(mint_url.join("split")?)
            .json(&PostSplitRequest {
                proofs,
                amount,
                output_data,
            })
            .send()
            .await?;
        extract(resp).await
    }

    async fn post_check(
        &self,
        mint_url: &Url,
        proofs: Proofs,
    ) -> Result<CheckResponse, MokshaWalletError> {
        let resp = self
            .http
            .post(mint_url.join("check")?)
            .json(&moksha_core::primitives::CheckRequest { proofs })
            .send()
            .await?;
        extract(resp).await
    }

    async fn post_melt(
        &self,
        mint_url: &Url,
        proofs: Proofs,
        amount: u64,
        invoice: &str,
    ) -> Result<PostMeltResponse, MokshaWalletError> {
        let resp = self
            .http
            .post(mint_url.join("melt")?)
            .json(&PostMeltRequest {
                proofs,
                amount,
                invoice: invoice.to_owned(),
            })
            .send()
            .await?;
        extract(resp).await
    }
}

/// Any non-2xx response, or a 2xx body that fails to decode as `T`, becomes a
/// [`MokshaWalletError`] — the wallet never silently treats a malformed mint response as success.
async fn extract<T: serde::de::DeserializeOwned>(
    response: Response,
) -> Result<T, MokshaWalletError> {
    let status = response.status();
    let text = response.text().await?;

    if status == StatusCode::OK {
        return serde_json::from_str::<T>(&text)
            .map_err(|_| MokshaWalletError::TransportError(text));
    }

    match serde_json::from_str::<CashuErrorResponse>(&text) {
        Ok(err) => Err(MokshaWalletError::MintError(err.error)),
        Err(_) => Err(MokshaWalletError::TransportError(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_error_response() -> anyhow::Result<()> {
        let input = r#"{"code":1,"error":"proof already spent"}"#;
        let data = serde_json::from_str::<CashuErrorResponse>(input)?;
        assert_eq!(data.code, 1);
        assert_eq!(data.error, "proof already spent");
        Ok(())
    }
}
