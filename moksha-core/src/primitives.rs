//! This module defines the HTTP request/response DTOs exchanged between wallet and mint, as
//! described by the mint's HTTP API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use crate::blind::{BlindedMessage, BlindedSignature};
use crate::proof::Proofs;

/// `GET /keys` response: one public key per supported denomination for the active keyset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct KeysResponse {
    #[schema(value_type = std::collections::HashMap<String, String>)]
    pub keys: HashMap<u64, secp256k1::PublicKey>,
}

/// `GET /keysets` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
pub struct KeysetResponse {
    pub keysets: Vec<String>,
}

/// `GET /mint` query params and response: a Lightning invoice to pay in order to mint tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PaymentRequest {
    pub pr: String,
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PostMintQuery {
    pub amount: u64,
}

/// `POST /mint` request: the blinded messages to sign, once the invoice referenced by `hash`
/// has been paid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PostMintRequest {
    pub outputs: Vec<BlindedMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PostMintResponse {
    pub promises: Vec<BlindedSignature>,
}

/// `POST /split` request: spend `proofs`, keep `amount` as change and receive the rest back
/// blinded. The mint recomputes where `output_data` splits between the two denomination
/// sequences from `amount` alone — no explicit boundary travels on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PostSplitRequest {
    pub proofs: Proofs,
    pub amount: u64,
    pub output_data: Vec<BlindedMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PostSplitResponse {
    pub fst: Vec<BlindedSignature>,
    pub snd: Vec<BlindedSignature>,
}

/// `POST /check` request/response: whether a set of proofs has already been spent, keyed by
/// the stringified index of the proof in the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CheckRequest {
    pub proofs: Proofs,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
pub struct CheckResponse(pub HashMap<String, bool>);

/// `POST /melt` request: pay `invoice` using `proofs`, which must cover `amount` plus the
/// mint's fee reserve. This spec has no melt change: overpaying proofs are simply spent in
/// full, there is no blinded output to receive a refund into.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PostMeltRequest {
    pub proofs: Proofs,
    pub amount: u64,
    pub invoice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PostMeltResponse {
    pub paid: bool,
    pub preimage: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CashuErrorResponse {
    pub code: u64,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct MintInfoResponse {
    pub name: Option<String>,
    pub pubkey: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub description_long: Option<String>,
    pub contact: Vec<Vec<String>>,
    pub nuts: Vec<String>,
    pub motd: Option<String>,
    #[schema(value_type = Option<String>)]
    pub parameter: Option<MintInfoParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct MintInfoParameter {
    pub peg_out_only: bool,
}

/// A `POST /mint` QR/link-friendly request URI for other wallets to pay into this wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct MintLightningRequest {
    pub mint: Url,
    pub amount: u64,
}
