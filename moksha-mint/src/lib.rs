//! Axum HTTP surface over `Mint`: the six protocol endpoints plus an ambient `/info`.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use secp256k1::PublicKey;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{event, info, Level};

use moksha_core::primitives::{
    CashuErrorResponse, CheckRequest, CheckResponse, MintInfoParameter, MintInfoResponse,
    PaymentRequest, PostMeltRequest, PostMeltResponse, PostMintQuery, PostMintRequest,
    PostMintResponse, PostSplitRequest, PostSplitResponse,
};

use crate::config::MintConfig;
use crate::database::Database;
use crate::error::MokshaMintError;
use crate::mint::Mint;

pub mod config;
pub mod database;
pub mod error;
pub mod lightning;
pub mod mint;
pub mod model;

pub async fn run_server(mint: Mint, addr: SocketAddr) -> anyhow::Result<()> {
    info!("listening on: {}", addr);
    info!("lightning_backend: {:?}", mint.config.lightning);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(mint).into_make_service()).await?;
    Ok(())
}

pub fn app<DB>(mint: Mint<DB>) -> Router
where
    DB: Database + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/keys", get(get_keys::<DB>))
        .route("/mint", get(get_mint::<DB>).post(post_mint::<DB>))
        .route("/split", post(post_split::<DB>))
        .route("/check", post(post_check::<DB>))
        .route("/melt", post(post_melt::<DB>))
        .route("/info", get(get_info::<DB>))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(mint)
}

async fn get_keys<DB: Database>(
    State(mint): State<Mint<DB>>,
) -> Result<Json<HashMap<u64, PublicKey>>, MokshaMintError> {
    Ok(Json(mint.get_keys().clone()))
}

async fn get_mint<DB: Database>(
    State(mint): State<Mint<DB>>,
    Query(query): Query<PostMintQuery>,
) -> Result<Json<PaymentRequest>, MokshaMintError> {
    let (pr, hash) = mint.create_invoice(query.amount).await?;
    Ok(Json(PaymentRequest { pr, hash }))
}

async fn post_mint<DB: Database>(
    State(mint): State<Mint<DB>>,
    Query(query): Query<HashMap<String, String>>,
    Json(request): Json<PostMintRequest>,
) -> Result<Json<PostMintResponse>, MokshaMintError> {
    let payment_hash = query
        .get("payment_hash")
        .ok_or(MokshaMintError::InvalidAmount)?;
    event!(Level::INFO, "post_mint: {payment_hash} {request:?}");
    let promises = mint.mint_tokens(payment_hash, &request.outputs).await?;
    Ok(Json(PostMintResponse { promises }))
}

async fn post_split<DB: Database>(
    State(mint): State<Mint<DB>>,
    Json(request): Json<PostSplitRequest>,
) -> Result<Json<PostSplitResponse>, MokshaMintError> {
    let total = request.proofs.total_amount();
    let fst_count =
        moksha_core::amount::split_amount(total.saturating_sub(request.amount)).len();
    let (fst, snd) = mint
        .swap(&request.proofs, request.amount, &request.output_data, fst_count)
        .await?;
    Ok(Json(PostSplitResponse { fst, snd }))
}

async fn post_check<DB: Database>(
    State(mint): State<Mint<DB>>,
    Json(request): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, MokshaMintError> {
    let result = mint.check(&request.proofs).await?;
    let spendable = result
        .into_iter()
        .map(|(idx, is_spendable)| (idx.to_string(), is_spendable))
        .collect();
    Ok(Json(CheckResponse(spendable)))
}

async fn post_melt<DB: Database>(
    State(mint): State<Mint<DB>>,
    Json(request): Json<PostMeltRequest>,
) -> Result<Json<PostMeltResponse>, MokshaMintError> {
    let (paid, preimage) = mint
        .melt(&request.proofs, request.amount, &request.invoice)
        .await?;
    Ok(Json(PostMeltResponse { paid, preimage }))
}

async fn get_info<DB: Database>(
    State(mint): State<Mint<DB>>,
) -> Result<Json<MintInfoResponse>, MokshaMintError> {
    Ok(Json(MintInfoResponse {
        name: mint.config.info.name.clone(),
        pubkey: Some(mint.keyset.mint_pubkey.to_string()),
        version: Some(env!("CARGO_PKG_VERSION").to_owned()),
        description: mint.config.info.description.clone(),
        description_long: mint.config.info.description_long.clone(),
        contact: mint.config.info.contact.clone().unwrap_or_default(),
        nuts: vec!["NUT-00".to_owned(), "NUT-01".to_owned(), "NUT-02".to_owned()],
        motd: mint.config.info.motd.clone(),
        parameter: Some(MintInfoParameter { peg_out_only: false }),
    }))
}

impl From<CashuErrorResponse> for MokshaMintError {
    fn from(value: CashuErrorResponse) -> Self {
        Self::SwapAmountMismatch(value.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, LightningFeeConfig, LightningType, MintInfoConfig, ServerConfig};
    use crate::database::SqliteDB;
    use crate::lightning::StubLightning;
    use http_body_util::BodyExt;
    use hyper::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_mint() -> Mint<SqliteDB> {
        let db = SqliteDB::new("sqlite::memory:").await.unwrap();
        db.migrate().await;
        Mint::new(
            Arc::new(StubLightning),
            db,
            MintConfig {
                privatekey: "TEST_PRIVATE_KEY".to_owned(),
                derivation_path: Some("0/0/0/0".to_owned()),
                info: MintInfoConfig {
                    name: Some("test mint".to_owned()),
                    ..Default::default()
                },
                lightning_fee: LightningFeeConfig::new(1.0, 4000),
                server: ServerConfig::default(),
                database: DatabaseConfig {
                    db_url: "sqlite::memory:".to_owned(),
                },
                lightning: LightningType::Stub,
            },
        )
    }

    #[tokio::test]
    async fn test_get_keys() -> anyhow::Result<()> {
        let app = app(test_mint().await);
        let response = app
            .oneshot(Request::builder().uri("/keys").body(axum::body::Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await?.to_bytes();
        let keys: HashMap<u64, PublicKey> = serde_json::from_slice(&body)?;
        assert_eq!(keys.len(), 64);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_info() -> anyhow::Result<()> {
        let app = app(test_mint().await);
        let response = app
            .oneshot(Request::builder().uri("/info").body(axum::body::Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await?.to_bytes();
        let info: MintInfoResponse = serde_json::from_slice(&body)?;
        assert_eq!(info.name, Some("test mint".to_owned()));
        Ok(())
    }

    #[tokio::test]
    async fn test_post_check_unspent() -> anyhow::Result<()> {
        use moksha_core::dhke::Dhke;
        use moksha_core::proof::{Proof, Proofs};

        let mint = test_mint().await;
        let dhke = Dhke::new();
        let y = Dhke::hash_to_curve("check-secret".as_bytes());
        let key = mint.keyset.private_keys.get(&8).unwrap();
        let c = dhke.step2_bob(y, key)?;
        let proof = Proof::new(8, "check-secret".to_owned(), c, mint.keyset.keyset_id.clone());

        let app = app(mint);
        let request = CheckRequest {
            proofs: Proofs::new(vec![proof]),
        };
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/check")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(serde_json::to_vec(&request)?))?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await?.to_bytes();
        let check: CheckResponse = serde_json::from_slice(&body)?;
        assert_eq!(check.0.get("0"), Some(&true));
        Ok(())
    }
}
