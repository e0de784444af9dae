//! This module defines the `MokshaMintError` enum, which represents the possible errors that
//! can occur in the mint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{event, Level};

use crate::lightning::LightningError;

#[derive(Error, Debug)]
pub enum MokshaMintError {
    #[error("Failed to decode payment request {0} - Error {1}")]
    DecodeInvoice(String, lightning_invoice::ParseOrSemanticError),

    #[error("Failed to pay invoice {0} - Error {1}")]
    PayInvoice(String, LightningError),

    #[error("DB Error {0}")]
    Db(#[from] sqlx::Error),

    #[error("DB Migration Error {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Serde Error {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Moksha core error {0}")]
    MokshaCore(#[from] moksha_core::error::MokshaCoreError),

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Unknown amount {0}")]
    UnknownAmount(u64),

    #[error("Invoice not found for hash {0}")]
    InvoiceNotFound(String),

    #[error("Lightning invoice not paid yet.")]
    InvoiceNotPaidYet,

    #[error("Proof already used {0}")]
    AlreadySpent(String),

    #[error("duplicate input secrets")]
    DuplicateInput,

    #[error("{0}")]
    SwapAmountMismatch(String),

    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    #[error("Lightning Error {0}")]
    Lightning(#[from] LightningError),

    #[error("Keyset not found {0}")]
    KeysetNotFound(String),
}

impl IntoResponse for MokshaMintError {
    fn into_response(self) -> Response {
        event!(Level::ERROR, "error in mint: {:?}", self);

        let status = match self {
            Self::Db(_) | Self::Migrate(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "code": 0,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
