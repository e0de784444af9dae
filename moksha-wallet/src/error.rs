use thiserror::Error;

#[derive(Error, Debug)]
pub enum MokshaWalletError {
    #[error("ReqwestError - {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("InvalidHeaderValueError - {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    #[error("SerdeJsonError - {0}")]
    Json(#[from] serde_json::Error),

    #[error("MokshaCoreError - {0}")]
    MokshaCore(#[from] moksha_core::error::MokshaCoreError),

    #[error("DB Error {0}")]
    Db(#[from] sqlx::Error),

    #[error("Migrate Error {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("URLParseError - {0}")]
    Url(#[from] url::ParseError),

    #[error("the mint rejected the request: {0}")]
    MintError(String),

    #[error("unexpected response from mint: {0}")]
    TransportError(String),

    #[error("could not find {0} unused secrets after {1} attempts")]
    SecretReused(usize, usize),

    #[error("invalid amount: {0}")]
    AmountError(String),

    #[error("not enough spendable tokens to cover the requested amount")]
    NotEnoughTokens,

    #[error("proofs failed verification")]
    InvalidProofs,

    #[error("lightning payment failed")]
    PaymentFailed,

    #[error("failed to decode token: {0}")]
    DecodeToken(String),
}
