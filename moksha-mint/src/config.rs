//! This module defines the mint's configuration, assembled from environment variables via small
//! `env_or_default` helpers, with no external env-parsing crate.

use std::{env, net::SocketAddr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct MintConfig {
    pub privatekey: String,
    pub derivation_path: Option<String>,
    pub info: MintInfoConfig,
    pub lightning_fee: LightningFeeConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub lightning: LightningType,
}

impl MintConfig {
    pub fn from_env() -> Self {
        let privatekey = env::var("MINT_PRIVATE_KEY")
            .expect("MINT_PRIVATE_KEY not set. The mint refuses to start without a master seed");
        Self {
            privatekey,
            derivation_path: env::var("MINT_DERIVATION_PATH").ok(),
            info: MintInfoConfig::from_env(),
            lightning_fee: LightningFeeConfig::from_env(),
            server: ServerConfig::from_env(),
            database: DatabaseConfig::from_env(),
            lightning: LightningType::from_env(),
        }
    }

    pub fn derivation_path(&self) -> String {
        self.derivation_path.clone().unwrap_or_else(|| "0/0/0/0".to_owned())
    }
}

#[derive(Debug, Clone)]
pub enum LightningType {
    Stub,
    Lnbits(LnbitsConfig),
}

impl LightningType {
    pub fn from_env() -> Self {
        match env::var("MINT_LIGHTNING_BACKEND").as_deref() {
            Ok("Lnbits") => Self::Lnbits(LnbitsConfig::from_env()),
            _ => Self::Stub,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LnbitsConfig {
    pub admin_key: String,
    pub url: String,
}

impl LnbitsConfig {
    pub fn from_env() -> Self {
        Self {
            admin_key: env::var("LNBITS_ADMIN_KEY").unwrap_or_default(),
            url: env::var("LNBITS_URL").unwrap_or_else(|_| "https://legend.lnbits.com".to_owned()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    pub db_url: String,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            db_url: env::var("MINT_DB_URL").unwrap_or_else(|_| "sqlite::memory:".to_owned()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host_port: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host_port: "[::]:3338".parse().expect("invalid host port"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            host_port: env_or_default("MINT_HOST_PORT", default.host_port),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MintInfoConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    pub description_long: Option<String>,
    pub contact: Option<Vec<Vec<String>>>,
    pub motd: Option<String>,
}

impl MintInfoConfig {
    pub fn from_env() -> Self {
        Self {
            name: env::var("MINT_INFO_NAME").ok(),
            description: env::var("MINT_INFO_DESCRIPTION").ok(),
            description_long: env::var("MINT_INFO_DESCRIPTION_LONG").ok(),
            contact: None,
            motd: env::var("MINT_INFO_MOTD").ok(),
        }
    }
}

/// Fee reserve policy: `max(fee_reserve_min, amount * fee_percent)`.
#[derive(Debug, Clone)]
pub struct LightningFeeConfig {
    pub fee_percent: f32,
    pub fee_reserve_min: u64,
}

impl LightningFeeConfig {
    pub fn new(fee_percent: f32, fee_reserve_min: u64) -> Self {
        Self {
            fee_percent,
            fee_reserve_min,
        }
    }

    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            fee_percent: env_or_default("LIGHTNING_FEE_PERCENT", default.fee_percent),
            fee_reserve_min: env_or_default("LIGHTNING_RESERVE_FEE_MIN", default.fee_reserve_min),
        }
    }

    pub fn fee_reserve(&self, amount: u64) -> u64 {
        let percent_fee = (amount as f32 * self.fee_percent / 100.0).ceil() as u64;
        percent_fee.max(self.fee_reserve_min)
    }
}

impl Default for LightningFeeConfig {
    fn default() -> Self {
        Self {
            fee_percent: 1.0,
            fee_reserve_min: 4000,
        }
    }
}

fn env_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
