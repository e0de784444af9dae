use clap::{Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

#[derive(Parser)]
#[command(version, about = "A cashu wallet CLI")]
pub struct Opts {
    /// Base URL of the mint to talk to.
    #[arg(long, env = "MOKSHA_MINT_URL")]
    pub mint_url: Url,

    /// Path to the wallet's sqlite database.
    #[arg(long, env = "MOKSHA_WALLET_DB", default_value = "wallet.db")]
    pub db_path: PathBuf,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone)]
pub enum Command {
    /// Show the wallet's total and available balance.
    Balance,

    /// Request a Lightning invoice for `amount`, then, once paid, claim the minted proofs
    /// under `payment_hash`.
    Mint {
        amount: u64,
        #[arg(long)]
        payment_hash: Option<String>,
    },

    /// Split off `amount` sat and print it as a token string to hand to someone else.
    Send {
        amount: u64,
        /// Optional shared secret base for a deterministic, non-interactive receive.
        #[arg(long)]
        send_secret: Option<String>,
    },

    /// Redeem a token string received from someone else.
    Receive {
        token: String,
        #[arg(long)]
        send_secret: Option<String>,
    },

    /// Pay a Lightning invoice from wallet proofs.
    Melt { invoice: String, amount: u64 },

    /// Drop any locally stored proofs the mint no longer considers spendable.
    Prune,
}
