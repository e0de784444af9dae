//! Wallet CLI entry point: wires a `SqliteLocalStore` and `ReqwestCashuClient` into a `Wallet`
//! and dispatches one subcommand per invocation.

mod cli;

use clap::Parser;
use cli::{Command, Opts};
use moksha_wallet::client::ReqwestCashuClient;
use moksha_wallet::localstore::sqlite::SqliteLocalStore;
use moksha_wallet::wallet::Wallet;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let _ = dotenvy::dotenv();

    let opts = Opts::parse();

    let localstore =
        SqliteLocalStore::with_path(opts.db_path.to_string_lossy().into_owned()).await?;
    let client = ReqwestCashuClient::new();
    let mut wallet = Wallet::new(client, localstore, opts.mint_url);
    wallet.load_mint().await?;

    match opts.command {
        Command::Balance => {
            println!("balance: {} sat", wallet.balance().await?);
            println!("available: {} sat", wallet.available_balance().await?);
        }
        Command::Mint { amount, payment_hash } => match payment_hash {
            None => {
                let invoice = wallet.request_mint(amount).await?;
                println!("pay this invoice, then rerun with --payment-hash {}", invoice.hash);
                println!("{}", invoice.pr);
            }
            Some(hash) => {
                let proofs = wallet.mint(amount, &hash).await?;
                let minted: u64 = proofs.iter().map(|p| p.amount).sum();
                println!("minted {minted} sat");
            }
        },
        Command::Send { amount, send_secret } => {
            let (to_send, _kept) = wallet
                .split_to_send(amount, send_secret.as_deref())
                .await?;
            let token = wallet.serialize_token(&to_send, send_secret.is_some())?;
            println!("{token}");
            if let Some(secret) = send_secret {
                println!("share this secret with the recipient out of band: {secret}");
            }
        }
        Command::Receive { token, send_secret } => {
            let proofs = Wallet::<SqliteLocalStore, ReqwestCashuClient>::deserialize_token(&token)?;
            let redeemed = wallet.redeem(proofs, send_secret.as_deref()).await?;
            let amount: u64 = redeemed.iter().map(|p| p.amount).sum();
            println!("received {amount} sat");
        }
        Command::Melt { invoice, amount } => {
            let stored = wallet.balance().await?;
            if amount > stored {
                anyhow::bail!("not enough balance: have {stored}, need {amount}");
            }
            let (to_spend, _kept) = wallet.split_to_send(amount, None).await?;
            let paid = wallet.melt(&to_spend, amount, &invoice).await?;
            println!("paid: {paid}");
        }
        Command::Prune => {
            let all = wallet.all_proofs().await?;
            let removed = wallet.invalidate(&all).await?;
            println!(
                "pruned {} sat of stale proofs, balance now {} sat",
                removed.iter().map(|p| p.amount).sum::<u64>(),
                wallet.balance().await?
            );
        }
    }

    Ok(())
}
