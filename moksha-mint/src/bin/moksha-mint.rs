//! Mint server entry point: loads `.env` in dev, builds a `Mint` from the environment, and
//! serves the HTTP API.

use clap::Parser;
use mokshamint::config::MintConfig;
use mokshamint::mint::MintBuilder;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(version, about = "A cashu mint server")]
struct Cli {
    /// Path to a .env file to load before reading MINT_* environment variables.
    #[arg(long, env = "MINT_ENV_FILE")]
    env_file: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_filename(path)?;
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }

    let config = MintConfig::from_env();
    let addr = config.server.host_port;

    let mint = MintBuilder::new().with_config(config).build().await?;

    mokshamint::run_server(mint, addr).await
}
