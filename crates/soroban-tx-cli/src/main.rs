mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use soroban_tx_core::DriverConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Invoke Soroban contracts and track transactions to completion
#[derive(Debug, Parser)]
#[command(name = "soroban-tx", version, about)]
pub struct Cli {
    /// Stellar network to use (mainnet, testnet, futurenet)
    #[arg(long, global = true)]
    pub network: Option<String>,

    /// Override the network's RPC endpoint
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Secret seed (S...) of the submitting account
    #[arg(long, global = true, env = "STELLAR_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Query a token contract balance
    Balance {
        /// Contract ID (hex or C... strkey)
        contract_id: String,

        /// Account to query, defaults to the signer
        #[arg(long)]
        account: Option<String>,

        /// Decode the balance as i128 (SEP-41 tokens)
        #[arg(long = "i128")]
        sep41: bool,

        /// Read the value from simulation without submitting
        #[arg(long)]
        simulate_only: bool,
    },

    /// Invoke a contract function
    Invoke {
        /// Contract ID (hex or C... strkey)
        contract_id: String,

        /// Function name
        function: String,

        /// Arguments as type:value (bool, u32, i32, u64, i64, u128, i128, sym, str, addr)
        #[arg(long = "arg")]
        args: Vec<String>,

        /// Simulate only, do not submit
        #[arg(long)]
        simulate_only: bool,
    },

    /// Show the status of a submitted transaction
    Status {
        /// Transaction hash
        hash: String,

        /// Poll until the transaction reaches a terminal status
        #[arg(long)]
        wait: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soroban_tx_core=info,soroban_tx=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let network = config::resolve_network(config::Sources::from_cli(cli.network, cli.rpc_url))?;
    let driver_config = DriverConfig::from_env()?;

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, cancelling");
            ctrl_c_token.cancel();
        }
    });

    match cli.command {
        Commands::Balance {
            contract_id,
            account,
            sep41,
            simulate_only,
        } => {
            let signer = commands::load_keypair(cli.secret_key.as_deref())?;
            commands::balance(
                &network,
                driver_config,
                &signer,
                &contract_id,
                account.as_deref(),
                sep41,
                simulate_only,
                &cancel,
            )
            .await?;
        }
        Commands::Invoke {
            contract_id,
            function,
            args,
            simulate_only,
        } => {
            let signer = commands::load_keypair(cli.secret_key.as_deref())?;
            commands::invoke(
                &network,
                driver_config,
                &signer,
                &contract_id,
                &function,
                &args,
                simulate_only,
                &cancel,
            )
            .await?;
        }
        Commands::Status { hash, wait } => {
            commands::status(&network, driver_config, &hash, wait, &cancel).await?;
        }
    }
    Ok(())
}
