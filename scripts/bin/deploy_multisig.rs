//! Deployment script for the multisig contract
//!
//! Prints the deployed address and the owner address on stdout. Logs and
//! errors go to stderr; any failure exits with status 1.

use std::process::ExitCode;

use helpers::{deploy_multisig, DeployConfig, EthersChainClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = DeployConfig::from_env()?;
    info!(rpc_url = %config.rpc_url, contract = %config.contract_name, "starting deployment");
    let client = EthersChainClient::connect(&config)?;

    let mut stdout = std::io::stdout();
    deploy_multisig(&client, &config.contract_name, &config.multisig, &mut stdout).await?;

    Ok(())
}
