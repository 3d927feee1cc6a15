use std::io::Write;

use ethers::utils::to_checksum;
use tracing::info;

use crate::{
    ChainClient, ContractFactory, DeployError, DeployedContract, MultisigParams,
    PendingDeployment, Result,
};

/// Prefix of both report lines.
pub const REPORT_LABEL: &str = "MultisigContract";

/// Deploys one multisig owned by the client's first signer and `params.co_owner`.
///
/// Runs the four chain steps in order (signers, factory, deploy, confirmation)
/// and only then writes the two report lines to `out`. Any failure is returned
/// as-is; nothing is retried and nothing is written.
pub async fn deploy_multisig<C, W>(
    client: &C,
    contract_name: &str,
    params: &MultisigParams,
    out: &mut W,
) -> Result<DeployedContract>
where
    C: ChainClient,
    W: Write,
{
    let signers = client.signers().await?;
    let owner = signers.first().copied().ok_or(DeployError::NoSigners)?;
    info!(owner = ?owner.address, available = signers.len(), "selected deploying signer");

    let factory = client.contract_factory(contract_name).await?;
    let pending = factory
        .deploy(params.constructor_args(owner.address))
        .await?;
    info!(tx_hash = ?pending.tx_hash(), threshold = %params.threshold, "waiting for deployment");

    let contract = pending.deployed().await?;

    writeln!(
        out,
        "{REPORT_LABEL} deployed to: {}",
        to_checksum(&contract.address, None)
    )?;
    writeln!(
        out,
        "{REPORT_LABEL} owner address: {}",
        to_checksum(&owner.address, None)
    )?;
    out.flush()?;

    Ok(contract)
}
