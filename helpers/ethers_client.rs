//! [`ChainClient`] backed by an ethers JSON-RPC provider

use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use ethers::{
    abi::Token,
    middleware::SignerMiddleware,
    providers::{Http, JsonRpcClient, Middleware, PendingTransaction, Provider},
    signers::{LocalWallet, Signer},
    types::{
        transaction::eip2718::TypedTransaction, Address, BlockNumber, Bytes,
        Eip1559TransactionRequest, TransactionRequest, TxHash, U256, U64,
    },
};
use tracing::{debug, info};

use crate::{
    ChainClient, ContractArtifact, ContractFactory, DeployConfig, DeployError, DeployedContract,
    PendingDeployment, Result, SignerIdentity,
};

/// Talks to a node over JSON-RPC, HTTP unless another transport is given.
///
/// With local keys configured the keys are the signers and transactions are
/// signed in-process; otherwise the node's own unlocked accounts are used, as
/// on a Hardhat or Anvil development node.
#[derive(Debug, Clone)]
pub struct EthersChainClient<P = Http> {
    provider: Provider<P>,
    wallets: Vec<LocalWallet>,
    artifacts_dir: PathBuf,
    confirmations: usize,
    confirmation_timeout: Option<Duration>,
}

impl EthersChainClient {
    /// Builds the HTTP client. No request is sent until the first operation.
    pub fn connect(config: &DeployConfig) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| DeployError::Config(format!("invalid RPC url {}: {e}", config.rpc_url)))?
            .interval(config.poll_interval);

        Ok(Self::with_provider(provider, config))
    }
}

impl<P> EthersChainClient<P>
where
    P: JsonRpcClient + Clone + 'static,
{
    /// Uses an already built provider; `rpc_url` and `poll_interval` of the
    /// config are ignored.
    pub fn with_provider(provider: Provider<P>, config: &DeployConfig) -> Self {
        Self {
            provider,
            wallets: config.wallets.clone(),
            artifacts_dir: config.artifacts_dir.clone(),
            confirmations: config.confirmations,
            confirmation_timeout: config.confirmation_timeout,
        }
    }

    async fn deployer(&self) -> Result<Deployer<P>> {
        match self.wallets.first() {
            Some(wallet) => {
                let client =
                    SignerMiddleware::new_with_provider_chain(self.provider.clone(), wallet.clone())
                        .await
                        .map_err(|e| DeployError::Connectivity(e.to_string()))?;
                Ok(Deployer::Wallet(client))
            }
            None => {
                let owner = self
                    .signers()
                    .await?
                    .first()
                    .copied()
                    .ok_or(DeployError::NoSigners)?;
                Ok(Deployer::Node {
                    provider: self.provider.clone(),
                    from: owner.address,
                })
            }
        }
    }
}

#[async_trait]
impl<P> ChainClient for EthersChainClient<P>
where
    P: JsonRpcClient + Clone + 'static,
{
    type Factory = EthersContractFactory<P>;

    async fn signers(&self) -> Result<Vec<SignerIdentity>> {
        if self.wallets.is_empty() {
            let accounts = self
                .provider
                .get_accounts()
                .await
                .map_err(|e| DeployError::Connectivity(e.to_string()))?;
            debug!(count = accounts.len(), "node accounts");
            return Ok(accounts
                .into_iter()
                .map(|address| SignerIdentity { address })
                .collect());
        }

        // Ask the node for its chain id so connectivity failures surface here.
        let chain_id = self
            .provider
            .get_chainid()
            .await
            .map_err(|e| DeployError::Connectivity(e.to_string()))?;
        debug!(%chain_id, count = self.wallets.len(), "local signers");
        Ok(self
            .wallets
            .iter()
            .map(|wallet| SignerIdentity {
                address: wallet.address(),
            })
            .collect())
    }

    async fn contract_factory(&self, name: &str) -> Result<EthersContractFactory<P>> {
        let artifact = ContractArtifact::load(&self.artifacts_dir, name)?;
        let deployer = self.deployer().await?;
        info!(
            contract = %artifact.contract_name,
            deployer = ?deployer.address(),
            "resolved contract factory"
        );

        Ok(EthersContractFactory {
            artifact,
            deployer,
            provider: self.provider.clone(),
            confirmations: self.confirmations,
            confirmation_timeout: self.confirmation_timeout,
        })
    }
}

#[derive(Debug, Clone)]
enum Deployer<P> {
    Wallet(SignerMiddleware<Provider<P>, LocalWallet>),
    Node {
        provider: Provider<P>,
        from: Address,
    },
}

impl<P> Deployer<P>
where
    P: JsonRpcClient + Clone + 'static,
{
    fn address(&self) -> Address {
        match self {
            Self::Wallet(client) => client.address(),
            Self::Node { from, .. } => *from,
        }
    }

    async fn send(&self, tx: TypedTransaction) -> Result<TxHash> {
        let tx_hash = match self {
            Self::Wallet(client) => *client
                .send_transaction(tx, None)
                .await
                .map_err(|e| DeployError::Transaction(e.to_string()))?,
            Self::Node { provider, .. } => *provider
                .send_transaction(tx, None)
                .await
                .map_err(|e| DeployError::Transaction(e.to_string()))?,
        };
        Ok(tx_hash)
    }
}

/// Creation transaction for `data`: EIP-1559 when the chain reports a base
/// fee, a legacy `gasPrice` transaction otherwise.
fn creation_request(from: Address, data: Bytes, base_fee: Option<U256>) -> TypedTransaction {
    match base_fee {
        Some(_) => Eip1559TransactionRequest::new().from(from).data(data).into(),
        None => TransactionRequest::new().from(from).data(data).into(),
    }
}

/// A compiled contract bound to the account that deploys it.
#[derive(Debug, Clone)]
pub struct EthersContractFactory<P = Http> {
    artifact: ContractArtifact,
    deployer: Deployer<P>,
    provider: Provider<P>,
    confirmations: usize,
    confirmation_timeout: Option<Duration>,
}

#[async_trait]
impl<P> ContractFactory for EthersContractFactory<P>
where
    P: JsonRpcClient + Clone + 'static,
{
    type Pending = EthersPendingDeployment<P>;

    async fn deploy(&self, constructor_args: Vec<Token>) -> Result<EthersPendingDeployment<P>> {
        let data = self.artifact.encode_deployment(constructor_args)?;
        let base_fee = self
            .provider
            .get_block(BlockNumber::Latest)
            .await
            .map_err(|e| DeployError::Transaction(e.to_string()))?
            .and_then(|block| block.base_fee_per_gas);
        debug!(?base_fee, "latest block fee market");

        let tx = creation_request(self.deployer.address(), data, base_fee);
        let tx_hash = self.deployer.send(tx).await?;
        info!(?tx_hash, contract = %self.artifact.contract_name, "deployment transaction submitted");

        Ok(EthersPendingDeployment {
            provider: self.provider.clone(),
            tx_hash,
            confirmations: self.confirmations,
            timeout: self.confirmation_timeout,
        })
    }
}

#[derive(Debug, Clone)]
pub struct EthersPendingDeployment<P = Http> {
    provider: Provider<P>,
    tx_hash: TxHash,
    confirmations: usize,
    timeout: Option<Duration>,
}

#[async_trait]
impl<P> PendingDeployment for EthersPendingDeployment<P>
where
    P: JsonRpcClient + Clone + 'static,
{
    fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    async fn deployed(self) -> Result<DeployedContract> {
        let tx_hash = self.tx_hash;
        let pending =
            PendingTransaction::new(tx_hash, &self.provider).confirmations(self.confirmations);

        let receipt = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending).await.map_err(|_| {
                DeployError::Confirmation(format!(
                    "transaction {tx_hash:?} not confirmed within {limit:?}"
                ))
            })?,
            None => pending.await,
        }
        .map_err(|e| DeployError::Confirmation(e.to_string()))?
        .ok_or_else(|| {
            DeployError::Confirmation(format!("transaction {tx_hash:?} was dropped"))
        })?;

        if receipt.status == Some(U64::zero()) {
            return Err(DeployError::Confirmation(format!(
                "transaction {tx_hash:?} reverted in block {:?}",
                receipt.block_number
            )));
        }
        let address = receipt.contract_address.ok_or_else(|| {
            DeployError::Confirmation(format!(
                "receipt for {tx_hash:?} carries no contract address"
            ))
        })?;
        info!(?address, block = ?receipt.block_number, "contract deployed");

        Ok(DeployedContract { address, tx_hash })
    }
}
