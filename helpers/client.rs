use async_trait::async_trait;
use ethers::{
    abi::Token,
    types::{Address, TxHash},
};

use crate::Result;

/// An account the connected node (or a configured key) can sign with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignerIdentity {
    pub address: Address,
}

/// A contract whose creation transaction has been confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployedContract {
    pub address: Address,
    pub tx_hash: TxHash,
}

/// The chain-facing half of a deployment.
///
/// Implementations own the network connection and the account list; the
/// deployment driver only ever sees these three operations.
#[async_trait]
pub trait ChainClient: Send + Sync {
    type Factory: ContractFactory;

    /// Lists the signing accounts in their configured order.
    async fn signers(&self) -> Result<Vec<SignerIdentity>>;

    /// Resolves a deployable handle for a compiled contract, bound to the
    /// first signer.
    async fn contract_factory(&self, name: &str) -> Result<Self::Factory>;
}

#[async_trait]
pub trait ContractFactory: Send + Sync {
    type Pending: PendingDeployment;

    /// Submits the creation transaction with the given constructor arguments.
    async fn deploy(&self, constructor_args: Vec<Token>) -> Result<Self::Pending>;
}

/// A submitted creation transaction that has not been confirmed yet.
#[async_trait]
pub trait PendingDeployment: Send {
    fn tx_hash(&self) -> TxHash;

    /// Waits until the chain reports the contract as deployed.
    async fn deployed(self) -> Result<DeployedContract>;
}
