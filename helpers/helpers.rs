//! Common helper functions for scripts and tests
//!
//! The deployment flow is written against the [`ChainClient`] seam so the
//! scripts talk to a live node through [`EthersChainClient`] while the tests
//! substitute an in-memory client.

pub mod artifact;
pub mod client;
pub mod config;
pub mod deploy;
pub mod error;
pub mod ethers_client;

pub use artifact::ContractArtifact;
pub use client::{
    ChainClient, ContractFactory, DeployedContract, PendingDeployment, SignerIdentity,
};
pub use config::{DeployConfig, MultisigParams};
pub use deploy::{deploy_multisig, REPORT_LABEL};
pub use error::{DeployError, Result};
pub use ethers_client::EthersChainClient;
