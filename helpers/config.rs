//! Deployment settings read from the environment
//!
//! Every key is optional. A `.env` file in the working directory is loaded by
//! the script before [`DeployConfig::from_env`] runs.

use std::{path::PathBuf, str::FromStr, time::Duration};

use ethers::{
    abi::Token,
    signers::LocalWallet,
    types::{Address, H160, U256},
};

use crate::{DeployError, Result};

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
pub const DEFAULT_CONTRACT_NAME: &str = "Multisig";
/// Second owner passed to the multisig constructor,
/// `0x0708C30FF4DD48C5596CbfaCCC030C7b3D67010b`.
pub const DEFAULT_CO_OWNER: Address = H160([
    0x07, 0x08, 0xc3, 0x0f, 0xf4, 0xdd, 0x48, 0xc5, 0x59, 0x6c, 0xbf, 0xac, 0xcc, 0x03, 0x0c,
    0x7b, 0x3d, 0x67, 0x01, 0x0b,
]);
/// Number of owner approvals the multisig requires.
pub const DEFAULT_THRESHOLD: u64 = 2;
pub const DEFAULT_CONFIRMATIONS: usize = 1;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

pub const ENV_RPC_URL: &str = "MULTISIG_RPC_URL";
pub const ENV_PRIVATE_KEYS: &str = "MULTISIG_PRIVATE_KEYS";
pub const ENV_ARTIFACTS_DIR: &str = "MULTISIG_ARTIFACTS_DIR";
pub const ENV_CONTRACT: &str = "MULTISIG_CONTRACT";
pub const ENV_CO_OWNER: &str = "MULTISIG_CO_OWNER";
pub const ENV_THRESHOLD: &str = "MULTISIG_THRESHOLD";
pub const ENV_CONFIRMATIONS: &str = "MULTISIG_CONFIRMATIONS";
pub const ENV_POLL_INTERVAL_MS: &str = "MULTISIG_POLL_INTERVAL_MS";
pub const ENV_CONFIRMATION_TIMEOUT_SECS: &str = "MULTISIG_CONFIRMATION_TIMEOUT_SECS";

/// Constructor arguments of the multisig contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigParams {
    pub co_owner: Address,
    pub threshold: U256,
}

impl Default for MultisigParams {
    fn default() -> Self {
        Self {
            co_owner: DEFAULT_CO_OWNER,
            threshold: U256::from(DEFAULT_THRESHOLD),
        }
    }
}

impl MultisigParams {
    /// Owner list handed to the constructor: the deploying signer first.
    pub fn owners(&self, owner: Address) -> Vec<Address> {
        vec![owner, self.co_owner]
    }

    /// ABI tokens for `constructor(address[] owners, uint256 threshold)`.
    pub fn constructor_args(&self, owner: Address) -> Vec<Token> {
        let owners = self.owners(owner).into_iter().map(Token::Address).collect();
        vec![Token::Array(owners), Token::Uint(self.threshold)]
    }

    fn validate(&self) -> Result<()> {
        let owner_count = U256::from(self.owners(Address::zero()).len());
        if self.threshold.is_zero() || self.threshold > owner_count {
            return Err(DeployError::Config(format!(
                "threshold must be between 1 and {owner_count}, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub rpc_url: String,
    /// Local signing keys. Empty means the node's own accounts are used.
    pub wallets: Vec<LocalWallet>,
    pub artifacts_dir: PathBuf,
    pub contract_name: String,
    pub multisig: MultisigParams,
    pub confirmations: usize,
    pub poll_interval: Duration,
    pub confirmation_timeout: Option<Duration>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            wallets: Vec::new(),
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            contract_name: DEFAULT_CONTRACT_NAME.to_string(),
            multisig: MultisigParams::default(),
            confirmations: DEFAULT_CONFIRMATIONS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            confirmation_timeout: None,
        }
    }
}

impl DeployConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, falling back to
    /// the defaults for missing or blank keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let wallets = match get(ENV_PRIVATE_KEYS) {
            Some(keys) => parse_wallets(&keys)?,
            None => Vec::new(),
        };

        let multisig = MultisigParams {
            co_owner: match get(ENV_CO_OWNER) {
                Some(value) => Address::from_str(&value).map_err(|e| {
                    DeployError::Config(format!("{ENV_CO_OWNER} is not an address: {e}"))
                })?,
                None => defaults.multisig.co_owner,
            },
            threshold: match get(ENV_THRESHOLD) {
                Some(value) => U256::from_dec_str(&value).map_err(|e| {
                    DeployError::Config(format!("{ENV_THRESHOLD} is not an integer: {e}"))
                })?,
                None => defaults.multisig.threshold,
            },
        };
        multisig.validate()?;

        let poll_interval = match get(ENV_POLL_INTERVAL_MS) {
            Some(value) => Duration::from_millis(parse_positive(ENV_POLL_INTERVAL_MS, &value)?),
            None => defaults.poll_interval,
        };
        let confirmation_timeout = get(ENV_CONFIRMATION_TIMEOUT_SECS)
            .map(|value| parse_positive(ENV_CONFIRMATION_TIMEOUT_SECS, &value))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            rpc_url: get(ENV_RPC_URL).unwrap_or(defaults.rpc_url),
            wallets,
            artifacts_dir: get(ENV_ARTIFACTS_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.artifacts_dir),
            contract_name: get(ENV_CONTRACT).unwrap_or(defaults.contract_name),
            multisig,
            confirmations: match get(ENV_CONFIRMATIONS) {
                Some(value) => parse_number(ENV_CONFIRMATIONS, &value)?,
                None => defaults.confirmations,
            },
            poll_interval,
            confirmation_timeout,
        })
    }
}

fn parse_wallets(keys: &str) -> Result<Vec<LocalWallet>> {
    keys.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .enumerate()
        .map(|(index, key)| {
            LocalWallet::from_str(key.trim_start_matches("0x")).map_err(|e| {
                DeployError::Config(format!("{ENV_PRIVATE_KEYS} entry {index} is invalid: {e}"))
            })
        })
        .collect()
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| DeployError::Config(format!("{key} must be a non-negative integer: {e}")))
}

/// Like [`parse_number`], but zero is rejected.
fn parse_positive(key: &str, value: &str) -> Result<u64> {
    match parse_number(key, value)? {
        0 => Err(DeployError::Config(format!("{key} must be greater than zero"))),
        number => Ok(number),
    }
}
