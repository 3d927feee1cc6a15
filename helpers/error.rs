use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeployError>;

/// Everything that can stop a deployment run.
///
/// None of these are handled locally; the script prints the error and exits
/// with status 1.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("No signer accounts available on the connected node")]
    NoSigners,

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Confirmation error: {0}")]
    Confirmation(String),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}
