//! Loading compiled contracts from a Hardhat `artifacts/` tree

use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

use ethers::{
    abi::{Abi, Token},
    types::Bytes,
};
use serde::Deserialize;
use tracing::debug;

use crate::{DeployError, Result};

/// Directories under the artifacts root that never hold contract artifacts.
const SKIPPED_DIRS: &[&str] = &["build-info", "cache"];

/// The parts of a compiled artifact needed to deploy it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Resolves `name` under `artifacts_dir` and parses it.
    ///
    /// `name` is either a bare contract name (`Multisig`), which must be
    /// unique in the tree, or a fully qualified one
    /// (`contracts/Multisig.sol:Multisig`).
    pub fn load(artifacts_dir: &Path, name: &str) -> Result<Self> {
        let path = find_artifact(artifacts_dir, name)?;
        debug!(path = %path.display(), "loading contract artifact");

        let content = fs::read_to_string(&path).map_err(|e| {
            DeployError::Artifact(format!("failed to read {}: {e}", path.display()))
        })?;
        let artifact: Self = serde_json::from_str(&content).map_err(|e| {
            DeployError::Artifact(format!("malformed artifact {}: {e}", path.display()))
        })?;

        let contract = contract_part(name);
        if artifact.contract_name != contract {
            return Err(DeployError::Artifact(format!(
                "{} holds contract {}, expected {contract}",
                path.display(),
                artifact.contract_name
            )));
        }
        if artifact.bytecode.is_empty() {
            return Err(DeployError::Artifact(format!(
                "{contract} has no creation bytecode (abstract contract or interface?)"
            )));
        }
        Ok(artifact)
    }

    /// Creation bytecode with the ABI-encoded constructor arguments appended.
    pub fn encode_deployment(&self, constructor_args: Vec<Token>) -> Result<Bytes> {
        match (self.abi.constructor(), constructor_args.is_empty()) {
            (None, false) => Err(DeployError::Artifact(format!(
                "{} has no constructor but {} arguments were supplied",
                self.contract_name,
                constructor_args.len()
            ))),
            (None, true) => Ok(self.bytecode.clone()),
            (Some(constructor), _) => constructor
                .encode_input(self.bytecode.to_vec(), &constructor_args)
                .map(Bytes::from)
                .map_err(|e| {
                    DeployError::Artifact(format!(
                        "constructor arguments do not match {}: {e}",
                        self.contract_name
                    ))
                }),
        }
    }
}

fn contract_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, contract)| contract)
}

/// Locates the artifact file for `name`.
pub fn find_artifact(artifacts_dir: &Path, name: &str) -> Result<PathBuf> {
    if !artifacts_dir.is_dir() {
        return Err(DeployError::Artifact(format!(
            "artifacts directory {} does not exist; compile the contracts first",
            artifacts_dir.display()
        )));
    }

    if let Some((source, contract)) = name.rsplit_once(':') {
        let path = artifacts_dir.join(source).join(format!("{contract}.json"));
        return if path.is_file() {
            Ok(path)
        } else {
            Err(DeployError::Artifact(format!(
                "artifact for {name} not found at {}",
                path.display()
            )))
        };
    }

    let file_name = format!("{name}.json");
    let mut matches = Vec::new();
    collect_matches(artifacts_dir, &file_name, &mut matches).map_err(|e| {
        DeployError::Artifact(format!(
            "failed to scan {}: {e}",
            artifacts_dir.display()
        ))
    })?;

    match matches.len() {
        0 => Err(DeployError::Artifact(format!(
            "artifact for {name} not found in {}",
            artifacts_dir.display()
        ))),
        1 => Ok(matches.remove(0)),
        _ => {
            matches.sort();
            let candidates = matches
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            Err(DeployError::Artifact(format!(
                "{name} is ambiguous, use a fully qualified name: {candidates}"
            )))
        }
    }
}

fn collect_matches(dir: &Path, file_name: &str, matches: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            let skipped = path
                .file_name()
                .and_then(OsStr::to_str)
                .is_some_and(|dir_name| SKIPPED_DIRS.contains(&dir_name));
            if !skipped {
                collect_matches(&path, file_name, matches)?;
            }
        } else if path.file_name().and_then(OsStr::to_str) == Some(file_name) {
            matches.push(path);
        }
    }
    Ok(())
}
