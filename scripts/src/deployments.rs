//! Reading and recording deployed contract addresses
//!
//! Deployed addresses live in a per-network JSON file mapping a contract key
//! to its hex address. Lookups fall back to the addresses the networks config
//! declares for the network.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use alloy::primitives::Address;
use tracing::info;

use crate::{config::parse_nonzero_address, errors::ScriptError};

/// The address book for a single network
#[derive(Debug)]
pub struct Deployments {
    /// The path of the deployments file
    path: PathBuf,
    /// Addresses recorded in the deployments file
    recorded: BTreeMap<String, Address>,
    /// Addresses declared in the networks config
    configured: BTreeMap<String, Address>,
}

impl Deployments {
    /// Load the deployments file at `path`, if it exists, layered over the
    /// addresses declared in the networks config
    pub fn load(
        path: impl Into<PathBuf>,
        configured: BTreeMap<String, Address>,
    ) -> Result<Self, ScriptError> {
        let path = path.into();
        let recorded = if path.exists() {
            read_deployments_file(&path)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            recorded,
            configured,
        })
    }

    /// The path of the deployments file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up the address recorded under the given key
    pub fn get(&self, key: &str) -> Option<Address> {
        self.recorded
            .get(key)
            .or_else(|| self.configured.get(key))
            .copied()
    }

    /// Resolve an address, preferring one passed explicitly over the address book
    pub fn resolve(&self, explicit: Option<Address>, key: &str) -> Result<Address, ScriptError> {
        explicit.or_else(|| self.get(key)).ok_or_else(|| {
            ScriptError::InvalidConfig(format!(
                "no `{key}` address given and none recorded in {} or the network config",
                self.path.display()
            ))
        })
    }

    /// Record a deployed address and persist the deployments file
    pub fn record(&mut self, key: &str, address: Address) -> Result<(), ScriptError> {
        self.record_all(&[(key, address)])
    }

    /// Record several deployed addresses with a single write of the
    /// deployments file. Nothing is recorded if the write fails.
    pub fn record_all(&mut self, entries: &[(&str, Address)]) -> Result<(), ScriptError> {
        let mut recorded = self.recorded.clone();
        for (key, address) in entries {
            recorded.insert(key.to_string(), *address);
        }
        write_deployments_file(&self.path, &recorded)?;
        self.recorded = recorded;

        for (key, address) in entries {
            info!("recorded {key} = {address:#x} in {}", self.path.display());
        }
        Ok(())
    }
}

/// Read and validate a deployments file
fn read_deployments_file(path: &Path) -> Result<BTreeMap<String, Address>, ScriptError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ScriptError::ReadFile(format!("{}: {}", path.display(), e)))?;
    let raw: BTreeMap<String, String> = serde_json::from_str(&contents)
        .map_err(|e| ScriptError::ConfigParsing(format!("{}: {}", path.display(), e)))?;

    raw.iter()
        .map(|(key, addr)| Ok((key.clone(), parse_nonzero_address(addr, key)?)))
        .collect()
}

/// Write the deployments file, creating it if it doesn't exist
fn write_deployments_file(
    path: &Path,
    deployments: &BTreeMap<String, Address>,
) -> Result<(), ScriptError> {
    let raw: BTreeMap<&str, String> = deployments
        .iter()
        .map(|(key, addr)| (key.as_str(), addr.to_checksum(None /* chain_id */)))
        .collect();

    let contents =
        serde_json::to_string_pretty(&raw).map_err(|e| ScriptError::WriteFile(e.to_string()))?;

    fs::write(path, contents)
        .map_err(|e| ScriptError::WriteFile(format!("{}: {}", path.display(), e)))
}
