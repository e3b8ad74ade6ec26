//! The networks config file, and parsing of the values it and the CLI carry
//!
//! Every address, amount, and endpoint is parsed and validated when the
//! config is loaded, before any remote call is attempted.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::{
    primitives::{utils::parse_ether, Address, B256, U256},
    transports::http::reqwest::Url,
};
use itertools::Itertools;
use serde::Deserialize;

use crate::{
    constants::{
        DEFAULT_EAS_VERIFICATION_ARTIFACT, DEFAULT_PLEDGE_POST_ARTIFACT, DEFAULT_PROXY_ARTIFACT,
    },
    errors::ScriptError,
};

/// The networks config file as it is laid out on disk
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScriptsConfig {
    /// Paths to the compiled contract artifacts
    #[serde(default)]
    artifacts: ArtifactPaths,
    /// The configured networks, keyed by name
    networks: BTreeMap<String, RawNetworkConfig>,
}

/// A single network entry as it is laid out on disk
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNetworkConfig {
    /// The JSON-RPC endpoint of the network
    rpc_url: String,
    /// The chain ID the endpoint is expected to report
    chain_id: u64,
    /// Known contract addresses on the network, keyed like the deployments file
    #[serde(default)]
    contracts: BTreeMap<String, String>,
}

/// Paths to the compiled contract artifacts used for deployments
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactPaths {
    /// The PledgePost implementation artifact
    pub pledge_post: PathBuf,
    /// The EASVerification artifact
    pub eas_verification: PathBuf,
    /// The TransparentUpgradeableProxy artifact
    pub proxy: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            pledge_post: PathBuf::from(DEFAULT_PLEDGE_POST_ARTIFACT),
            eas_verification: PathBuf::from(DEFAULT_EAS_VERIFICATION_ARTIFACT),
            proxy: PathBuf::from(DEFAULT_PROXY_ARTIFACT),
        }
    }
}

/// A validated network entry
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// The network's name, as selected on the command line
    pub name: String,
    /// The JSON-RPC endpoint of the network
    pub rpc_url: Url,
    /// The chain ID the endpoint is expected to report
    pub chain_id: u64,
    /// Known contract addresses on the network
    pub contracts: BTreeMap<String, Address>,
}

/// The validated config for a single invocation of the scripts
#[derive(Clone, Debug)]
pub struct ScriptsConfig {
    /// The selected network
    pub network: NetworkConfig,
    /// Paths to the compiled contract artifacts
    pub artifacts: ArtifactPaths,
}

impl ScriptsConfig {
    /// Read the config file at `path` and select the given network from it
    pub fn load(path: &Path, network: &str) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::ReadFile(format!("{}: {}", path.display(), e)))?;

        Self::parse(&contents, network)
    }

    /// Parse the config from its JSON contents and select the given network from it
    pub fn parse(contents: &str, network: &str) -> Result<Self, ScriptError> {
        let RawScriptsConfig {
            artifacts,
            mut networks,
        } = serde_json::from_str(contents).map_err(|e| ScriptError::ConfigParsing(e.to_string()))?;

        let raw = networks.remove(network).ok_or_else(|| {
            let available = networks.keys().join(", ");
            ScriptError::InvalidConfig(format!(
                "unknown network `{network}`, configured networks: {available}"
            ))
        })?;

        Ok(Self {
            network: validate_network(network, raw)?,
            artifacts,
        })
    }
}

/// Validate a raw network entry
fn validate_network(name: &str, raw: RawNetworkConfig) -> Result<NetworkConfig, ScriptError> {
    let rpc_url = parse_rpc_url(&raw.rpc_url)?;

    if raw.chain_id == 0 {
        return Err(ScriptError::InvalidConfig(format!(
            "network `{name}` has a zero chain id"
        )));
    }

    let contracts = raw
        .contracts
        .iter()
        .map(|(key, addr)| {
            let addr = parse_nonzero_address(addr, &format!("{name}.contracts.{key}"))?;
            Ok((key.clone(), addr))
        })
        .collect::<Result<_, ScriptError>>()?;

    Ok(NetworkConfig {
        name: name.to_string(),
        rpc_url,
        chain_id: raw.chain_id,
        contracts,
    })
}

/// Parse an HTTP(S) JSON-RPC endpoint
pub fn parse_rpc_url(url: &str) -> Result<Url, ScriptError> {
    let parsed =
        Url::parse(url).map_err(|e| ScriptError::InvalidConfig(format!("rpc url `{url}`: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(ScriptError::InvalidConfig(format!(
            "rpc url `{url}` has unsupported scheme `{scheme}`"
        ))),
    }
}

/// Parse a hex address.
///
/// Addresses written in mixed case must carry a valid EIP-55 checksum;
/// all-lowercase and all-uppercase addresses are accepted as-is.
pub fn parse_address(addr: &str, what: &str) -> Result<Address, ScriptError> {
    let addr = addr.trim();
    if addr.is_empty() {
        return Err(ScriptError::InvalidConfig(format!("{what}: empty address")));
    }

    let digits = addr.strip_prefix("0x").unwrap_or(addr);
    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());

    let res = if has_lower && has_upper {
        Address::parse_checksummed(addr, None /* chain_id */).map_err(|e| e.to_string())
    } else {
        Address::from_str(addr).map_err(|e| e.to_string())
    };

    res.map_err(|e| ScriptError::InvalidConfig(format!("{what}: invalid address `{addr}`: {e}")))
}

/// Parse a hex address, rejecting the zero address
pub fn parse_nonzero_address(addr: &str, what: &str) -> Result<Address, ScriptError> {
    let parsed = parse_address(addr, what)?;
    if parsed.is_zero() {
        return Err(ScriptError::InvalidConfig(format!(
            "{what}: the zero address is not allowed"
        )));
    }

    Ok(parsed)
}

/// Parse a 32-byte hex identifier, e.g. an attestation UID
pub fn parse_b256(value: &str, what: &str) -> Result<B256, ScriptError> {
    B256::from_str(value.trim())
        .map_err(|e| ScriptError::InvalidConfig(format!("{what}: invalid bytes32 `{value}`: {e}")))
}

/// Parse a decimal amount of ether (e.g. `"0.0005"`) into wei
pub fn parse_ether_amount(amount: &str, what: &str) -> Result<U256, ScriptError> {
    let amount = amount.trim();
    if amount.starts_with('-') {
        return Err(ScriptError::InvalidConfig(format!(
            "{what}: negative amount `{amount}`"
        )));
    }

    parse_ether(amount)
        .map_err(|e| ScriptError::InvalidConfig(format!("{what}: invalid amount `{amount}`: {e}")))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use alloy::primitives::address;

    use super::*;

    const CONFIG: &str = r#"{
        "artifacts": {
            "pledge_post": "out/PledgePost.sol/PledgePost.json"
        },
        "networks": {
            "localhost": {
                "rpc_url": "http://127.0.0.1:8545",
                "chain_id": 31337
            },
            "optimism": {
                "rpc_url": "https://mainnet.optimism.io",
                "chain_id": 10,
                "contracts": {
                    "EAS": "0x4200000000000000000000000000000000000021",
                    "EASVerification": "0x4c952fCbbccde7d0B87eD716c33360cAa6C056f0"
                }
            }
        }
    }"#;

    #[test]
    fn test_select_network() {
        let config = ScriptsConfig::parse(CONFIG, "optimism").unwrap();

        assert_eq!(config.network.name, "optimism");
        assert_eq!(config.network.chain_id, 10);
        assert_eq!(config.network.rpc_url.as_str(), "https://mainnet.optimism.io/");
        assert_eq!(
            config.network.contracts["EAS"],
            address!("4200000000000000000000000000000000000021")
        );
    }

    #[test]
    fn test_artifact_defaults() {
        let config = ScriptsConfig::parse(CONFIG, "localhost").unwrap();

        assert_eq!(
            config.artifacts.pledge_post,
            PathBuf::from("out/PledgePost.sol/PledgePost.json")
        );
        assert_eq!(config.artifacts.proxy, ArtifactPaths::default().proxy);
        assert!(config.network.contracts.is_empty());
    }

    #[test]
    fn test_unknown_network_lists_available() {
        let err = ScriptsConfig::parse(CONFIG, "goerli").unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("goerli"));
        assert!(msg.contains("localhost, optimism"));
    }

    #[test]
    fn test_reject_bad_contract_address() {
        let config = r#"{
            "networks": {
                "sepolia": {
                    "rpc_url": "https://rpc.sepolia.org",
                    "chain_id": 11155111,
                    "contracts": { "PledgePostProxy": "0x1234" }
                }
            }
        }"#;

        assert!(matches!(
            ScriptsConfig::parse(config, "sepolia"),
            Err(ScriptError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_reject_bad_rpc_url() {
        let config = r#"{
            "networks": { "local": { "rpc_url": "ws://127.0.0.1:8546", "chain_id": 1337 } }
        }"#;
        assert!(ScriptsConfig::parse(config, "local").is_err());

        let config = r#"{
            "networks": { "local": { "rpc_url": "not a url", "chain_id": 1337 } }
        }"#;
        assert!(ScriptsConfig::parse(config, "local").is_err());
    }

    #[test]
    fn test_reject_unknown_fields() {
        let config = r#"{
            "networks": { "local": { "rpc": "http://127.0.0.1:8545", "chain_id": 1337 } }
        }"#;

        assert!(matches!(
            ScriptsConfig::parse(config, "local"),
            Err(ScriptError::ConfigParsing(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let config = ScriptsConfig::load(file.path(), "localhost").unwrap();
        assert_eq!(config.network.chain_id, 31337);
    }

    #[test]
    fn test_address_checksum() {
        // Correct EIP-55 checksum
        assert!(parse_address("0x06aa005386F53Ba7b980c61e0D067CaBc7602a62", "admin").is_ok());
        // Single-case addresses carry no checksum
        assert!(parse_address("0x06aa005386f53ba7b980c61e0d067cabc7602a62", "admin").is_ok());
        // A flipped letter breaks the checksum
        assert!(parse_address("0x06aa005386F53Ba7b980c61e0D067CaBc7602A62", "admin").is_err());
    }

    #[test]
    fn test_address_rejects_empty_and_zero() {
        assert!(parse_address("", "admin").is_err());
        assert!(parse_address("0x0000000000000000000000000000000000000000", "admin").is_ok());
        assert!(
            parse_nonzero_address("0x0000000000000000000000000000000000000000", "admin").is_err()
        );
    }

    #[test]
    fn test_parse_ether_amount() {
        assert_eq!(
            parse_ether_amount("0.0005", "fee").unwrap(),
            U256::from(500_000_000_000_000u64)
        );
        assert_eq!(parse_ether_amount("1", "fee").unwrap(), U256::from(10u64).pow(U256::from(18)));
        assert!(parse_ether_amount("-1", "fee").is_err());
        assert!(parse_ether_amount("abc", "fee").is_err());
    }

    #[test]
    fn test_parse_b256() {
        let uid = "0xc3f45c5af0a43a9575e6fc92d84ecb2ffdd77b568bea27d06cb00b71e3d7f68b";
        assert_eq!(parse_b256(uid, "uid").unwrap().to_string(), uid);
        assert!(parse_b256("0xc3f4", "uid").is_err());
    }

    #[test]
    fn test_shipped_networks_config() {
        let shipped = include_str!("../../networks.json");

        for network in ["localhost", "sepolia", "optimism", "optimismGoerli", "scrollSepolia"] {
            ScriptsConfig::parse(shipped, network).unwrap();
        }

        let optimism = ScriptsConfig::parse(shipped, "optimism").unwrap();
        assert_eq!(optimism.artifacts, ArtifactPaths::default());
        assert!(optimism.network.contracts.contains_key("EASVerification"));
    }
}
