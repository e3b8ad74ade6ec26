//! Constants used in the contract management scripts

use alloy_primitives::{b256, B256};

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: B256 =
    b256!("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");

/// The storage slot containing the implementation contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const PROXY_IMPLEMENTATION_STORAGE_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The default path of the networks config file
pub const DEFAULT_CONFIG_PATH: &str = "networks.json";

/// The prefix of the default per-network deployments file,
/// completed as `deployments.<network>.json`
pub const DEPLOYMENTS_FILE_PREFIX: &str = "deployments";

/// The default path of the PledgePost compilation artifact, in hardhat's layout
pub const DEFAULT_PLEDGE_POST_ARTIFACT: &str =
    "artifacts/contracts/PledgePost.sol/PledgePost.json";

/// The default path of the EASVerification compilation artifact, in hardhat's layout
pub const DEFAULT_EAS_VERIFICATION_ARTIFACT: &str =
    "artifacts/contracts/EASVerification.sol/EASVerification.json";

/// The default path of the TransparentUpgradeableProxy compilation artifact.
///
/// Compiled from https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/transparent/TransparentUpgradeableProxy.sol
pub const DEFAULT_PROXY_ARTIFACT: &str = "artifacts/@openzeppelin/contracts/proxy/transparent/TransparentUpgradeableProxy.sol/TransparentUpgradeableProxy.json";

/// The PledgePost proxy contract key in the deployments file
pub const PLEDGE_POST_PROXY_KEY: &str = "PledgePostProxy";

/// The PledgePost proxy admin contract key in the deployments file
pub const PLEDGE_POST_PROXY_ADMIN_KEY: &str = "PledgePostProxyAdmin";

/// The PledgePost implementation contract key in the deployments file
pub const PLEDGE_POST_IMPLEMENTATION_KEY: &str = "PledgePostImplementation";

/// The EASVerification contract key in the deployments file
pub const EAS_VERIFICATION_KEY: &str = "EASVerification";

/// The EAS registry contract key in the deployments file
pub const EAS_KEY: &str = "EAS";
