//! Constants used in the integration tests

/// The networks config entry of the local devnet node
pub(crate) const DEFAULT_DEVNET_NETWORK: &str = "localhost";

/// The default private key that the devnet is seeded with, the first default Anvil / Hardhat account
pub(crate) const DEFAULT_DEVNET_PKEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// The minimum pledge the test PledgePost deployments are initialized with, in ether
pub(crate) const TEST_MINIMUM_PLEDGE: &str = "0.0005";

/// The attestation schema UID queried in the score test
pub(crate) const DEFAULT_SCORE_UID: &str =
    "0xc3f45c5af0a43a9575e6fc92d84ecb2ffdd77b568bea27d06cb00b71e3d7f68b";

/// The subject queried in the score test
pub(crate) const DEFAULT_SCORE_SUBJECT: &str = "0x63b1EfC5602C0023BBb373F2350Cf34c2E5F8669";

/// The content identifier posted in the article tests
pub(crate) const TEST_ARTICLE_CONTENT: &str =
    "bafybeihibat5imkafg6kb27nqseqkyitthfhvlcoruqv7gcqokxlsbdg44";
