//! Definitions of the Solidity interfaces called by the scripts

use alloy::sol;

alloy_sol_types::sol! {
    /// The PledgePost initializer, invoked by the proxy's constructor
    function initialize(address owner, uint256 minimumPledge) external;
}

sol! {
    /// The administrative surface of the PledgePost contract
    #[sol(rpc)]
    interface IPledgePost {
        function addAdmin(address admin) external;
        function createRound(
            string memory title,
            string memory description,
            uint256 startDate,
            uint256 endDate
        ) external;
        function postArticle(string memory contentHash) external;
    }
}

sol! {
    /// The read surface of the EASVerification contract
    #[sol(rpc)]
    interface IEASVerification {
        function getPassportAttestation(bytes32 uid, address subject)
            external
            view
            returns (uint256 score);
    }
}

sol! {
    /// The OpenZeppelin v5 `ProxyAdmin`, owner of a `TransparentUpgradeableProxy`
    #[sol(rpc)]
    interface IProxyAdmin {
        function owner() external view returns (address);
        function upgradeAndCall(address proxy, address implementation, bytes memory data)
            external
            payable;
    }
}

pub use IPledgePost::IPledgePostInstance;
