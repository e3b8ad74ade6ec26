//! Utilities for the contract management scripts.

use std::str::FromStr;

use alloy::{
    contract::{CallBuilder, CallDecoder},
    network::{Ethereum, TransactionBuilder},
    primitives::{Address, Bytes, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    sol_types::{SolCall, SolValue},
    transports::http::reqwest::Url,
};
use tracing::{debug, info};

use crate::{
    constants::{NUM_BYTES_ADDRESS, NUM_BYTES_STORAGE_SLOT},
    errors::ScriptError,
    solidity::initializeCall,
};

/// The provider type used by the scripts
pub type Client = DynProvider<Ethereum>;

/// The call builder type produced by contract instances over a [`Client`]
pub type ScriptCallBuilder<'a, C> = CallBuilder<&'a Client, C, Ethereum>;

/// An RPC client for the selected network, with the sender's address when a
/// private key was given
#[derive(Clone)]
pub struct ChainClient {
    /// The type-erased provider
    provider: Client,
    /// The address transactions are sent from
    sender: Option<Address>,
}

impl ChainClient {
    /// Connect to the given endpoint, signing with `priv_key` if given, and
    /// check that the endpoint serves the expected chain
    pub async fn connect(
        rpc_url: Url,
        priv_key: Option<&str>,
        expected_chain_id: u64,
    ) -> Result<Self, ScriptError> {
        let (provider, sender) = match priv_key {
            Some(priv_key) => {
                let signer = PrivateKeySigner::from_str(priv_key.trim())
                    .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
                let sender = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(signer)
                    .connect_http(rpc_url)
                    .erased();

                (provider, Some(sender))
            }
            None => (ProviderBuilder::new().connect_http(rpc_url).erased(), None),
        };

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
        if chain_id != expected_chain_id {
            return Err(ScriptError::ClientInitialization(format!(
                "endpoint serves chain {chain_id}, expected chain {expected_chain_id}"
            )));
        }

        debug!("connected to chain {chain_id}");
        Ok(Self { provider, sender })
    }

    /// The underlying provider
    pub fn provider(&self) -> &Client {
        &self.provider
    }

    /// The address transactions are sent from
    pub fn sender(&self) -> Result<Address, ScriptError> {
        self.sender.ok_or_else(|| {
            ScriptError::ClientInitialization(
                "a private key is required to send transactions".to_string(),
            )
        })
    }
}

/// Fail if a mined transaction's receipt reports a revert
pub fn ensure_success(receipt: TransactionReceipt) -> Result<TransactionReceipt, ScriptError> {
    if !receipt.status() {
        return Err(ScriptError::TransactionReverted(format!(
            "{:#x}",
            receipt.transaction_hash
        )));
    }

    info!(
        "transaction {:#x} confirmed in block {:?}, gas used {}",
        receipt.transaction_hash, receipt.block_number, receipt.gas_used
    );
    Ok(receipt)
}

/// Send a contract call and wait for it to be mined successfully
pub async fn send_tx<C: CallDecoder>(
    tx: ScriptCallBuilder<'_, C>,
) -> Result<TransactionReceipt, ScriptError> {
    let pending_tx = tx
        .send()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    info!("sent transaction {:#x}, awaiting receipt", pending_tx.tx_hash());

    let receipt = pending_tx
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    ensure_success(receipt)
}

/// Deploy a contract from its creation code and ABI-encoded constructor
/// arguments, returning its address once the deployment is mined
pub async fn deploy_contract(
    client: &Client,
    creation_code: &Bytes,
    constructor_args: &[u8],
) -> Result<Address, ScriptError> {
    let code: Bytes = [creation_code.as_ref(), constructor_args].concat().into();
    let tx = TransactionRequest::default().with_deploy_code(code);

    let pending_tx = client
        .send_transaction(tx)
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;
    info!("sent deployment {:#x}, awaiting receipt", pending_tx.tx_hash());

    let receipt = pending_tx
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;
    let receipt = ensure_success(receipt)?;

    match receipt.contract_address {
        Some(address) if !address.is_zero() => Ok(address),
        _ => Err(ScriptError::ContractDeployment(format!(
            "receipt of {:#x} carries no contract address",
            receipt.transaction_hash
        ))),
    }
}

/// Extract the address stored in the low-order bytes of a storage word
pub fn address_from_slot_word(word: U256) -> Address {
    let bytes = word.to_be_bytes::<NUM_BYTES_STORAGE_SLOT>();
    Address::from_slice(&bytes[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..NUM_BYTES_STORAGE_SLOT])
}

/// Read an address out of a contract's storage slot
pub async fn read_address_slot(
    client: &Client,
    contract: Address,
    slot: B256,
) -> Result<Address, ScriptError> {
    let word = client
        .get_storage_at(contract, U256::from_be_bytes(slot.0))
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    Ok(address_from_slot_word(word))
}

/// Prepare calldata for the PledgePost contract's `initialize` method
pub fn pledge_post_initialize_calldata(owner: Address, minimum_pledge: U256) -> Bytes {
    initializeCall {
        owner,
        minimumPledge: minimum_pledge,
    }
    .abi_encode()
    .into()
}

/// ABI-encode the `TransparentUpgradeableProxy` constructor arguments
pub fn proxy_constructor_args(
    implementation: Address,
    initial_owner: Address,
    init_calldata: Bytes,
) -> Vec<u8> {
    (implementation, initial_owner, init_calldata).abi_encode_params()
}

/// ABI-encode the `EASVerification` constructor arguments
pub fn verification_constructor_args(eas: Address) -> Vec<u8> {
    (eas,).abi_encode_params()
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, b256, keccak256};
    use serde_json::json;

    use super::*;
    use crate::constants::PROXY_ADMIN_STORAGE_SLOT;

    const OWNER: Address = address!("9B789cc315F1eedFbCBE759DEbb5a3D5D41B788f");
    const TX_HASH: B256 =
        b256!("c3f45c5af0a43a9575e6fc92d84ecb2ffdd77b568bea27d06cb00b71e3d7f68b");

    /// A mined EIP-1559 receipt with the given status
    fn receipt_with_status(status: &str) -> TransactionReceipt {
        serde_json::from_value(json!({
            "type": "0x2",
            "status": status,
            "cumulativeGasUsed": "0x5208",
            "logs": [],
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "transactionHash": TX_HASH,
            "transactionIndex": "0x0",
            "blockHash": "0x63b1efc5602c0023bbb373f2350cf34c2e5f866963b1efc5602c0023bbb373f2",
            "blockNumber": "0x10",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "from": OWNER,
            "to": "0x4200000000000000000000000000000000000021",
            "contractAddress": null
        }))
        .unwrap()
    }

    #[test]
    fn test_reverted_receipt_is_an_error() {
        let res = ensure_success(receipt_with_status("0x0"));
        match res {
            Err(ScriptError::TransactionReverted(hash)) => {
                assert_eq!(hash, format!("{TX_HASH:#x}"))
            }
            other => panic!("expected a reverted transaction error, got {other:?}"),
        }
    }

    #[test]
    fn test_successful_receipt_passes_through() {
        let receipt = ensure_success(receipt_with_status("0x1")).unwrap();
        assert!(receipt.status());
        assert_eq!(receipt.transaction_hash, TX_HASH);
    }

    #[test]
    fn test_address_from_slot_word() {
        let mut word = [0u8; NUM_BYTES_STORAGE_SLOT];
        word[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..].copy_from_slice(OWNER.as_slice());

        assert_eq!(address_from_slot_word(U256::from_be_bytes(word)), OWNER);
        assert_eq!(address_from_slot_word(U256::ZERO), Address::ZERO);
    }

    #[test]
    fn test_admin_slot_matches_eip1967() {
        // bytes32(uint256(keccak256("eip1967.proxy.admin")) - 1)
        let slot = U256::from_be_bytes(keccak256("eip1967.proxy.admin").0) - U256::from(1);
        assert_eq!(B256::from(slot), PROXY_ADMIN_STORAGE_SLOT);
    }

    #[test]
    fn test_initialize_calldata() {
        let minimum_pledge = U256::from(500_000_000_000_000u64);
        let calldata = pledge_post_initialize_calldata(OWNER, minimum_pledge);

        let selector = &keccak256("initialize(address,uint256)")[..4];
        assert_eq!(&calldata[..4], selector);
        assert_eq!(calldata.len(), 4 + 2 * 32);

        let decoded = initializeCall::abi_decode(&calldata).unwrap();
        assert_eq!(decoded.owner, OWNER);
        assert_eq!(decoded.minimumPledge, minimum_pledge);
    }

    #[test]
    fn test_proxy_constructor_args() {
        let implementation = address!("D62087Bf50dCd6dD87f96E21d1AD040bD9c99589");
        let init = pledge_post_initialize_calldata(OWNER, U256::from(1));
        let encoded = proxy_constructor_args(implementation, OWNER, init.clone());

        let (decoded_impl, decoded_owner, decoded_init) =
            <(Address, Address, Bytes)>::abi_decode_params(&encoded).unwrap();
        assert_eq!(decoded_impl, implementation);
        assert_eq!(decoded_owner, OWNER);
        assert_eq!(decoded_init, init);
    }

    #[test]
    fn test_verification_constructor_args() {
        let eas = address!("4200000000000000000000000000000000000021");
        let encoded = verification_constructor_args(eas);

        assert_eq!(encoded.len(), 32);
        assert_eq!(&encoded[12..], eas.as_slice());
    }
}
