//! Utilities for running integration tests

use std::path::Path;

use alloy::{
    primitives::{utils::parse_ether, Address, B256},
    providers::Provider,
    signers::local::PrivateKeySigner,
};
use eyre::{eyre, Result};
use scripts::{
    commands::{deploy_proxy, ProxyDeployment, ScriptContext},
    config::ScriptsConfig,
    deployments::Deployments,
    utils::{ChainClient, Client},
};

use crate::constants::TEST_MINIMUM_PLEDGE;

/// Build the context the script commands run in, signing with `priv_key`
pub(crate) async fn setup_context(
    config_path: &Path,
    network: &str,
    deployments_file: &Path,
    priv_key: &str,
) -> Result<ScriptContext> {
    let ScriptsConfig { network, artifacts } = ScriptsConfig::load(config_path, network)?;
    let deployments = Deployments::load(deployments_file, network.contracts.clone())?;
    let client = ChainClient::connect(network.rpc_url, Some(priv_key), network.chain_id).await?;

    Ok(ScriptContext {
        client,
        deployments,
        artifacts,
    })
}

/// Build a context on the same network whose sender is a fresh, unfunded account
pub(crate) async fn setup_unfunded_context(
    ctx: &ScriptContext,
    config_path: &Path,
    network: &str,
) -> Result<ScriptContext> {
    let signer = PrivateKeySigner::random();
    let priv_key = format!("{:#x}", signer.to_bytes());

    setup_context(config_path, network, ctx.deployments.path(), &priv_key).await
}

/// Deploy a PledgePost proxy owned by the sender
pub(crate) async fn deploy_test_proxy(ctx: &mut ScriptContext) -> Result<ProxyDeployment> {
    let owner = ctx.client.sender()?;
    let minimum_pledge = parse_ether(TEST_MINIMUM_PLEDGE)?;

    Ok(deploy_proxy(ctx, owner, minimum_pledge, None /* proxy_admin_owner */).await?)
}

/// Assert that the given transaction was mined successfully
pub(crate) async fn assert_tx_success(client: &Client, tx_hash: B256) -> Result<()> {
    let receipt = client
        .get_transaction_receipt(tx_hash)
        .await?
        .ok_or_else(|| eyre!("no receipt for {tx_hash:#x}"))?;

    assert!(receipt.status(), "Transaction {tx_hash:#x} reverted");
    Ok(())
}

/// Assert that code is deployed at the given address
pub(crate) async fn assert_has_code(client: &Client, address: Address) -> Result<()> {
    let code = client.get_code_at(address).await?;
    assert!(!code.is_empty(), "No code deployed at {address:#x}");
    Ok(())
}
