//! Integration tests for the contract management scripts

use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, Bytes, B256},
    providers::Provider,
};
use eyre::{eyre, Result};
use scripts::{
    commands::{add_admin, create_round, get_score, post_article, upgrade, ScriptContext},
    constants::{
        PLEDGE_POST_IMPLEMENTATION_KEY, PROXY_ADMIN_STORAGE_SLOT, PROXY_IMPLEMENTATION_STORAGE_SLOT,
    },
    plan::Round,
    utils::read_address_slot,
};
use tracing::info;

use crate::{
    constants::TEST_ARTICLE_CONTENT,
    utils::{assert_has_code, assert_tx_success, deploy_test_proxy},
};

/// A round spanning the 30 days following the given timestamp
fn test_round(start: u64) -> Round {
    Round {
        title: "Integration Round".to_string(),
        description: "A round created by the integration tests".to_string(),
        start,
        end: start + 30 * 24 * 60 * 60,
    }
}

/// Deploying behind a proxy yields non-zero proxy and admin addresses, with the
/// proxy delegating to the freshly deployed implementation
pub(crate) async fn test_deploy_proxy(ctx: &mut ScriptContext) -> Result<()> {
    let deployment = deploy_test_proxy(ctx).await?;
    let client = ctx.client.provider().clone();

    assert_ne!(deployment.proxy, Address::ZERO, "Proxy deployed at zero address");
    assert_ne!(deployment.proxy_admin, Address::ZERO, "Proxy admin is zero address");
    assert_has_code(&client, deployment.proxy).await?;
    assert_has_code(&client, deployment.proxy_admin).await?;

    let implementation =
        read_address_slot(&client, deployment.proxy, PROXY_IMPLEMENTATION_STORAGE_SLOT).await?;
    assert_eq!(
        implementation, deployment.implementation,
        "Proxy does not delegate to the deployed implementation"
    );

    Ok(())
}

/// Upgrading keeps the proxy's address and admin, and changes only its implementation
pub(crate) async fn test_upgrade(ctx: &mut ScriptContext) -> Result<()> {
    let deployment = deploy_test_proxy(ctx).await?;
    let client = ctx.client.provider().clone();

    let new_implementation =
        upgrade(ctx, Some(deployment.proxy), None /* implementation */, Bytes::new()).await?;
    assert_ne!(
        new_implementation, deployment.implementation,
        "Upgrade did not deploy a new implementation"
    );

    assert_eq!(
        ctx.deployments.get(PLEDGE_POST_IMPLEMENTATION_KEY),
        Some(new_implementation),
        "Upgraded implementation not recorded"
    );
    assert_has_code(&client, deployment.proxy).await?;

    let implementation =
        read_address_slot(&client, deployment.proxy, PROXY_IMPLEMENTATION_STORAGE_SLOT).await?;
    assert_eq!(implementation, new_implementation, "Implementation slot not updated");

    let proxy_admin =
        read_address_slot(&client, deployment.proxy, PROXY_ADMIN_STORAGE_SLOT).await?;
    assert_eq!(proxy_admin, deployment.proxy_admin, "Proxy admin changed across the upgrade");

    Ok(())
}

/// Each administrative call returns only once its transaction is confirmed
pub(crate) async fn test_admin_calls(ctx: &mut ScriptContext) -> Result<()> {
    let deployment = deploy_test_proxy(ctx).await?;
    let proxy = Some(deployment.proxy);
    let client = ctx.client.provider().clone();
    let admin = ctx.client.sender()?;

    let tx_hash = add_admin(ctx, proxy, admin).await?;
    assert_tx_success(&client, tx_hash).await?;

    let tx_hash = create_round(ctx, proxy, &test_round(latest_timestamp(ctx).await?)).await?;
    assert_tx_success(&client, tx_hash).await?;

    let tx_hash = post_article(ctx, proxy, TEST_ARTICLE_CONTENT).await?;
    assert_tx_success(&client, tx_hash).await?;

    Ok(())
}

/// Creating the same round twice creates two rounds: the call is not idempotent
pub(crate) async fn test_round_not_idempotent(ctx: &mut ScriptContext) -> Result<()> {
    let deployment = deploy_test_proxy(ctx).await?;
    let proxy = Some(deployment.proxy);
    let client = ctx.client.provider().clone();

    let admin = ctx.client.sender()?;
    add_admin(ctx, proxy, admin).await?;

    let round = test_round(latest_timestamp(ctx).await?);
    let first: B256 = create_round(ctx, proxy, &round).await?;
    let second: B256 = create_round(ctx, proxy, &round).await?;

    assert_ne!(first, second, "Second round creation was deduplicated");
    assert_tx_success(&client, first).await?;
    assert_tx_success(&client, second).await?;

    info!("identical rounds created by {first:#x} and {second:#x}");
    Ok(())
}

/// A transaction that cannot be mined surfaces as an error rather than a no-op
pub(crate) async fn test_revert_propagates(
    ctx: &mut ScriptContext,
    unfunded_ctx: &ScriptContext,
) -> Result<()> {
    let deployment = deploy_test_proxy(ctx).await?;
    let admin = unfunded_ctx.client.sender()?;

    let res = add_admin(unfunded_ctx, Some(deployment.proxy), admin).await;
    assert!(res.is_err(), "Unfunded, unauthorized admin grant succeeded");

    Ok(())
}

/// Reading an attestation score twice, with no transaction in between, yields the same value
pub(crate) async fn test_score_stable(
    ctx: &ScriptContext,
    uid: B256,
    subject: Address,
) -> Result<()> {
    let first = get_score(ctx, None /* verification */, uid, subject).await?;
    let second = get_score(ctx, None /* verification */, uid, subject).await?;

    assert_eq!(first, second, "Attestation score changed between reads");
    Ok(())
}

/// The timestamp of the latest block
async fn latest_timestamp(ctx: &ScriptContext) -> Result<u64> {
    let block = ctx
        .client
        .provider()
        .get_block_by_number(BlockNumberOrTag::Latest)
        .await?
        .ok_or_else(|| eyre!("no latest block"))?;

    Ok(block.header.timestamp)
}
