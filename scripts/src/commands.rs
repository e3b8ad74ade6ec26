//! Implementations of the contract management operations

use alloy::primitives::{Address, Bytes, B256, U256};
use tracing::{error, info, warn};

use crate::{
    artifacts::load_creation_code,
    config::ArtifactPaths,
    constants::{
        EAS_KEY, EAS_VERIFICATION_KEY, PLEDGE_POST_IMPLEMENTATION_KEY, PLEDGE_POST_PROXY_ADMIN_KEY,
        PLEDGE_POST_PROXY_KEY, PROXY_ADMIN_STORAGE_SLOT, PROXY_IMPLEMENTATION_STORAGE_SLOT,
    },
    deployments::Deployments,
    errors::ScriptError,
    plan::{Plan, Round, Step},
    solidity::{IEASVerification, IPledgePost, IPledgePostInstance, IProxyAdmin},
    utils::{
        deploy_contract, pledge_post_initialize_calldata, proxy_constructor_args,
        read_address_slot, send_tx, verification_constructor_args, ChainClient, Client,
    },
};

/// Everything an operation needs: the chain client, the network's address
/// book, and the compiled artifacts to deploy from
pub struct ScriptContext {
    /// The client for the selected network
    pub client: ChainClient,
    /// The network's address book
    pub deployments: Deployments,
    /// Paths to the compiled contract artifacts
    pub artifacts: ArtifactPaths,
}

/// The addresses produced by a PledgePost proxy deployment
#[derive(Clone, Copy, Debug)]
pub struct ProxyDeployment {
    /// The proxy, the stable address of PledgePost
    pub proxy: Address,
    /// The `ProxyAdmin` created by the proxy's constructor
    pub proxy_admin: Address,
    /// The implementation the proxy delegates to
    pub implementation: Address,
}

/// Execute the steps of a plan in order, stopping at the first failure
pub async fn run_plan(plan: &Plan, ctx: &mut ScriptContext) -> Result<(), ScriptError> {
    let num_steps = plan.steps.len();
    for (i, step) in plan.steps.iter().enumerate() {
        info!("step {}/{num_steps}: {step}", i + 1);
        if let Err(e) = execute_step(step, ctx).await {
            error!("step {}/{num_steps} ({step}) failed: {e}", i + 1);
            return Err(e);
        }
    }

    Ok(())
}

/// Execute a single step
pub async fn execute_step(step: &Step, ctx: &mut ScriptContext) -> Result<(), ScriptError> {
    match step {
        Step::DeployProxy {
            owner,
            minimum_pledge,
            proxy_admin_owner,
        } => {
            deploy_proxy(ctx, *owner, *minimum_pledge, *proxy_admin_owner).await?;
        }
        Step::Upgrade {
            proxy,
            implementation,
            calldata,
        } => {
            upgrade(ctx, *proxy, *implementation, calldata.clone()).await?;
        }
        Step::AddAdmin { admin, proxy } => {
            add_admin(ctx, *proxy, *admin).await?;
        }
        Step::CreateRound { round, proxy } => {
            create_round(ctx, *proxy, round).await?;
        }
        Step::PostArticle { content, proxy } => {
            post_article(ctx, *proxy, content).await?;
        }
        Step::DeployVerification { eas } => {
            deploy_verification(ctx, *eas).await?;
        }
        Step::GetScore {
            uid,
            subject,
            verification,
        } => {
            get_score(ctx, *verification, *uid, *subject).await?;
        }
    }

    Ok(())
}

/// Deploy the PledgePost contract behind a `TransparentUpgradeableProxy`.
///
/// The proxy's constructor deploys a `ProxyAdmin` owned by `proxy_admin_owner`
/// (the sender by default) and calls `initialize(owner, minimum_pledge)` on the
/// implementation through the proxy. Upgrade calls can only be made to the
/// proxy through the `ProxyAdmin`.
pub async fn deploy_proxy(
    ctx: &mut ScriptContext,
    owner: Address,
    minimum_pledge: U256,
    proxy_admin_owner: Option<Address>,
) -> Result<ProxyDeployment, ScriptError> {
    let proxy_admin_owner = match proxy_admin_owner {
        Some(addr) => addr,
        None => ctx.client.sender()?,
    };

    // Load both artifacts before sending anything
    let proxy_code = load_creation_code(&ctx.artifacts.proxy)?;
    let implementation = deploy_pledge_post_implementation(ctx).await?;

    let init_calldata = pledge_post_initialize_calldata(owner, minimum_pledge);
    let proxy = deploy_contract(
        ctx.client.provider(),
        &proxy_code,
        &proxy_constructor_args(implementation, proxy_admin_owner, init_calldata),
    )
    .await?;

    // This is the recommended way to get the proxy admin address:
    // https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Utils.sol#L104-L106
    let proxy_admin =
        read_address_slot(ctx.client.provider(), proxy, PROXY_ADMIN_STORAGE_SLOT).await?;

    // Recorded together once the proxy is live, so a failed deployment leaves
    // the address book untouched
    ctx.deployments.record_all(&[
        (PLEDGE_POST_PROXY_KEY, proxy),
        (PLEDGE_POST_PROXY_ADMIN_KEY, proxy_admin),
        (PLEDGE_POST_IMPLEMENTATION_KEY, implementation),
    ])?;

    println!("Contract deployed to: {proxy:#x}");
    println!("Proxy admin contract deployed at {proxy_admin:#x}");
    println!("Implementation contract deployed at {implementation:#x}");

    Ok(ProxyDeployment {
        proxy,
        proxy_admin,
        implementation,
    })
}

/// Deploy a fresh PledgePost implementation contract.
///
/// The implementation is not recorded here: it only becomes the proxy's
/// implementation once the proxy deployment or upgrade succeeds.
async fn deploy_pledge_post_implementation(ctx: &ScriptContext) -> Result<Address, ScriptError> {
    let code = load_creation_code(&ctx.artifacts.pledge_post)?;
    deploy_contract(ctx.client.provider(), &code, &[]).await
}

/// Upgrade the implementation behind the PledgePost proxy.
///
/// Deploys a new implementation unless one is given, then calls
/// `upgradeAndCall` on the proxy's `ProxyAdmin`. The proxy keeps its address;
/// only the EIP-1967 implementation slot changes. Returns the new implementation.
pub async fn upgrade(
    ctx: &mut ScriptContext,
    proxy: Option<Address>,
    implementation: Option<Address>,
    calldata: Bytes,
) -> Result<Address, ScriptError> {
    let proxy = ctx.deployments.resolve(proxy, PLEDGE_POST_PROXY_KEY)?;
    let sender = ctx.client.sender()?;
    let client = ctx.client.provider().clone();

    let proxy_admin = read_address_slot(&client, proxy, PROXY_ADMIN_STORAGE_SLOT).await?;
    if proxy_admin.is_zero() {
        return Err(ScriptError::ContractInteraction(format!(
            "{proxy:#x} has no admin in its EIP-1967 admin slot, is it a transparent proxy?"
        )));
    }

    let proxy_admin_contract = IProxyAdmin::new(proxy_admin, client.clone());
    let admin_owner = proxy_admin_contract
        .owner()
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    if admin_owner != sender {
        return Err(ScriptError::ContractInteraction(format!(
            "sender {sender:#x} does not own the proxy admin {proxy_admin:#x} (owner is {admin_owner:#x})"
        )));
    }

    let previous = read_address_slot(&client, proxy, PROXY_IMPLEMENTATION_STORAGE_SLOT).await?;
    let implementation = match implementation {
        Some(implementation) => implementation,
        None => deploy_pledge_post_implementation(ctx).await?,
    };
    if implementation == previous {
        warn!("proxy {proxy:#x} already delegates to {implementation:#x}");
    }

    send_tx(proxy_admin_contract.upgradeAndCall(proxy, implementation, calldata)).await?;

    let current = read_address_slot(&client, proxy, PROXY_IMPLEMENTATION_STORAGE_SLOT).await?;
    if current != implementation {
        return Err(ScriptError::ContractInteraction(format!(
            "proxy {proxy:#x} delegates to {current:#x} after upgrading to {implementation:#x}"
        )));
    }

    ctx.deployments
        .record(PLEDGE_POST_IMPLEMENTATION_KEY, implementation)?;

    println!("implementation upgraded to: {implementation:#x}");
    println!("proxy address unchanged: {proxy:#x}");
    Ok(implementation)
}

/// Get a handle to the PledgePost proxy, checking that a signer is attached
fn pledge_post(
    ctx: &ScriptContext,
    proxy: Option<Address>,
) -> Result<IPledgePostInstance<Client>, ScriptError> {
    ctx.client.sender()?;
    let proxy = ctx.deployments.resolve(proxy, PLEDGE_POST_PROXY_KEY)?;

    Ok(IPledgePost::new(proxy, ctx.client.provider().clone()))
}

/// Grant the admin role on PledgePost
pub async fn add_admin(
    ctx: &ScriptContext,
    proxy: Option<Address>,
    admin: Address,
) -> Result<B256, ScriptError> {
    let contract = pledge_post(ctx, proxy)?;
    let receipt = send_tx(contract.addAdmin(admin)).await?;

    println!("Admin added: {admin:#x}");
    Ok(receipt.transaction_hash)
}

/// Create a funding round on PledgePost.
///
/// Not idempotent: every call creates another round.
pub async fn create_round(
    ctx: &ScriptContext,
    proxy: Option<Address>,
    round: &Round,
) -> Result<B256, ScriptError> {
    let contract = pledge_post(ctx, proxy)?;
    let receipt = send_tx(contract.createRound(
        round.title.clone(),
        round.description.clone(),
        U256::from(round.start),
        U256::from(round.end),
    ))
    .await?;

    println!("Round created");
    Ok(receipt.transaction_hash)
}

/// Publish an article reference on PledgePost.
///
/// Not idempotent: every call posts the article again.
pub async fn post_article(
    ctx: &ScriptContext,
    proxy: Option<Address>,
    content: &str,
) -> Result<B256, ScriptError> {
    let contract = pledge_post(ctx, proxy)?;
    let receipt = send_tx(contract.postArticle(content.to_string())).await?;

    println!("Article posted");
    Ok(receipt.transaction_hash)
}

/// Deploy the EASVerification contract, reading from the given EAS registry
pub async fn deploy_verification(
    ctx: &mut ScriptContext,
    eas: Option<Address>,
) -> Result<Address, ScriptError> {
    ctx.client.sender()?;
    let eas = ctx.deployments.resolve(eas, EAS_KEY)?;

    let code = load_creation_code(&ctx.artifacts.eas_verification)?;
    let address = deploy_contract(
        ctx.client.provider(),
        &code,
        &verification_constructor_args(eas),
    )
    .await?;
    ctx.deployments.record(EAS_VERIFICATION_KEY, address)?;

    println!("Contract deployed at address: {address:#x}");
    Ok(address)
}

/// Read the passport attestation score of `subject` under the schema `uid`
pub async fn get_score(
    ctx: &ScriptContext,
    verification: Option<Address>,
    uid: B256,
    subject: Address,
) -> Result<U256, ScriptError> {
    let verification = ctx.deployments.resolve(verification, EAS_VERIFICATION_KEY)?;
    let contract = IEASVerification::new(verification, ctx.client.provider().clone());

    let score = contract
        .getPassportAttestation(uid, subject)
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    println!("score: {score}");
    Ok(score)
}
