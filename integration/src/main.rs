//! Integration tests for the contract management scripts. These assume that a devnet is already running locally.

use clap::Parser;
use cli::{Cli, Tests};
use eyre::Result;
use scripts::config::{parse_address, parse_b256};
use tests::{
    test_admin_calls, test_deploy_proxy, test_revert_propagates, test_round_not_idempotent,
    test_score_stable, test_upgrade,
};
use tracing::info;
use utils::{setup_context, setup_unfunded_context};

mod cli;
mod constants;
mod tests;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        test,
        config,
        network,
        deployments_file,
        priv_key,
        uid,
        subject,
    } = Cli::parse();

    tracing_subscriber::fmt().pretty().init();

    let uid = parse_b256(&uid, "uid")?;
    let subject = parse_address(&subject, "subject")?;
    let mut ctx = setup_context(&config, &network, &deployments_file, &priv_key).await?;

    let run_all = test == Tests::All;
    if run_all || test == Tests::DeployProxy {
        test_deploy_proxy(&mut ctx).await?;
        info!("deploy-proxy passed");
    }
    if run_all || test == Tests::Upgrade {
        test_upgrade(&mut ctx).await?;
        info!("upgrade passed");
    }
    if run_all || test == Tests::AdminCalls {
        test_admin_calls(&mut ctx).await?;
        info!("admin-calls passed");
    }
    if run_all || test == Tests::RoundNotIdempotent {
        test_round_not_idempotent(&mut ctx).await?;
        info!("round-not-idempotent passed");
    }
    if run_all || test == Tests::RevertPropagates {
        let unfunded_ctx = setup_unfunded_context(&ctx, &config, &network).await?;
        test_revert_propagates(&mut ctx, &unfunded_ctx).await?;
        info!("revert-propagates passed");
    }
    // Needs an EASVerification deployment and an EAS registry, so it is not part of `all`
    if test == Tests::ScoreStable {
        test_score_stable(&ctx, uid, subject).await?;
        info!("score-stable passed");
    }

    Ok(())
}
