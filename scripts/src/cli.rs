//! Definitions of CLI arguments and commands for the contract management scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::{
    commands::{run_plan, ScriptContext},
    config::{parse_rpc_url, ScriptsConfig},
    constants::{DEFAULT_CONFIG_PATH, DEPLOYMENTS_FILE_PREFIX},
    deployments::Deployments,
    errors::ScriptError,
    plan::{Plan, RawStep},
    utils::ChainClient,
};

/// Deploy and administer the PledgePost and EASVerification contracts
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the networks config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// The network to run against, as named in the networks config
    #[arg(short, long, env = "NETWORK")]
    pub network: String,

    /// Network RPC URL, overriding the one in the networks config
    #[arg(short, long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Private key of the sender, required by every command but `get-score`
    // TODO: Better key management
    #[arg(short, long, env = "PKEY", hide_env_values = true)]
    pub priv_key: Option<String>,

    /// Path to the deployments file, defaults to `deployments.<network>.json`
    #[arg(short, long)]
    pub deployments: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    #[allow(missing_docs)]
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The path of the deployments file for the selected network
    pub fn deployments_path(&self) -> PathBuf {
        self.deployments
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{DEPLOYMENTS_FILE_PREFIX}.{}.json", self.network)))
    }

    /// Validate the invocation, connect to the network, and run the command.
    ///
    /// All config, addresses, and arguments are validated before the first
    /// remote call.
    pub async fn run(self) -> Result<(), ScriptError> {
        let ScriptsConfig { network, artifacts } = ScriptsConfig::load(&self.config, &self.network)?;
        let rpc_url = match &self.rpc_url {
            Some(url) => parse_rpc_url(url)?,
            None => network.rpc_url.clone(),
        };

        let deployments = Deployments::load(self.deployments_path(), network.contracts.clone())?;
        let plan = self.command.into_plan()?;
        plan.check_targets(&deployments)?;

        let priv_key = self.priv_key.as_deref();
        if priv_key.is_none() && plan.requires_signer() {
            return Err(ScriptError::ClientInitialization(
                "a private key is required to send transactions, pass --priv-key or set PKEY"
                    .to_string(),
            ));
        }

        info!("running against {} (chain {})", network.name, network.chain_id);
        let client = ChainClient::connect(rpc_url, priv_key, network.chain_id).await?;

        let mut ctx = ScriptContext {
            client,
            deployments,
            artifacts,
        };
        run_plan(&plan, &mut ctx).await
    }
}

/// The operations the scripts can perform
#[derive(Subcommand)]
pub enum Command {
    /// Deploy PledgePost behind a transparent upgradeable proxy
    DeployProxy(DeployProxyArgs),
    /// Upgrade the PledgePost implementation
    Upgrade(UpgradeArgs),
    /// Grant the admin role on PledgePost
    AddAdmin(AddAdminArgs),
    /// Create a funding round on PledgePost
    CreateRound(CreateRoundArgs),
    /// Publish an article reference on PledgePost
    PostArticle(PostArticleArgs),
    /// Deploy the EASVerification contract
    DeployVerification(DeployVerificationArgs),
    /// Read a passport attestation score
    GetScore(GetScoreArgs),
    /// Run the steps of a plan file in order
    RunPlan(RunPlanArgs),
}

impl Command {
    /// Validate the command's arguments into a plan
    pub fn into_plan(self) -> Result<Plan, ScriptError> {
        let step = match self {
            Command::RunPlan(args) => return Plan::load(&args.plan),
            Command::DeployProxy(args) => RawStep::DeployProxy {
                owner: args.owner,
                minimum_pledge: args.minimum_pledge,
                proxy_admin_owner: args.proxy_admin_owner,
            },
            Command::Upgrade(args) => RawStep::Upgrade {
                proxy: args.proxy,
                implementation: args.implementation,
                calldata: args.calldata,
            },
            Command::AddAdmin(args) => RawStep::AddAdmin {
                admin: args.admin,
                proxy: args.proxy,
            },
            Command::CreateRound(args) => RawStep::CreateRound {
                title: args.title,
                description: args.description,
                start: args.start,
                end: args.end,
                proxy: args.proxy,
            },
            Command::PostArticle(args) => RawStep::PostArticle {
                content: args.content,
                proxy: args.proxy,
            },
            Command::DeployVerification(args) => RawStep::DeployVerification { eas: args.eas },
            Command::GetScore(args) => RawStep::GetScore {
                uid: args.uid,
                subject: args.subject,
                verification: args.verification,
            },
        };

        Plan::from_raw(vec![step])
    }
}

/// Deploy PledgePost behind a [`TransparentUpgradeableProxy`](https://docs.openzeppelin.com/contracts/5.x/api/proxy#transparent_proxy),
/// which itself deploys a `ProxyAdmin` contract.
///
/// Calls made directly to the `TransparentUpgradeableProxy` contract will be forwarded to the implementation contract.
/// Upgrade calls can only be made to the `TransparentUpgradeableProxy` through the `ProxyAdmin`.
#[derive(Args)]
pub struct DeployProxyArgs {
    /// Owner address passed to the PledgePost initializer
    #[arg(long)]
    pub owner: String,

    /// Minimum pledge passed to the PledgePost initializer, in ether
    #[arg(long, default_value = "0.0005")]
    pub minimum_pledge: String,

    /// Owner of the proxy admin contract, defaults to the sender
    #[arg(long)]
    pub proxy_admin_owner: Option<String>,
}

/// Upgrade the PledgePost implementation
#[derive(Args)]
pub struct UpgradeArgs {
    /// Address of the proxy contract, defaults to the recorded deployment
    #[arg(long)]
    pub proxy: Option<String>,

    /// Address of an already deployed implementation contract,
    /// otherwise a new one is deployed from the PledgePost artifact
    #[arg(long)]
    pub implementation: Option<String>,

    /// Optional calldata, in hex form, with which to
    /// call the implementation contract when upgrading
    #[arg(long)]
    pub calldata: Option<String>,
}

/// Grant the admin role on PledgePost
#[derive(Args)]
pub struct AddAdminArgs {
    /// Address to make an admin
    #[arg(long)]
    pub admin: String,

    /// Address of the proxy contract, defaults to the recorded deployment
    #[arg(long)]
    pub proxy: Option<String>,
}

/// Create a funding round on PledgePost
#[derive(Args)]
pub struct CreateRoundArgs {
    /// Title of the round
    #[arg(long)]
    pub title: String,

    /// Description of the round
    #[arg(long, default_value = "")]
    pub description: String,

    /// Unix timestamp at which the round opens
    #[arg(long)]
    pub start: u64,

    /// Unix timestamp at which the round closes
    #[arg(long)]
    pub end: u64,

    /// Address of the proxy contract, defaults to the recorded deployment
    #[arg(long)]
    pub proxy: Option<String>,
}

/// Publish an article reference on PledgePost
#[derive(Args)]
pub struct PostArticleArgs {
    /// Content identifier of the article, e.g. an IPFS CID
    #[arg(long)]
    pub content: String,

    /// Address of the proxy contract, defaults to the recorded deployment
    #[arg(long)]
    pub proxy: Option<String>,
}

/// Deploy the EASVerification contract
#[derive(Args)]
pub struct DeployVerificationArgs {
    /// Address of the EAS registry, defaults to the network's `EAS` contract
    #[arg(long)]
    pub eas: Option<String>,
}

/// Read a passport attestation score from EASVerification
#[derive(Args)]
pub struct GetScoreArgs {
    /// Attestation schema UID, in hex
    #[arg(long)]
    pub uid: String,

    /// Address of the attested subject
    #[arg(long)]
    pub subject: String,

    /// Address of the EASVerification contract, defaults to the recorded deployment
    #[arg(long)]
    pub verification: Option<String>,
}

/// Run an ordered list of steps from a JSON plan file
#[derive(Args)]
pub struct RunPlanArgs {
    /// Path to the plan file
    pub plan: PathBuf,
}
