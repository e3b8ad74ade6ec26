//! Definition of the CLI arguments for integration tests

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::constants::{
    DEFAULT_DEVNET_NETWORK, DEFAULT_DEVNET_PKEY, DEFAULT_SCORE_SUBJECT, DEFAULT_SCORE_UID,
};

/// CLI tool for running integration tests against a running devnet node.
///
/// Assumes that the compiled contract artifacts named in the networks config are available.
#[derive(Parser)]
pub(crate) struct Cli {
    /// Test to run
    #[arg(short, long)]
    pub(crate) test: Tests,

    /// Path to the networks config file
    #[arg(short, long, default_value = "networks.json")]
    pub(crate) config: PathBuf,

    /// The network to run against, as named in the networks config
    #[arg(short, long, default_value = DEFAULT_DEVNET_NETWORK)]
    pub(crate) network: String,

    /// Path to the deployments file the tests record into
    #[arg(short, long, default_value = "deployments.devnet.json")]
    pub(crate) deployments_file: PathBuf,

    /// Devnet private key, defaults to the first default devnet account
    #[arg(short, long, env = "PKEY", default_value = DEFAULT_DEVNET_PKEY)]
    pub(crate) priv_key: String,

    /// The attestation schema UID queried by the `score-stable` test
    #[arg(long, default_value = DEFAULT_SCORE_UID)]
    pub(crate) uid: String,

    /// The subject queried by the `score-stable` test
    #[arg(long, default_value = DEFAULT_SCORE_SUBJECT)]
    pub(crate) subject: String,
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tests {
    DeployProxy,
    Upgrade,
    AdminCalls,
    RoundNotIdempotent,
    RevertPropagates,
    ScoreStable,
    All,
}
