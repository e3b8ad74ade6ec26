//! Declarative plans of operations
//!
//! A plan is an ordered list of steps. Every step is parsed and validated,
//! and every contract it targets is checked to be resolvable, before the
//! first step is executed.

use std::{
    fmt::{self, Display},
    fs,
    path::Path,
};

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::Deserialize;

use crate::{
    config::{parse_address, parse_b256, parse_ether_amount, parse_nonzero_address},
    constants::{EAS_KEY, EAS_VERIFICATION_KEY, PLEDGE_POST_PROXY_KEY},
    deployments::Deployments,
    errors::ScriptError,
};

/// A funding round to create on the PledgePost contract
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round {
    /// The round's title
    pub title: String,
    /// The round's description
    pub description: String,
    /// Unix timestamp at which the round opens
    pub start: u64,
    /// Unix timestamp at which the round closes
    pub end: u64,
}

/// A single validated operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Deploy PledgePost behind a transparent upgradeable proxy
    DeployProxy {
        /// The owner passed to the PledgePost initializer
        owner: Address,
        /// The minimum pledge passed to the PledgePost initializer, in wei
        minimum_pledge: U256,
        /// The owner of the proxy's admin contract, defaults to the sender
        proxy_admin_owner: Option<Address>,
    },
    /// Upgrade the implementation behind the PledgePost proxy
    Upgrade {
        /// The proxy to upgrade
        proxy: Option<Address>,
        /// An already deployed implementation, otherwise a new one is deployed
        implementation: Option<Address>,
        /// Calldata with which the proxy calls the new implementation
        calldata: Bytes,
    },
    /// Grant the admin role on PledgePost
    AddAdmin {
        /// The account to make an admin
        admin: Address,
        /// The PledgePost proxy
        proxy: Option<Address>,
    },
    /// Create a funding round on PledgePost
    CreateRound {
        /// The round to create
        round: Round,
        /// The PledgePost proxy
        proxy: Option<Address>,
    },
    /// Publish an article reference on PledgePost
    PostArticle {
        /// The article's content identifier
        content: String,
        /// The PledgePost proxy
        proxy: Option<Address>,
    },
    /// Deploy the EASVerification contract
    DeployVerification {
        /// The EAS registry the contract reads attestations from
        eas: Option<Address>,
    },
    /// Read an attestation score from EASVerification
    GetScore {
        /// The attestation schema UID
        uid: B256,
        /// The attested subject
        subject: Address,
        /// The EASVerification contract
        verification: Option<Address>,
    },
}

impl Step {
    /// Whether the step only reads chain state, and so needs no signer
    pub fn is_read_only(&self) -> bool {
        matches!(self, Step::GetScore { .. })
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::DeployProxy { .. } => write!(f, "deploy-proxy"),
            Step::Upgrade { .. } => write!(f, "upgrade"),
            Step::AddAdmin { admin, .. } => write!(f, "add-admin {admin:#x}"),
            Step::CreateRound { round, .. } => write!(f, "create-round \"{}\"", round.title),
            Step::PostArticle { content, .. } => write!(f, "post-article {content}"),
            Step::DeployVerification { .. } => write!(f, "deploy-verification"),
            Step::GetScore { uid, subject, .. } => write!(f, "get-score {uid} {subject:#x}"),
        }
    }
}

/// A plan step as written in a plan file, before validation
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case", deny_unknown_fields)]
pub enum RawStep {
    /// See [`Step::DeployProxy`]
    DeployProxy {
        /// The initializer's owner address
        owner: String,
        /// The minimum pledge, in ether
        minimum_pledge: String,
        /// The proxy admin owner address
        #[serde(default)]
        proxy_admin_owner: Option<String>,
    },
    /// See [`Step::Upgrade`]
    Upgrade {
        /// The proxy address
        #[serde(default)]
        proxy: Option<String>,
        /// The implementation address
        #[serde(default)]
        implementation: Option<String>,
        /// Hex calldata
        #[serde(default)]
        calldata: Option<String>,
    },
    /// See [`Step::AddAdmin`]
    AddAdmin {
        /// The admin address
        admin: String,
        /// The proxy address
        #[serde(default)]
        proxy: Option<String>,
    },
    /// See [`Step::CreateRound`]
    CreateRound {
        /// The round's title
        title: String,
        /// The round's description
        description: String,
        /// Unix timestamp at which the round opens
        start: u64,
        /// Unix timestamp at which the round closes
        end: u64,
        /// The proxy address
        #[serde(default)]
        proxy: Option<String>,
    },
    /// See [`Step::PostArticle`]
    PostArticle {
        /// The article's content identifier
        content: String,
        /// The proxy address
        #[serde(default)]
        proxy: Option<String>,
    },
    /// See [`Step::DeployVerification`]
    DeployVerification {
        /// The EAS registry address
        #[serde(default)]
        eas: Option<String>,
    },
    /// See [`Step::GetScore`]
    GetScore {
        /// The attestation schema UID
        uid: String,
        /// The subject address
        subject: String,
        /// The EASVerification address
        #[serde(default)]
        verification: Option<String>,
    },
}

/// Parse an optional non-zero address, of a contract or an account
fn parse_optional_address(
    addr: Option<&str>,
    what: &str,
) -> Result<Option<Address>, ScriptError> {
    addr.map(|addr| parse_nonzero_address(addr, what)).transpose()
}

impl RawStep {
    /// Parse and validate the step's arguments
    pub fn validate(self) -> Result<Step, ScriptError> {
        let step = match self {
            RawStep::DeployProxy {
                owner,
                minimum_pledge,
                proxy_admin_owner,
            } => Step::DeployProxy {
                owner: parse_nonzero_address(&owner, "owner")?,
                minimum_pledge: parse_ether_amount(&minimum_pledge, "minimum pledge")?,
                proxy_admin_owner: parse_optional_address(
                    proxy_admin_owner.as_deref(),
                    "proxy admin owner",
                )?,
            },
            RawStep::Upgrade {
                proxy,
                implementation,
                calldata,
            } => {
                let calldata = match calldata {
                    Some(hex) => hex
                        .parse::<Bytes>()
                        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?,
                    None => Bytes::new(),
                };

                Step::Upgrade {
                    proxy: parse_optional_address(proxy.as_deref(), "proxy")?,
                    implementation: parse_optional_address(
                        implementation.as_deref(),
                        "implementation",
                    )?,
                    calldata,
                }
            }
            RawStep::AddAdmin { admin, proxy } => Step::AddAdmin {
                admin: parse_nonzero_address(&admin, "admin")?,
                proxy: parse_optional_address(proxy.as_deref(), "proxy")?,
            },
            RawStep::CreateRound {
                title,
                description,
                start,
                end,
                proxy,
            } => {
                if title.trim().is_empty() {
                    return Err(ScriptError::InvalidConfig("round title is empty".to_string()));
                }
                if end <= start {
                    return Err(ScriptError::InvalidConfig(format!(
                        "round \"{title}\" ends ({end}) before it starts ({start})"
                    )));
                }

                Step::CreateRound {
                    round: Round {
                        title,
                        description,
                        start,
                        end,
                    },
                    proxy: parse_optional_address(proxy.as_deref(), "proxy")?,
                }
            }
            RawStep::PostArticle { content, proxy } => {
                let content = content.trim().to_string();
                if content.is_empty() {
                    return Err(ScriptError::InvalidConfig(
                        "article content identifier is empty".to_string(),
                    ));
                }

                Step::PostArticle {
                    content,
                    proxy: parse_optional_address(proxy.as_deref(), "proxy")?,
                }
            }
            RawStep::DeployVerification { eas } => Step::DeployVerification {
                eas: parse_optional_address(eas.as_deref(), "eas")?,
            },
            RawStep::GetScore {
                uid,
                subject,
                verification,
            } => Step::GetScore {
                uid: parse_b256(&uid, "uid")?,
                subject: parse_address(&subject, "subject")?,
                verification: parse_optional_address(verification.as_deref(), "verification")?,
            },
        };

        Ok(step)
    }
}

/// A plan file as laid out on disk
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPlan {
    /// The ordered steps of the plan
    steps: Vec<RawStep>,
}

/// An ordered, validated list of steps
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    /// The steps, in execution order
    pub steps: Vec<Step>,
}

impl Plan {
    /// Build a plan from raw steps, validating each of them
    pub fn from_raw(steps: Vec<RawStep>) -> Result<Self, ScriptError> {
        let steps = steps
            .into_iter()
            .enumerate()
            .map(|(i, step)| {
                step.validate().map_err(|e| {
                    ScriptError::InvalidConfig(format!("step {}: {}", i + 1, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if steps.is_empty() {
            return Err(ScriptError::InvalidConfig("plan has no steps".to_string()));
        }

        Ok(Self { steps })
    }

    /// Parse a plan from its JSON contents
    pub fn parse(contents: &str) -> Result<Self, ScriptError> {
        let RawPlan { steps } =
            serde_json::from_str(contents).map_err(|e| ScriptError::ConfigParsing(e.to_string()))?;

        Self::from_raw(steps)
    }

    /// Read a plan file
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::ReadFile(format!("{}: {}", path.display(), e)))?;

        Self::parse(&contents)
    }

    /// Whether any step sends a transaction
    pub fn requires_signer(&self) -> bool {
        self.steps.iter().any(|step| !step.is_read_only())
    }

    /// Check that every contract a step targets is either given explicitly,
    /// already known to the address book, or deployed by an earlier step
    pub fn check_targets(&self, deployments: &Deployments) -> Result<(), ScriptError> {
        let mut has_proxy = deployments.get(PLEDGE_POST_PROXY_KEY).is_some();
        let mut has_verification = deployments.get(EAS_VERIFICATION_KEY).is_some();
        let has_eas = deployments.get(EAS_KEY).is_some();

        for (i, step) in self.steps.iter().enumerate() {
            let missing = match step {
                Step::DeployProxy { .. } => {
                    has_proxy = true;
                    None
                }
                Step::Upgrade { proxy, .. }
                | Step::AddAdmin { proxy, .. }
                | Step::CreateRound { proxy, .. }
                | Step::PostArticle { proxy, .. } => {
                    (proxy.is_none() && !has_proxy).then_some(PLEDGE_POST_PROXY_KEY)
                }
                Step::DeployVerification { eas } => {
                    has_verification = true;
                    (eas.is_none() && !has_eas).then_some(EAS_KEY)
                }
                Step::GetScore { verification, .. } => {
                    (verification.is_none() && !has_verification).then_some(EAS_VERIFICATION_KEY)
                }
            };

            if let Some(key) = missing {
                return Err(ScriptError::InvalidConfig(format!(
                    "step {} ({step}): no `{key}` address given, recorded in {}, or deployed by an earlier step",
                    i + 1,
                    deployments.path().display(),
                )));
            }
        }

        Ok(())
    }
}
