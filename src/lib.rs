#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod checks;
pub mod claim;
pub mod cli;
pub mod config;
pub mod constants;
pub mod signer;

pub use checks::{CheckError, CheckOutcome, CreatorNodeChecker, DiscoveryNodeChecker, all_passed};
pub use claim::{ClaimError, ClaimOutcome, TxParams, run_claim_rewards, run_initiate_round};
pub use cli::{Cli, Command};
pub use config::{ClaimRewardsConfig, ConfigError, CreatorNodeConfig, DiscoveryNodeConfig, RewardsConfig};
pub use signer::{SignatureResult, SignedQuery, SignerError, generate_signed_query, sign_payload};
