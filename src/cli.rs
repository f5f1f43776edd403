//! CLI argument definitions for `spctl`.

use std::time::Duration;

use alloy_primitives::Address;
use clap::{ArgAction, Parser, Subcommand};
use url::Url;

use crate::constants::{
    DEFAULT_CLAIM_GAS, DEFAULT_INITIATE_GAS, DEFAULT_REGISTRY_ADDRESS, DEFAULT_TOKEN_ADDRESS,
    DEFAULT_WEB3_PROVIDER,
};

/// Operator tooling for service-provider nodes: health checks and on-chain
/// reward claiming.
#[derive(Debug, Clone, Parser)]
#[command(name = "spctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Logging configuration arguments.
    #[command(flatten)]
    pub logging: LogArgs,
}

/// Top-level subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the health-check sequence against a storage (creator) node.
    CheckCreatorNode(CreatorNodeArgs),

    /// Run the health-check sequence against a discovery node.
    CheckDiscoveryNode(DiscoveryNodeArgs),

    /// Claim pending staking rewards for a service-provider wallet.
    ClaimRewards(ClaimRewardsArgs),

    /// Initiate a new funding round if enough blocks have elapsed.
    InitiateRound(InitiateRoundArgs),
}

/// Arguments for the creator-node health checks.
#[derive(Debug, Clone, Parser)]
#[command(next_help_heading = "Creator node")]
pub struct CreatorNodeArgs {
    /// HTTPS base URL of the storage node.
    #[arg(long = "endpoint", env = "creatorNodeEndpoint", value_parser = parse_url)]
    pub endpoint: Url,

    /// Delegate private key (raw hex, without a leading 0x).
    #[arg(
        long = "delegate-private-key",
        env = "delegatePrivateKey",
        hide_env_values = true
    )]
    pub delegate_private_key: String,

    /// Timeout for the quick health checks (e.g. "30s").
    #[arg(long = "request-timeout", default_value = "30s", value_parser = parse_duration)]
    pub request_timeout: Duration,
}

/// Arguments for the discovery-node health checks.
#[derive(Debug, Clone, Parser)]
#[command(next_help_heading = "Discovery node")]
pub struct DiscoveryNodeArgs {
    /// HTTPS base URL of the discovery node.
    #[arg(long = "endpoint", env = "discoveryProviderEndpoint", value_parser = parse_url)]
    pub endpoint: Url,

    /// Timeout for the health checks (e.g. "30s").
    #[arg(long = "request-timeout", default_value = "30s", value_parser = parse_duration)]
    pub request_timeout: Duration,
}

/// Arguments shared by the on-chain subcommands.
#[derive(Debug, Clone, Parser)]
#[command(next_help_heading = "Chain")]
pub struct ChainArgs {
    /// Registry contract address.
    #[arg(long = "eth-registry-address", default_value_t = DEFAULT_REGISTRY_ADDRESS)]
    pub eth_registry_address: Address,

    /// Token contract address.
    #[arg(long = "eth-token-address", default_value_t = DEFAULT_TOKEN_ADDRESS)]
    pub eth_token_address: Address,

    /// Ethereum RPC provider URL.
    #[arg(long = "web3-provider", default_value = DEFAULT_WEB3_PROVIDER, value_parser = parse_url)]
    pub web3_provider: Url,

    /// Explicit gas price in gwei; defaults to the gas-price oracle.
    #[arg(long = "gas-price")]
    pub gas_price: Option<u64>,

    /// Gas limit for initiateRound transactions.
    #[arg(long = "initiate-gas", default_value_t = DEFAULT_INITIATE_GAS)]
    pub initiate_gas: u64,

    /// Gas limit for claimRewards transactions.
    #[arg(long = "claim-gas", default_value_t = DEFAULT_CLAIM_GAS)]
    pub claim_gas: u64,

    /// Extra blocks required beyond the funding-round block difference.
    #[arg(long = "block-diff-margin", default_value_t = 0)]
    pub block_diff_margin: u64,
}

/// Arguments for `claim-rewards`.
#[derive(Debug, Clone, Parser)]
pub struct ClaimRewardsArgs {
    /// Service-provider owner wallet whose rewards are claimed.
    pub sp_owner_wallet: Address,

    /// Private key of the funded wallet (raw hex, without a leading 0x).
    pub private_key: String,

    /// Also initiate a new round when no claim is pending.
    #[arg(long = "init-round", action = ArgAction::SetTrue)]
    pub init_round: bool,

    /// After a successful claim, transfer the wallet's token balance here.
    #[arg(long = "transfer-to")]
    pub transfer_to: Option<Address>,

    /// Chain configuration.
    #[command(flatten)]
    pub chain: ChainArgs,
}

/// Arguments for `initiate-round`.
#[derive(Debug, Clone, Parser)]
pub struct InitiateRoundArgs {
    /// Private key of the funded wallet (raw hex, without a leading 0x).
    pub private_key: String,

    /// Chain configuration.
    #[command(flatten)]
    pub chain: ChainArgs,
}

/// Logging configuration arguments.
#[derive(Debug, Clone, Parser)]
#[command(next_help_heading = "Logging")]
pub struct LogArgs {
    /// Increase logging verbosity (1=ERROR, 2=WARN, 3=INFO, 4=DEBUG, 5=TRACE).
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        default_value = "3",
        global = true
    )]
    pub level: u8,
}

impl LogArgs {
    /// Initializes the tracing subscriber for operator-facing output.
    pub fn init_tracing_subscriber(&self) {
        let level = match self.level {
            0 | 1 => "error",
            2 => "warn",
            3 => "info",
            4 => "debug",
            _ => "trace",
        };
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

/// Parse a duration string like "30s", "5m".
fn parse_duration(s: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(s)
}

/// Parse a URL string.
fn parse_url(s: &str) -> Result<Url, url::ParseError> {
    Url::parse(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_creator_node_args() {
        let cli = Cli::try_parse_from([
            "spctl",
            "check-creator-node",
            "--endpoint",
            "https://creatornode.example.com",
            "--delegate-private-key",
            "f0b743ce8adb7938f1212f188347a63f",
        ])
        .unwrap();

        match cli.command {
            Command::CheckCreatorNode(args) => {
                assert_eq!(args.endpoint.as_str(), "https://creatornode.example.com/");
                assert_eq!(args.request_timeout, Duration::from_secs(30));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_check_creator_node_requires_endpoint() {
        // Without the env var set, the endpoint argument is required.
        let result = Cli::try_parse_from([
            "spctl",
            "check-creator-node",
            "--delegate-private-key",
            "f0b743ce8adb7938f1212f188347a63f",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_claim_rewards_defaults() {
        let cli = Cli::try_parse_from([
            "spctl",
            "claim-rewards",
            "0x1234567890123456789012345678901234567890",
            "f0b743ce8adb7938f1212f188347a63f",
        ])
        .unwrap();

        match cli.command {
            Command::ClaimRewards(args) => {
                assert!(!args.init_round);
                assert!(args.transfer_to.is_none());
                assert!(args.chain.gas_price.is_none());
                assert_eq!(args.chain.eth_registry_address, DEFAULT_REGISTRY_ADDRESS);
                assert_eq!(args.chain.eth_token_address, DEFAULT_TOKEN_ADDRESS);
                assert_eq!(args.chain.initiate_gas, DEFAULT_INITIATE_GAS);
                assert_eq!(args.chain.claim_gas, DEFAULT_CLAIM_GAS);
                assert_eq!(args.chain.block_diff_margin, 0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_claim_rewards_with_options() {
        let cli = Cli::try_parse_from([
            "spctl",
            "claim-rewards",
            "0x1234567890123456789012345678901234567890",
            "f0b743ce8adb7938f1212f188347a63f",
            "--init-round",
            "--gas-price",
            "40",
            "--transfer-to",
            "0x2234567890123456789012345678901234567890",
        ])
        .unwrap();

        match cli.command {
            Command::ClaimRewards(args) => {
                assert!(args.init_round);
                assert_eq!(args.chain.gas_price, Some(40));
                assert!(args.transfer_to.is_some());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_initiate_round_args() {
        let cli = Cli::try_parse_from([
            "spctl",
            "initiate-round",
            "f0b743ce8adb7938f1212f188347a63f",
            "--block-diff-margin",
            "3",
        ])
        .unwrap();

        match cli.command {
            Command::InitiateRound(args) => {
                assert_eq!(args.chain.block_diff_margin, 3);
                assert_eq!(args.chain.web3_provider.as_str(), DEFAULT_WEB3_PROVIDER);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["spctl"]).is_err());
    }
}
