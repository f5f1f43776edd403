//! Validated configuration built once from CLI arguments and environment
//! variables, then passed into the check and claim functions. No ambient
//! globals are read after startup.

use std::time::Duration;

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use thiserror::Error;
use url::Url;

use crate::cli::{ClaimRewardsArgs, CreatorNodeArgs, DiscoveryNodeArgs, InitiateRoundArgs};
use crate::constants::{IP_API_URL, SAMPLE_FILE_URL};

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid endpoint URL.
    #[error("invalid {field} URL: {reason}")]
    InvalidUrl {
        /// The field holding the invalid URL.
        field: &'static str,
        /// Why the URL is invalid.
        reason: String,
    },

    /// Invalid private key material.
    #[error("invalid {field}: {reason}")]
    InvalidKey {
        /// The field holding the invalid key.
        field: &'static str,
        /// Why the key is invalid.
        reason: String,
    },
}

/// Validates that an endpoint URL has a scheme and host.
pub fn validate_endpoint(url: &Url, field: &'static str) -> Result<(), ConfigError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl {
            field,
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }
    if url.host().is_none() {
        return Err(ConfigError::InvalidUrl { field, reason: "missing host".to_string() });
    }
    Ok(())
}

/// Parses raw private key material into a signer.
///
/// Keys are supplied without a `0x` prefix; a prefixed key is rejected
/// outright rather than silently stripped, matching the documented operator
/// contract.
pub fn parse_private_key(raw: &str, field: &'static str) -> Result<PrivateKeySigner, ConfigError> {
    if raw.starts_with("0x") || raw.starts_with("0X") {
        return Err(ConfigError::InvalidKey {
            field,
            reason: "must not be 0x-prefixed".to_string(),
        });
    }
    raw.parse().map_err(|e| ConfigError::InvalidKey { field, reason: format!("{e}") })
}

/// Configuration for the storage ("creator") node health-check run.
#[derive(Debug, Clone)]
pub struct CreatorNodeConfig {
    /// Base URL of the storage node.
    pub endpoint: Url,
    /// Delegate key used to sign authenticated check requests.
    pub signer: PrivateKeySigner,
    /// Timeout for the quick health checks.
    pub request_timeout: Duration,
    /// Source of the large reference file streamed by the upload check.
    pub sample_file_url: Url,
}

impl TryFrom<CreatorNodeArgs> for CreatorNodeConfig {
    type Error = ConfigError;

    fn try_from(args: CreatorNodeArgs) -> Result<Self, Self::Error> {
        validate_endpoint(&args.endpoint, "creatorNodeEndpoint")?;
        let signer = parse_private_key(&args.delegate_private_key, "delegatePrivateKey")?;
        let sample_file_url =
            Url::parse(SAMPLE_FILE_URL).expect("sample file URL constant is valid");
        Ok(Self {
            endpoint: args.endpoint,
            signer,
            request_timeout: args.request_timeout,
            sample_file_url,
        })
    }
}

/// Configuration for the discovery node health-check run.
#[derive(Debug, Clone)]
pub struct DiscoveryNodeConfig {
    /// Base URL of the discovery node.
    pub endpoint: Url,
    /// Timeout for the health checks.
    pub request_timeout: Duration,
    /// External IP resolution service compared against the node's own report.
    pub ip_api_url: Url,
}

impl TryFrom<DiscoveryNodeArgs> for DiscoveryNodeConfig {
    type Error = ConfigError;

    fn try_from(args: DiscoveryNodeArgs) -> Result<Self, Self::Error> {
        validate_endpoint(&args.endpoint, "discoveryProviderEndpoint")?;
        let ip_api_url = Url::parse(IP_API_URL).expect("IP API URL constant is valid");
        Ok(Self { endpoint: args.endpoint, request_timeout: args.request_timeout, ip_api_url })
    }
}

/// Configuration shared by the reward-claim and round-initiation flows.
#[derive(Debug, Clone)]
pub struct RewardsConfig {
    /// Funded wallet used to submit transactions.
    pub signer: PrivateKeySigner,
    /// Registry contract address used to resolve the manager contracts.
    pub registry_address: Address,
    /// Token contract address (used by the opt-in post-claim transfer).
    pub token_address: Address,
    /// Ethereum RPC provider URL.
    pub provider_url: Url,
    /// Explicit gas price in gwei; when absent the oracle is consulted.
    pub gas_price_gwei: Option<u64>,
    /// Gas limit for `initiateRound` transactions.
    pub initiate_gas: u64,
    /// Gas limit for `claimRewards` transactions.
    pub claim_gas: u64,
    /// Extra blocks required beyond the funding-round block difference.
    pub block_diff_margin: u64,
}

/// Full configuration for the `claim-rewards` subcommand.
#[derive(Debug, Clone)]
pub struct ClaimRewardsConfig {
    /// Service-provider owner wallet whose rewards are claimed.
    pub sp_owner_wallet: Address,
    /// Whether to attempt round initiation when no claim is pending.
    pub init_round: bool,
    /// Opt-in post-claim transfer receiver.
    pub transfer_to: Option<Address>,
    /// Shared rewards configuration.
    pub rewards: RewardsConfig,
}

impl TryFrom<ClaimRewardsArgs> for ClaimRewardsConfig {
    type Error = ConfigError;

    fn try_from(args: ClaimRewardsArgs) -> Result<Self, Self::Error> {
        validate_endpoint(&args.chain.web3_provider, "web3-provider")?;
        let signer = parse_private_key(&args.private_key, "privateKey")?;
        Ok(Self {
            sp_owner_wallet: args.sp_owner_wallet,
            init_round: args.init_round,
            transfer_to: args.transfer_to,
            rewards: RewardsConfig {
                signer,
                registry_address: args.chain.eth_registry_address,
                token_address: args.chain.eth_token_address,
                provider_url: args.chain.web3_provider,
                gas_price_gwei: args.chain.gas_price,
                initiate_gas: args.chain.initiate_gas,
                claim_gas: args.chain.claim_gas,
                block_diff_margin: args.chain.block_diff_margin,
            },
        })
    }
}

impl TryFrom<InitiateRoundArgs> for RewardsConfig {
    type Error = ConfigError;

    fn try_from(args: InitiateRoundArgs) -> Result<Self, Self::Error> {
        validate_endpoint(&args.chain.web3_provider, "web3-provider")?;
        let signer = parse_private_key(&args.private_key, "privateKey")?;
        Ok(Self {
            signer,
            registry_address: args.chain.eth_registry_address,
            token_address: args.chain.eth_token_address,
            provider_url: args.chain.web3_provider,
            gas_price_gwei: args.chain.gas_price,
            initiate_gas: args.chain.initiate_gas,
            claim_gas: args.chain.claim_gas,
            block_diff_margin: args.chain.block_diff_margin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn prefixed_private_key_is_rejected() {
        let err = parse_private_key(&format!("0x{TEST_KEY}"), "delegatePrivateKey").unwrap_err();
        assert!(err.to_string().contains("must not be 0x-prefixed"));
    }

    #[test]
    fn raw_private_key_is_accepted() {
        let signer = parse_private_key(TEST_KEY, "delegatePrivateKey").unwrap();
        assert_eq!(
            signer.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn malformed_private_key_is_rejected() {
        assert!(parse_private_key("not-hex", "delegatePrivateKey").is_err());
    }

    #[test]
    fn endpoint_must_be_http() {
        let url = Url::parse("ftp://node.example.com").unwrap();
        assert!(validate_endpoint(&url, "creatorNodeEndpoint").is_err());

        let url = Url::parse("https://node.example.com").unwrap();
        assert!(validate_endpoint(&url, "creatorNodeEndpoint").is_ok());
    }
}
