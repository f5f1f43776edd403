//! `spctl` entry point.
//!
//! 1. Parse CLI arguments (environment-variable backed where documented)
//! 2. Initialise logging
//! 3. Build the validated configuration for the chosen subcommand
//! 4. Run the checks or the on-chain flow
//! 5. Exit 0 only when everything passed

use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use eyre::WrapErr;
use tracing::{error, info};
use url::Url;

use sp_utilities::checks::{CreatorNodeChecker, DiscoveryNodeChecker, all_passed};
use sp_utilities::claim::{
    ClaimsManagerContractClient, DelegateManagerContractClient, ProviderChainClient, TokenClient,
    TokenContractClient, TxParams, build_provider, resolve_gas_price, resolve_manager_addresses,
    run_claim_rewards, run_initiate_round,
};
use sp_utilities::cli::{Cli, Command};
use sp_utilities::config::{ClaimRewardsConfig, CreatorNodeConfig, DiscoveryNodeConfig, RewardsConfig};
use sp_utilities::constants::GAS_ORACLE_URL;

#[tokio::main]
async fn main() -> ExitCode {
    // Usage errors (missing env vars or arguments) must exit 1, not clap's
    // default of 2. Help and version displays still exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_exit_code(&e));
        }
    };
    cli.logging.init_tracing_subscriber();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error running script: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Maps a CLI parse error to the process exit code.
fn parse_exit_code(e: &clap::Error) -> u8 {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

async fn run(command: Command) -> eyre::Result<()> {
    match command {
        Command::CheckCreatorNode(args) => {
            let config = CreatorNodeConfig::try_from(args)?;
            info!(endpoint = %config.endpoint, "Starting creator-node checks. This may take a few minutes.");
            let checker = CreatorNodeChecker::new(config)?;
            let outcomes = checker.run().await;
            eyre::ensure!(all_passed(&outcomes), "one or more checks failed");
            info!("All checks passed!");
            Ok(())
        }
        Command::CheckDiscoveryNode(args) => {
            let config = DiscoveryNodeConfig::try_from(args)?;
            info!(endpoint = %config.endpoint, "Starting discovery-node checks");
            let checker = DiscoveryNodeChecker::new(config)?;
            let outcomes = checker.run().await;
            eyre::ensure!(all_passed(&outcomes), "one or more checks failed");
            info!("All checks passed!");
            Ok(())
        }
        Command::ClaimRewards(args) => {
            let config = ClaimRewardsConfig::try_from(args)?;
            claim_rewards(config).await
        }
        Command::InitiateRound(args) => {
            let config = RewardsConfig::try_from(args)?;
            initiate_round(config).await
        }
    }
}

async fn claim_rewards(config: ClaimRewardsConfig) -> eyre::Result<()> {
    let rewards = &config.rewards;
    let provider = build_provider(&rewards.signer, rewards.provider_url.clone());
    let chain = ProviderChainClient::new(provider.clone());

    let (claims_addr, delegate_addr) =
        resolve_manager_addresses(rewards.registry_address, provider.clone())
            .await
            .wrap_err("failed to resolve manager contracts from registry")?;
    info!(claims_manager = %claims_addr, delegate_manager = %delegate_addr, "Resolved contracts");

    let params = tx_params(rewards, &chain).await?;
    let claims = ClaimsManagerContractClient::new(claims_addr, provider.clone());
    let delegate = DelegateManagerContractClient::new(delegate_addr, provider.clone());
    let token_client = config
        .transfer_to
        .map(|_| TokenContractClient::new(rewards.token_address, provider.clone()));
    let token = token_client.as_ref().map(|t| t as &dyn TokenClient);

    run_claim_rewards(
        &claims,
        &delegate,
        token,
        &chain,
        config.sp_owner_wallet,
        rewards.signer.address(),
        config.transfer_to,
        config.init_round,
        params,
    )
    .await?;
    Ok(())
}

async fn initiate_round(config: RewardsConfig) -> eyre::Result<()> {
    let provider = build_provider(&config.signer, config.provider_url.clone());
    let chain = ProviderChainClient::new(provider.clone());

    let (claims_addr, _) = resolve_manager_addresses(config.registry_address, provider.clone())
        .await
        .wrap_err("failed to resolve manager contracts from registry")?;
    info!(claims_manager = %claims_addr, "Resolved contracts");

    let params = tx_params(&config, &chain).await?;
    let claims = ClaimsManagerContractClient::new(claims_addr, provider);
    run_initiate_round(&claims, &chain, params).await?;
    Ok(())
}

async fn tx_params(config: &RewardsConfig, chain: &ProviderChainClient) -> eyre::Result<TxParams> {
    let http = reqwest::Client::new();
    let oracle_url = Url::parse(GAS_ORACLE_URL).expect("gas oracle URL constant is valid");
    let gas_price =
        resolve_gas_price(config.gas_price_gwei, &http, &oracle_url, chain).await?;
    info!(gas_price_wei = gas_price, "Gas price selected");

    Ok(TxParams {
        initiate_gas: config.initiate_gas,
        claim_gas: config.claim_gas,
        gas_price,
        block_diff_margin: config.block_diff_margin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_and_version_exit_zero() {
        let err = Cli::try_parse_from(["spctl", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(parse_exit_code(&err), 0);

        let err = Cli::try_parse_from(["spctl", "--version"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
        assert_eq!(parse_exit_code(&err), 0);
    }

    #[test]
    fn usage_errors_exit_one() {
        let err = Cli::try_parse_from(["spctl", "no-such-command"]).unwrap_err();
        assert_eq!(parse_exit_code(&err), 1);
    }
}
