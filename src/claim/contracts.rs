//! Contract bindings and clients for the staking reward contracts.
//!
//! Contract addresses are resolved at runtime from the registry contract,
//! mirroring how the on-chain governance wires the proxies together. All
//! clients sit behind `async_trait` traits so the claim flow can be exercised
//! against mocks.

use alloy_network::EthereumWallet;
use alloy_primitives::{Address, B256, TxHash, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::sol;
use async_trait::async_trait;
use url::Url;

use super::ClaimError;
use crate::constants::{CLAIMS_MANAGER_REGISTRY_KEY, DELEGATE_MANAGER_REGISTRY_KEY};

sol! {
    /// Registry resolving governance-managed proxy addresses by name.
    #[sol(rpc)]
    interface IRegistry {
        function getContract(bytes32 name) external view returns (address);
    }

    /// Claims-manager contract governing reward-round funding.
    #[sol(rpc)]
    interface IClaimsManager {
        function claimPending(address sp) external view returns (bool);
        function getLastFundedBlock() external view returns (uint256);
        function getFundingRoundBlockDiff() external view returns (uint256);
        function initiateRound() external;
    }

    /// Delegate-manager contract distributing per-operator rewards.
    #[sol(rpc)]
    interface IDelegateManager {
        function claimRewards(address serviceProvider) external;
    }

    /// Minimal ERC-20 surface for the post-claim transfer.
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function transfer(address to, uint256 value) external returns (bool);
    }
}

/// Builds a wallet-backed provider for transaction submission.
pub fn build_provider(signer: &PrivateKeySigner, rpc_url: Url) -> DynProvider {
    let wallet = EthereumWallet::from(signer.clone());
    ProviderBuilder::new().wallet(wallet).connect_http(rpc_url).erased()
}

/// Encodes a registry key name as a right-padded `bytes32`.
fn registry_key(name: &str) -> B256 {
    let mut key = [0u8; 32];
    key[..name.len()].copy_from_slice(name.as_bytes());
    B256::from(key)
}

/// Resolves the claims-manager and delegate-manager proxy addresses from the
/// registry contract.
pub async fn resolve_manager_addresses(
    registry_address: Address,
    provider: DynProvider,
) -> Result<(Address, Address), ClaimError> {
    let registry = IRegistry::new(registry_address, provider);

    let claims_manager = registry
        .getContract(registry_key(CLAIMS_MANAGER_REGISTRY_KEY))
        .call()
        .await
        .map_err(|e| ClaimError::Contract(format!("registry lookup of claims manager failed: {e}")))?;
    let delegate_manager = registry
        .getContract(registry_key(DELEGATE_MANAGER_REGISTRY_KEY))
        .call()
        .await
        .map_err(|e| {
            ClaimError::Contract(format!("registry lookup of delegate manager failed: {e}"))
        })?;

    if claims_manager == Address::ZERO || delegate_manager == Address::ZERO {
        return Err(ClaimError::Contract(
            "registry returned a zero address for a manager contract".to_string(),
        ));
    }
    Ok((claims_manager, delegate_manager))
}

/// Read access to chain-level state needed by the claim flow.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current block number.
    async fn block_number(&self) -> Result<u64, ClaimError>;

    /// Network gas price estimate in wei.
    async fn gas_price(&self) -> Result<u128, ClaimError>;
}

/// Claims-manager contract operations used by the claim flow.
#[async_trait]
pub trait ClaimsManagerClient: Send + Sync {
    /// Whether a reward claim is pending for the given operator wallet.
    async fn claim_pending(&self, sp_owner: Address) -> Result<bool, ClaimError>;

    /// Block at which the last funding round was initiated.
    async fn last_funded_block(&self) -> Result<u64, ClaimError>;

    /// Minimum block difference required between funding rounds.
    async fn funding_round_block_diff(&self) -> Result<u64, ClaimError>;

    /// Submits a round-initiation transaction.
    async fn initiate_round(&self, gas: u64, gas_price: u128) -> Result<TxHash, ClaimError>;
}

/// Delegate-manager contract operations used by the claim flow.
#[async_trait]
pub trait DelegateManagerClient: Send + Sync {
    /// Submits a claim transaction for the given operator wallet.
    async fn claim_rewards(
        &self,
        sp_owner: Address,
        gas: u64,
        gas_price: u128,
    ) -> Result<TxHash, ClaimError>;
}

/// Token operations used by the opt-in post-claim transfer.
#[async_trait]
pub trait TokenClient: Send + Sync {
    /// Token balance of the given account.
    async fn balance_of(&self, owner: Address) -> Result<U256, ClaimError>;

    /// Transfers tokens from the funded wallet to the receiver.
    async fn transfer(
        &self,
        to: Address,
        amount: U256,
        gas_price: u128,
    ) -> Result<TxHash, ClaimError>;
}

/// Chain client backed by an RPC provider.
#[derive(Clone)]
pub struct ProviderChainClient {
    provider: DynProvider,
}

impl ProviderChainClient {
    /// Creates a chain client over the given provider.
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ChainClient for ProviderChainClient {
    async fn block_number(&self) -> Result<u64, ClaimError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ClaimError::Transport(format!("eth_blockNumber failed: {e}")))
    }

    async fn gas_price(&self) -> Result<u128, ClaimError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| ClaimError::Transport(format!("eth_gasPrice failed: {e}")))
    }
}

/// Claims-manager client backed by sol-generated contract bindings.
pub struct ClaimsManagerContractClient {
    contract: IClaimsManager::IClaimsManagerInstance<DynProvider>,
}

impl ClaimsManagerContractClient {
    /// Creates a client bound to the resolved claims-manager address.
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self { contract: IClaimsManager::new(address, provider) }
    }
}

#[async_trait]
impl ClaimsManagerClient for ClaimsManagerContractClient {
    async fn claim_pending(&self, sp_owner: Address) -> Result<bool, ClaimError> {
        self.contract
            .claimPending(sp_owner)
            .call()
            .await
            .map_err(|e| ClaimError::Contract(format!("claimPending failed: {e}")))
    }

    async fn last_funded_block(&self) -> Result<u64, ClaimError> {
        let block = self
            .contract
            .getLastFundedBlock()
            .call()
            .await
            .map_err(|e| ClaimError::Contract(format!("getLastFundedBlock failed: {e}")))?;
        block
            .try_into()
            .map_err(|_| ClaimError::Contract("getLastFundedBlock overflows u64".to_string()))
    }

    async fn funding_round_block_diff(&self) -> Result<u64, ClaimError> {
        let diff = self
            .contract
            .getFundingRoundBlockDiff()
            .call()
            .await
            .map_err(|e| ClaimError::Contract(format!("getFundingRoundBlockDiff failed: {e}")))?;
        diff.try_into()
            .map_err(|_| ClaimError::Contract("getFundingRoundBlockDiff overflows u64".to_string()))
    }

    async fn initiate_round(&self, gas: u64, gas_price: u128) -> Result<TxHash, ClaimError> {
        let pending = self
            .contract
            .initiateRound()
            .gas(gas)
            .gas_price(gas_price)
            .send()
            .await
            .map_err(|e| ClaimError::Contract(format!("initiateRound failed: {e}")))?;
        pending
            .watch()
            .await
            .map_err(|e| ClaimError::Transport(format!("initiateRound not confirmed: {e}")))
    }
}

/// Delegate-manager client backed by sol-generated contract bindings.
pub struct DelegateManagerContractClient {
    contract: IDelegateManager::IDelegateManagerInstance<DynProvider>,
}

impl DelegateManagerContractClient {
    /// Creates a client bound to the resolved delegate-manager address.
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self { contract: IDelegateManager::new(address, provider) }
    }
}

#[async_trait]
impl DelegateManagerClient for DelegateManagerContractClient {
    async fn claim_rewards(
        &self,
        sp_owner: Address,
        gas: u64,
        gas_price: u128,
    ) -> Result<TxHash, ClaimError> {
        let pending = self
            .contract
            .claimRewards(sp_owner)
            .gas(gas)
            .gas_price(gas_price)
            .send()
            .await
            .map_err(|e| ClaimError::Contract(format!("claimRewards failed: {e}")))?;
        pending
            .watch()
            .await
            .map_err(|e| ClaimError::Transport(format!("claimRewards not confirmed: {e}")))
    }
}

/// Token client backed by sol-generated contract bindings.
pub struct TokenContractClient {
    contract: IERC20::IERC20Instance<DynProvider>,
}

impl TokenContractClient {
    /// Creates a client bound to the token contract.
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self { contract: IERC20::new(address, provider) }
    }
}

#[async_trait]
impl TokenClient for TokenContractClient {
    async fn balance_of(&self, owner: Address) -> Result<U256, ClaimError> {
        self.contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| ClaimError::Contract(format!("balanceOf failed: {e}")))
    }

    async fn transfer(
        &self,
        to: Address,
        amount: U256,
        gas_price: u128,
    ) -> Result<TxHash, ClaimError> {
        let pending = self
            .contract
            .transfer(to, amount)
            .gas_price(gas_price)
            .send()
            .await
            .map_err(|e| ClaimError::Contract(format!("transfer failed: {e}")))?;
        pending
            .watch()
            .await
            .map_err(|e| ClaimError::Transport(format!("transfer not confirmed: {e}")))
    }
}
