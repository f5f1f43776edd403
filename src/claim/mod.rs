//! Reward claiming and funding-round initiation.
//!
//! A linear, single-attempt flow: query the claims manager for a pending
//! claim, claim it through the delegate manager if present, or (when
//! requested) initiate a new funding round once enough blocks have elapsed
//! since the last funded one. No retries, no confirmation polling beyond what
//! the provider performs, no rollback.

use alloy_primitives::{Address, TxHash};
use thiserror::Error;
use tracing::info;

pub mod contracts;
pub mod gas;

pub use contracts::{
    ChainClient, ClaimsManagerClient, ClaimsManagerContractClient, DelegateManagerClient,
    DelegateManagerContractClient, ProviderChainClient, TokenClient, TokenContractClient,
    build_provider, resolve_manager_addresses,
};
pub use gas::resolve_gas_price;

/// Errors produced by the claim and round-initiation flows.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// A contract call or transaction failed.
    #[error("contract error: {0}")]
    Contract(String),

    /// The gas-price oracle failed.
    #[error("gas oracle error: {0}")]
    Oracle(String),

    /// An RPC transport operation failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Round initiation was requested before enough blocks elapsed.
    #[error("block difference {block_diff} has not met the required {required}")]
    RoundNotDue {
        /// Blocks elapsed since the last funded round.
        block_diff: u64,
        /// Required difference, including any safety margin.
        required: u64,
    },
}

/// Per-run transaction parameters, resolved once before the flow starts.
#[derive(Debug, Clone, Copy)]
pub struct TxParams {
    /// Gas limit for `initiateRound`.
    pub initiate_gas: u64,
    /// Gas limit for `claimRewards`.
    pub claim_gas: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    /// Extra blocks required beyond the funding-round block difference.
    pub block_diff_margin: u64,
}

/// What a claim run ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// A pending claim was submitted.
    Claimed {
        /// Claim transaction hash.
        tx: TxHash,
        /// Post-claim transfer transaction, when one was requested and the
        /// wallet held a balance.
        transfer_tx: Option<TxHash>,
    },
    /// No claim was pending; a new round was initiated instead.
    RoundInitiated(TxHash),
    /// No claim was pending and round initiation was not requested.
    NoPendingClaim,
}

/// Runs the reward-claim flow for one operator wallet.
///
/// A pending claim is always claimed exactly once; round initiation is only
/// ever attempted when no claim is pending, regardless of `init_round`.
#[allow(clippy::too_many_arguments)]
pub async fn run_claim_rewards(
    claims: &dyn ClaimsManagerClient,
    delegate: &dyn DelegateManagerClient,
    token: Option<&dyn TokenClient>,
    chain: &dyn ChainClient,
    sp_owner: Address,
    wallet: Address,
    transfer_to: Option<Address>,
    init_round: bool,
    params: TxParams,
) -> Result<ClaimOutcome, ClaimError> {
    let claim_pending = claims.claim_pending(sp_owner).await?;

    if claim_pending {
        info!(%sp_owner, "Claiming rewards");
        let tx = delegate.claim_rewards(sp_owner, params.claim_gas, params.gas_price).await?;
        info!(%tx, "Claimed rewards successfully");

        let transfer_tx = match (token, transfer_to) {
            (Some(token), Some(to)) => transfer_balance(token, wallet, to, params).await?,
            _ => None,
        };
        return Ok(ClaimOutcome::Claimed { tx, transfer_tx });
    }

    if init_round {
        let tx = run_initiate_round(claims, chain, params).await?;
        return Ok(ClaimOutcome::RoundInitiated(tx));
    }

    info!(%sp_owner, "No claim pending");
    Ok(ClaimOutcome::NoPendingClaim)
}

/// Initiates a new funding round if enough blocks have elapsed since the last
/// funded one, honoring the configured safety margin.
pub async fn run_initiate_round(
    claims: &dyn ClaimsManagerClient,
    chain: &dyn ChainClient,
    params: TxParams,
) -> Result<TxHash, ClaimError> {
    let current_block = chain.block_number().await?;
    let last_funded_block = claims.last_funded_block().await?;
    let required = claims.funding_round_block_diff().await? + params.block_diff_margin;
    let block_diff = current_block.saturating_sub(last_funded_block);

    if block_diff <= required {
        return Err(ClaimError::RoundNotDue { block_diff, required });
    }

    info!(block_diff, required, "Initiating round");
    let tx = claims.initiate_round(params.initiate_gas, params.gas_price).await?;
    info!(%tx, "Initiated round");
    Ok(tx)
}

/// Moves the funded wallet's full token balance to the receiver. A zero
/// balance is not an error; the transfer is simply skipped.
async fn transfer_balance(
    token: &dyn TokenClient,
    wallet: Address,
    to: Address,
    params: TxParams,
) -> Result<Option<TxHash>, ClaimError> {
    let balance = token.balance_of(wallet).await?;
    if balance.is_zero() {
        info!(%wallet, "No token balance to transfer");
        return Ok(None);
    }

    info!(%to, %balance, "Transferring claimed balance");
    let tx = token.transfer(to, balance, params.gas_price).await?;
    info!(%tx, "Transfer complete");
    Ok(Some(tx))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use alloy_primitives::{B256, U256, address};
    use async_trait::async_trait;

    use super::*;

    const SP_OWNER: Address = address!("1111111111111111111111111111111111111111");
    const WALLET: Address = address!("2222222222222222222222222222222222222222");
    const RECEIVER: Address = address!("3333333333333333333333333333333333333333");

    fn params() -> TxParams {
        TxParams {
            initiate_gas: 100_000,
            claim_gas: 1_500_000,
            gas_price: 40_000_000_000,
            block_diff_margin: 0,
        }
    }

    #[derive(Default)]
    struct MockClaimsManager {
        claim_pending: bool,
        last_funded_block: u64,
        required_block_diff: u64,
        initiate_calls: AtomicUsize,
    }

    #[async_trait]
    impl ClaimsManagerClient for MockClaimsManager {
        async fn claim_pending(&self, _sp_owner: Address) -> Result<bool, ClaimError> {
            Ok(self.claim_pending)
        }

        async fn last_funded_block(&self) -> Result<u64, ClaimError> {
            Ok(self.last_funded_block)
        }

        async fn funding_round_block_diff(&self) -> Result<u64, ClaimError> {
            Ok(self.required_block_diff)
        }

        async fn initiate_round(&self, _gas: u64, _gas_price: u128) -> Result<TxHash, ClaimError> {
            self.initiate_calls.fetch_add(1, Ordering::SeqCst);
            Ok(B256::repeat_byte(0xAA))
        }
    }

    #[derive(Default)]
    struct MockDelegateManager {
        claim_calls: AtomicUsize,
    }

    #[async_trait]
    impl DelegateManagerClient for MockDelegateManager {
        async fn claim_rewards(
            &self,
            _sp_owner: Address,
            _gas: u64,
            _gas_price: u128,
        ) -> Result<TxHash, ClaimError> {
            self.claim_calls.fetch_add(1, Ordering::SeqCst);
            Ok(B256::repeat_byte(0xBB))
        }
    }

    struct MockChain {
        block_number: u64,
    }

    #[async_trait]
    impl ChainClient for MockChain {
        async fn block_number(&self) -> Result<u64, ClaimError> {
            Ok(self.block_number)
        }

        async fn gas_price(&self) -> Result<u128, ClaimError> {
            Ok(1)
        }
    }

    struct MockToken {
        balance: U256,
        transfer_calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenClient for MockToken {
        async fn balance_of(&self, _owner: Address) -> Result<U256, ClaimError> {
            Ok(self.balance)
        }

        async fn transfer(
            &self,
            _to: Address,
            _amount: U256,
            _gas_price: u128,
        ) -> Result<TxHash, ClaimError> {
            self.transfer_calls.fetch_add(1, Ordering::SeqCst);
            Ok(B256::repeat_byte(0xCC))
        }
    }

    #[tokio::test]
    async fn pending_claim_claims_once_and_never_initiates() {
        let claims = MockClaimsManager { claim_pending: true, ..Default::default() };
        let delegate = MockDelegateManager::default();
        let chain = MockChain { block_number: 1_000_000 };

        // init_round is requested, but the pending claim must win.
        let outcome = run_claim_rewards(
            &claims, &delegate, None, &chain, SP_OWNER, WALLET, None, true,
            params(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, ClaimOutcome::Claimed { transfer_tx: None, .. }));
        assert_eq!(delegate.claim_calls.load(Ordering::SeqCst), 1);
        assert_eq!(claims.initiate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_pending_claim_without_init_round_does_nothing() {
        let claims = MockClaimsManager::default();
        let delegate = MockDelegateManager::default();
        let chain = MockChain { block_number: 1_000_000 };

        let outcome = run_claim_rewards(
            &claims, &delegate, None, &chain, SP_OWNER, WALLET, None, false,
            params(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, ClaimOutcome::NoPendingClaim);
        assert_eq!(delegate.claim_calls.load(Ordering::SeqCst), 0);
        assert_eq!(claims.initiate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn insufficient_block_diff_performs_no_transaction() {
        let claims = MockClaimsManager {
            last_funded_block: 990,
            required_block_diff: 20,
            ..Default::default()
        };
        let chain = MockChain { block_number: 1_000 };

        let err = run_initiate_round(&claims, &chain, params()).await.unwrap_err();
        assert!(matches!(err, ClaimError::RoundNotDue { block_diff: 10, required: 20 }));
        assert_eq!(claims.initiate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exact_block_diff_is_still_not_due() {
        let claims = MockClaimsManager {
            last_funded_block: 980,
            required_block_diff: 20,
            ..Default::default()
        };
        let chain = MockChain { block_number: 1_000 };

        let err = run_initiate_round(&claims, &chain, params()).await.unwrap_err();
        assert!(matches!(err, ClaimError::RoundNotDue { block_diff: 20, required: 20 }));
    }

    #[tokio::test]
    async fn sufficient_block_diff_initiates_round() {
        let claims = MockClaimsManager {
            last_funded_block: 900,
            required_block_diff: 20,
            ..Default::default()
        };
        let chain = MockChain { block_number: 1_000 };

        run_initiate_round(&claims, &chain, params()).await.unwrap();
        assert_eq!(claims.initiate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn safety_margin_tightens_the_gate() {
        let claims = MockClaimsManager {
            last_funded_block: 975,
            required_block_diff: 20,
            ..Default::default()
        };
        let chain = MockChain { block_number: 1_000 };
        let mut p = params();
        p.block_diff_margin = 10;

        // diff of 25 clears the base requirement of 20 but not 20 + 10.
        let err = run_initiate_round(&claims, &chain, p).await.unwrap_err();
        assert!(matches!(err, ClaimError::RoundNotDue { block_diff: 25, required: 30 }));
    }

    #[tokio::test]
    async fn init_round_flag_initiates_when_no_claim_pending() {
        let claims = MockClaimsManager {
            last_funded_block: 0,
            required_block_diff: 10,
            ..Default::default()
        };
        let delegate = MockDelegateManager::default();
        let chain = MockChain { block_number: 1_000 };

        let outcome = run_claim_rewards(
            &claims, &delegate, None, &chain, SP_OWNER, WALLET, None, true,
            params(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, ClaimOutcome::RoundInitiated(_)));
        assert_eq!(claims.initiate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(delegate.claim_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn post_claim_transfer_moves_full_balance() {
        let claims = MockClaimsManager { claim_pending: true, ..Default::default() };
        let delegate = MockDelegateManager::default();
        let chain = MockChain { block_number: 1_000 };
        let token = MockToken { balance: U256::from(500), transfer_calls: AtomicUsize::new(0) };

        let outcome = run_claim_rewards(
            &claims,
            &delegate,
            Some(&token),
            &chain,
            SP_OWNER,
            WALLET,
            Some(RECEIVER),
            false,
            params(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, ClaimOutcome::Claimed { transfer_tx: Some(_), .. }));
        assert_eq!(token.transfer_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn post_claim_transfer_skips_zero_balance() {
        let claims = MockClaimsManager { claim_pending: true, ..Default::default() };
        let delegate = MockDelegateManager::default();
        let chain = MockChain { block_number: 1_000 };
        let token = MockToken { balance: U256::ZERO, transfer_calls: AtomicUsize::new(0) };

        let outcome = run_claim_rewards(
            &claims,
            &delegate,
            Some(&token),
            &chain,
            SP_OWNER,
            WALLET,
            Some(RECEIVER),
            false,
            params(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, ClaimOutcome::Claimed { transfer_tx: None, .. }));
        assert_eq!(token.transfer_calls.load(Ordering::SeqCst), 0);
    }
}
