//! Gas-price selection for reward transactions.
//!
//! An explicit `--gas-price` (gwei) wins; otherwise the third-party oracle is
//! consulted, falling back to the node's own `eth_gasPrice` estimate when the
//! oracle is unreachable.

use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ClaimError, contracts::ChainClient};
use crate::constants::GWEI;

/// Subset of the gas-price oracle response. The `fast` tier is reported in
/// tenths of a gwei.
#[derive(Debug, Deserialize)]
struct OracleResponse {
    fast: f64,
}

/// Fetches the oracle's fast-tier gas price in wei.
async fn fetch_oracle_fast(client: &Client, oracle_url: &Url) -> Result<u128, ClaimError> {
    let response = client
        .get(oracle_url.clone())
        .send()
        .await
        .map_err(|e| ClaimError::Oracle(format!("request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(ClaimError::Oracle(format!("unexpected status {}", response.status())));
    }

    let body: OracleResponse = response
        .json()
        .await
        .map_err(|e| ClaimError::Oracle(format!("malformed response: {e}")))?;

    if !body.fast.is_finite() || body.fast <= 0.0 {
        return Err(ClaimError::Oracle(format!("implausible fast price {}", body.fast)));
    }

    // fast is gwei * 10, so wei = fast * 1e8.
    Ok((body.fast * 1e8) as u128)
}

/// Resolves the gas price (in wei) for this run.
pub async fn resolve_gas_price(
    explicit_gwei: Option<u64>,
    client: &Client,
    oracle_url: &Url,
    chain: &dyn ChainClient,
) -> Result<u128, ClaimError> {
    if let Some(gwei) = explicit_gwei {
        return Ok(u128::from(gwei) * GWEI);
    }

    match fetch_oracle_fast(client, oracle_url).await {
        Ok(wei) => {
            debug!(gas_price_wei = wei, "Using oracle gas price");
            Ok(wei)
        }
        Err(e) => {
            warn!("Gas oracle unavailable ({e}), falling back to node gas estimate");
            chain.gas_price().await
        }
    }
}
