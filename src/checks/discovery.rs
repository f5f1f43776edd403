//! Discovery node health-check sequence.

use reqwest::Client;

use super::{CheckError, CheckOutcome, endpoint_url, ensure, get_json, record};
use crate::config::DiscoveryNodeConfig;
use crate::constants::MAX_BLOCK_DIFFERENCE;

/// Runs the ordered health-check sequence against one discovery node.
#[derive(Debug, Clone)]
pub struct DiscoveryNodeChecker {
    client: Client,
    config: DiscoveryNodeConfig,
}

impl DiscoveryNodeChecker {
    /// Creates a checker for the configured discovery node.
    pub fn new(config: DiscoveryNodeConfig) -> Result<Self, CheckError> {
        let client = Client::builder().build().map_err(|source| CheckError::Http {
            url: config.endpoint.to_string(),
            source,
        })?;
        Ok(Self { client, config })
    }

    /// Executes the full check sequence, stopping at the first failure.
    pub async fn run(&self) -> Vec<CheckOutcome> {
        let mut outcomes = Vec::new();
        if !record(&mut outcomes, "Health check", self.health_check().await) {
            return outcomes;
        }
        record(&mut outcomes, "IP check", self.ip_check().await);
        outcomes
    }

    /// `GET /health_check` — database row count and indexing lag.
    async fn health_check(&self) -> Result<(), CheckError> {
        let url = endpoint_url(&self.config.endpoint, "health_check")?;
        let body = get_json(&self.client, url, self.config.request_timeout).await?;

        let db_number = body.pointer("/data/db/number").and_then(|v| v.as_i64()).unwrap_or(0);
        ensure(db_number > 0, format!("database reports {db_number} rows, expected more than 0"))?;

        let block_difference =
            body.pointer("/data/block_difference").and_then(|v| v.as_i64()).unwrap_or(i64::MAX);
        ensure(
            block_difference < MAX_BLOCK_DIFFERENCE,
            format!(
                "block difference {block_difference} exceeds maximum {MAX_BLOCK_DIFFERENCE}"
            ),
        )
    }

    /// `GET /ip_check` against the node, compared with an independent external
    /// IP resolution service. Both must agree.
    async fn ip_check(&self) -> Result<(), CheckError> {
        let url = endpoint_url(&self.config.endpoint, "ip_check")?;
        let node_body = get_json(&self.client, url.clone(), self.config.request_timeout).await?;
        let node_ip = node_body
            .pointer("/data")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CheckError::InvalidResponse {
                url: url.to_string(),
                reason: "missing IP in response data".to_string(),
            })?
            .to_string();

        let api_url = self.config.ip_api_url.clone();
        let api_body =
            get_json(&self.client, api_url.clone(), self.config.request_timeout).await?;
        let api_ip = api_body
            .pointer("/ip")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CheckError::InvalidResponse {
                url: api_url.to_string(),
                reason: "missing IP in resolver response".to_string(),
            })?
            .to_string();

        ensure(
            node_ip == api_ip,
            format!("node reports IP {node_ip} but external resolver reports {api_ip}"),
        )
    }
}
