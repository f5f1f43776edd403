//! Health-check runners for deployed service-provider nodes.
//!
//! Each runner executes a fixed, ordered list of independent checks against a
//! single base URL, logging one line per check and stopping at the first
//! failure. The only tolerated failure is a gateway timeout on the
//! long-running duration probe, which is reported as a warning.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

mod creator;
mod discovery;

pub use creator::{CreatorNodeChecker, parse_available};
pub use discovery::DiscoveryNodeChecker;

/// Errors produced by an individual health check.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The request could not be sent or the transport failed.
    #[error("request to {url} failed: {source}")]
    Http {
        /// Request URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with an unexpected HTTP status.
    #[error("unexpected status {status} from {url}")]
    Status {
        /// Request URL.
        url: String,
        /// Returned status code.
        status: StatusCode,
    },

    /// The response body did not match the expected contract.
    #[error("{0}")]
    FailedAssertion(String),

    /// The response body could not be interpreted.
    #[error("invalid response from {url}: {reason}")]
    InvalidResponse {
        /// Request URL.
        url: String,
        /// Why the body was rejected.
        reason: String,
    },

    /// Request signing failed.
    #[error(transparent)]
    Signer(#[from] crate::signer::SignerError),
}

impl CheckError {
    /// Returns true for the structured conditions the duration probe is
    /// allowed to fail with: an upstream gateway timeout or a transport-level
    /// timeout. Matching on error-message substrings is deliberately avoided.
    pub fn is_gateway_timeout(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == StatusCode::GATEWAY_TIMEOUT,
            Self::Http { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

/// Outcome of a single health check within one run.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Human-readable check name.
    pub name: &'static str,
    /// Whether the check passed (tolerated timeouts count as passed).
    pub passed: bool,
    /// Failure message or tolerated-timeout note.
    pub detail: Option<String>,
}

impl CheckOutcome {
    fn passed(name: &'static str) -> Self {
        Self { name, passed: true, detail: None }
    }

    fn passed_with_detail(name: &'static str, detail: String) -> Self {
        Self { name, passed: true, detail: Some(detail) }
    }

    fn failed(name: &'static str, detail: String) -> Self {
        Self { name, passed: false, detail: Some(detail) }
    }
}

/// Returns true if every outcome in a run passed.
pub fn all_passed(outcomes: &[CheckOutcome]) -> bool {
    outcomes.iter().all(|outcome| outcome.passed)
}

/// Records a check result, logging it in the operator-facing format.
/// Returns false when the run must stop.
fn record(
    outcomes: &mut Vec<CheckOutcome>,
    name: &'static str,
    result: Result<(), CheckError>,
) -> bool {
    match result {
        Ok(()) => {
            info!("{name} passed");
            outcomes.push(CheckOutcome::passed(name));
            true
        }
        Err(e) => {
            error!("{name} failed: {e}");
            outcomes.push(CheckOutcome::failed(name, e.to_string()));
            false
        }
    }
}

/// Issues a GET and returns the parsed JSON body, requiring HTTP 200.
async fn get_json(client: &Client, url: Url, timeout: Duration) -> Result<Value, CheckError> {
    get_json_with_query::<()>(client, url, timeout, None).await
}

/// Issues a GET and requires HTTP 200, ignoring the response body.
async fn get_ok(client: &Client, url: Url, timeout: Duration) -> Result<(), CheckError> {
    let display_url = url.to_string();
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|source| CheckError::Http { url: display_url.clone(), source })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(CheckError::Status { url: display_url, status });
    }
    Ok(())
}

/// Issues a GET with optional query parameters and returns the parsed JSON
/// body, requiring HTTP 200.
async fn get_json_with_query<Q: Serialize + ?Sized>(
    client: &Client,
    url: Url,
    timeout: Duration,
    query: Option<&Q>,
) -> Result<Value, CheckError> {
    let display_url = url.to_string();
    let mut request = client.get(url).timeout(timeout);
    if let Some(query) = query {
        request = request.query(query);
    }

    let response = request
        .send()
        .await
        .map_err(|source| CheckError::Http { url: display_url.clone(), source })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(CheckError::Status { url: display_url, status });
    }

    response.json::<Value>().await.map_err(|e| CheckError::InvalidResponse {
        url: display_url,
        reason: e.to_string(),
    })
}

/// Asserts that the JSON value at `pointer` is present and non-null.
fn require_present(body: &Value, pointer: &str, what: &str) -> Result<(), CheckError> {
    match body.pointer(pointer) {
        Some(value) if !value.is_null() => Ok(()),
        _ => Err(CheckError::FailedAssertion(format!(
            "{what} should not be null or undefined"
        ))),
    }
}

/// Asserts a response-body condition, failing with the given message.
fn ensure(condition: bool, message: impl Into<String>) -> Result<(), CheckError> {
    if condition {
        Ok(())
    } else {
        Err(CheckError::FailedAssertion(message.into()))
    }
}

/// Joins a path onto a base URL. The base keeps any subpath it carries, so
/// `https://host/node` + `health_check` is `https://host/node/health_check`.
fn endpoint_url(base: &Url, path: &str) -> Result<Url, CheckError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path).map_err(|e| CheckError::InvalidResponse {
        url: base.to_string(),
        reason: format!("cannot join path {path}: {e}"),
    })
}
