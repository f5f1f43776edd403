//! Canonical request signing for authenticated node endpoints.
//!
//! Remote nodes verify signed requests by recomputing the exact same
//! serialization, so the payload is canonicalized by recursively sorting
//! object keys before hashing. The signature scheme is:
//!
//! 1. Merge an ISO-8601 UTC `timestamp` into the payload.
//! 2. Sort object keys at every nesting level (arrays keep their order).
//! 3. Serialize to compact JSON and hash with Keccak-256.
//! 4. Sign the 32-byte hash as an Ethereum personal message.

use alloy_primitives::keccak256;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use chrono::{SecondsFormat, Utc};
use rand::RngCore;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::constants::NONCE_LEN;

/// Errors produced while signing a request payload.
#[derive(Debug, Error)]
pub enum SignerError {
    /// The payload to sign was not a JSON object.
    #[error("signing payload must be a JSON object, got {0}")]
    PayloadNotAnObject(&'static str),

    /// The underlying ECDSA signing operation failed.
    #[error("signing failed: {0}")]
    Signing(#[from] alloy_signer::Error),
}

/// Timestamp and signature pair attached to authenticated requests.
#[derive(Debug, Clone, Serialize)]
pub struct SignatureResult {
    /// ISO-8601 UTC timestamp recorded at signing time.
    pub timestamp: String,
    /// Hex-encoded 65-byte ECDSA signature (`0x`-prefixed).
    pub signature: String,
}

/// Query parameters for an authenticated health-check request.
#[derive(Debug, Clone, Serialize)]
pub struct SignedQuery {
    /// ISO-8601 UTC timestamp recorded at signing time.
    pub timestamp: String,
    /// Hex-encoded signature over the nonce and timestamp.
    pub signature: String,
    /// Hex-encoded random nonce, bound into the signature.
    #[serde(rename = "randomBytes")]
    pub random_bytes: String,
}

/// Signs `payload` with a fresh timestamp.
pub fn sign_payload(
    payload: &Value,
    signer: &PrivateKeySigner,
) -> Result<SignatureResult, SignerError> {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    sign_payload_with_timestamp(payload, &timestamp, signer)
}

/// Signs `payload` with an explicit timestamp.
///
/// Fully deterministic for a fixed payload, timestamp, and key. Exposed so
/// verifiers (and tests) can recompute signatures for known timestamps.
pub fn sign_payload_with_timestamp(
    payload: &Value,
    timestamp: &str,
    signer: &PrivateKeySigner,
) -> Result<SignatureResult, SignerError> {
    let mut to_sign = match payload {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => return Err(SignerError::PayloadNotAnObject(json_type_name(other))),
    };
    to_sign.insert("timestamp".to_string(), Value::String(timestamp.to_string()));

    let canonical = sort_keys(&Value::Object(to_sign));
    let serialized =
        serde_json::to_string(&canonical).expect("canonical JSON value serializes infallibly");
    let hash = keccak256(serialized.as_bytes());
    let signature = signer.sign_message_sync(hash.as_slice())?;

    Ok(SignatureResult {
        timestamp: timestamp.to_string(),
        signature: format!("0x{}", hex::encode(signature.as_bytes())),
    })
}

/// Builds the signed query-parameter triple for an authenticated request,
/// binding a freshly generated random nonce into the signature.
pub fn generate_signed_query(signer: &PrivateKeySigner) -> Result<SignedQuery, SignerError> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let random_bytes = hex::encode(nonce);

    let payload = serde_json::json!({ "randomBytesToSign": random_bytes });
    let signed = sign_payload(&payload, signer)?;

    Ok(SignedQuery {
        timestamp: signed.timestamp,
        signature: signed.signature,
        random_bytes,
    })
}

/// Recursively sorts object keys so that two equal structures serialize
/// identically regardless of insertion order. Arrays keep element order but
/// recursion descends into their elements.
pub fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (key, val) in entries {
                sorted.insert(key.clone(), sort_keys(val));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        scalar => scalar.clone(),
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
