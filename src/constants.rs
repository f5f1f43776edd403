//! Shared constants for health checks and reward claiming.

use std::time::Duration;

use alloy_primitives::{Address, address};

/// Expected mount path reported by the storage node's disk check.
pub const STORAGE_PATH: &str = "/file_storage";

/// Minimum free disk space (in TB) a storage node must report.
pub const MIN_AVAILABLE_TB: f64 = 1.5;

/// Content-identifier prefix all stored content hashes must carry.
pub const CID_PREFIX: &str = "Qm";

/// Maximum acceptable indexing lag (in blocks) for a discovery node.
pub const MAX_BLOCK_DIFFERENCE: i64 = 5;

/// Large reference file streamed through the storage node's upload check.
pub const SAMPLE_FILE_URL: &str =
    "https://s3-us-west-1.amazonaws.com/download.audius.co/sp-health-check-files/97mb_music.mp3";

/// External IP resolution service used by the discovery IP-consistency check.
pub const IP_API_URL: &str = "https://ipapi.co/json";

/// Gas-price oracle queried when no explicit gas price is supplied.
pub const GAS_ORACLE_URL: &str = "https://ethgasstation.info/api/ethgasAPI.json";

/// Number of random bytes signed by the authenticated duration checks.
pub const NONCE_LEN: usize = 18;

/// Default timeout for the quick (unauthenticated) health checks.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the long-running duration and file-upload checks.
pub const LONG_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Default registry contract address on mainnet.
pub const DEFAULT_REGISTRY_ADDRESS: Address =
    address!("d976d3b4f4e22a238c1A736b6612D22f17b6f64C");

/// Default token contract address on mainnet.
pub const DEFAULT_TOKEN_ADDRESS: Address = address!("18aAA7115705e8be94bfFEBDE57Af9BFc265B998");

/// Default Ethereum RPC provider URL.
pub const DEFAULT_WEB3_PROVIDER: &str =
    "https://mainnet.infura.io/v3/a3ed533ddfca4c76ab4df7556e2745e1";

/// Registry key under which the claims-manager proxy is registered.
pub const CLAIMS_MANAGER_REGISTRY_KEY: &str = "ClaimsManagerProxy";

/// Registry key under which the delegate-manager proxy is registered.
pub const DELEGATE_MANAGER_REGISTRY_KEY: &str = "DelegateManagerProxy";

/// Default gas limit for `initiateRound` transactions.
pub const DEFAULT_INITIATE_GAS: u64 = 100_000;

/// Default gas limit for `claimRewards` transactions.
pub const DEFAULT_CLAIM_GAS: u64 = 1_500_000;

/// Wei per gwei.
pub const GWEI: u128 = 1_000_000_000;
