//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the swap tool.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the swap tool.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SwapConfig {
    /// Blockchain RPC settings.
    pub blockchain: BlockchainConfig,

    /// Quote API settings.
    pub api: QuoteApiConfig,

    /// Swap workflow settings (spender, approval policy).
    pub swap: SwapSettings,

    /// Retry configuration for quote requests.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Blockchain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations required for finality.
    pub confirmation_blocks: u32,

    /// Maximum time to wait for a transaction to confirm, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Gas price multiplier (1.0 = node price, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 1,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 180,
            gas_price_multiplier: 1.2,
            max_gas_price_gwei: 500,
        }
    }
}

/// Quote API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuoteApiConfig {
    /// API base URL, without the quote path.
    pub base_url: String,

    /// Path of the quote endpoint.
    pub quote_path: String,

    /// API key sent in the `0x-api-key` header. `SWAP_API_KEY` overrides it.
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for QuoteApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.0x.org".to_string(),
            quote_path: "/swap/v1/quote".to_string(),
            api_key: None,
            request_timeout_secs: 15,
        }
    }
}

/// How much allowance to grant when the current one is too low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    /// Approve exactly the amount being sold.
    #[default]
    Exact,
    /// Approve `U256::MAX` so later swaps skip the approval step.
    Unlimited,
}

/// Swap workflow settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SwapSettings {
    /// Contract that pulls the sell token (0x Exchange Proxy by default).
    pub spender: String,

    /// Approval policy.
    pub approval: ApprovalMode,

    /// Maximum acceptable slippage, e.g. 0.01 for 1%. Left to the API when unset.
    pub slippage_percentage: Option<f64>,

    /// Wait for the swap transaction to be mined before returning.
    pub wait_for_receipt: bool,
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self {
            spender: "0xDef1C0ded9bec7F1a1670819833240f027b25EfF".to_string(),
            approval: ApprovalMode::Exact,
            slippage_percentage: None,
            wait_for_receipt: true,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 250,
            max_delay_ms: 4000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
