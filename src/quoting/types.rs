//! Quote API request and response types.

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::blockchain::{GasHints, TokenRef};
use crate::resilience::retries::{is_retryable_status, Retryable};

/// Parameters of one quote request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub sell_token: TokenRef,
    pub buy_token: TokenRef,
    /// Amount of the sell token, in its base units.
    pub sell_amount: U256,
    /// Address that will send the swap transaction.
    pub taker: Address,
    /// Maximum acceptable slippage (0.01 = 1%).
    pub slippage_percentage: Option<f64>,
}

impl QuoteRequest {
    /// Query string pairs in the order the API documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("buyToken", self.buy_token.api_address().to_string()),
            ("sellToken", self.sell_token.api_address().to_string()),
            ("sellAmount", self.sell_amount.to_string()),
            ("takerAddress", self.taker.to_string()),
        ];
        if let Some(slippage) = self.slippage_percentage {
            pairs.push(("slippagePercentage", slippage.to_string()));
        }
        pairs
    }
}

/// One liquidity source and its share of the fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquiditySource {
    pub name: String,
    pub proportion: String,
}

/// A firm quote: price information plus a ready-to-send transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default)]
    pub chain_id: Option<u64>,
    pub price: String,
    #[serde(default)]
    pub guaranteed_price: Option<String>,
    #[serde(default)]
    pub estimated_price_impact: Option<String>,
    /// Contract the swap transaction is sent to.
    pub to: Address,
    /// Swap transaction calldata.
    pub data: Bytes,
    /// Native value attached to the swap transaction.
    #[serde(deserialize_with = "decimal::u256")]
    pub value: U256,
    #[serde(default, deserialize_with = "decimal::opt_u64")]
    pub gas: Option<u64>,
    #[serde(default, deserialize_with = "decimal::opt_u64")]
    pub estimated_gas: Option<u64>,
    #[serde(default, deserialize_with = "decimal::opt_u128")]
    pub gas_price: Option<u128>,
    pub buy_token_address: Address,
    pub sell_token_address: Address,
    #[serde(deserialize_with = "decimal::u256")]
    pub buy_amount: U256,
    #[serde(deserialize_with = "decimal::u256")]
    pub sell_amount: U256,
    /// Contract that needs the sell-token allowance. Zero for native sells.
    #[serde(default)]
    pub allowance_target: Option<Address>,
    #[serde(default)]
    pub sources: Vec<LiquiditySource>,
}

impl Quote {
    /// Gas limit and price the API suggests for the swap transaction.
    pub fn gas_hints(&self) -> GasHints {
        GasHints {
            gas_limit: self.gas.or(self.estimated_gas),
            gas_price: self.gas_price,
        }
    }

    /// The allowance target, if the quote names a real one.
    pub fn spender(&self) -> Option<Address> {
        self.allowance_target.filter(|addr| !addr.is_zero())
    }

    /// Names of the sources that actually take part in the fill.
    pub fn active_sources(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|s| s.proportion.parse::<f64>().map(|p| p > 0.0).unwrap_or(false))
            .map(|s| s.name.as_str())
            .collect()
    }
}

/// One field-level complaint from the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    #[serde(default)]
    pub code: Option<i64>,
    pub reason: String,
}

/// Error payload returned with non-2xx responses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub validation_errors: Vec<ValidationIssue>,
}

impl ApiErrorBody {
    /// One-line description, e.g. `Validation Failed (sellAmount: INSUFFICIENT_ASSET_LIQUIDITY)`.
    pub fn summary(&self) -> String {
        let reason = self.reason.clone().unwrap_or_else(|| "unknown error".to_string());
        if self.validation_errors.is_empty() {
            return reason;
        }
        let details: Vec<String> = self
            .validation_errors
            .iter()
            .map(|v| format!("{}: {}", v.field, v.reason))
            .collect();
        format!("{} ({})", reason, details.join(", "))
    }
}

/// Errors from the quote API.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Quote API returned {status}: {reason}")]
    Api {
        status: reqwest::StatusCode,
        reason: String,
    },

    /// The API answered 2xx but the body is not a quote.
    #[error("Malformed quote response: {0}")]
    Decode(String),

    /// Base URL or path cannot form a valid endpoint.
    #[error("Invalid quote endpoint: {0}")]
    InvalidEndpoint(String),
}

impl QuoteError {
    /// Build an API error from a status and raw body, preferring the API's own reason.
    pub fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        let reason = match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) if parsed.reason.is_some() => parsed.summary(),
            _ if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("no reason given")
                .to_string(),
            _ => body.trim().chars().take(200).collect(),
        };
        QuoteError::Api { status, reason }
    }
}

impl Retryable for QuoteError {
    fn is_retryable(&self) -> bool {
        match self {
            QuoteError::Http(e) => e.is_connect() || e.is_timeout(),
            QuoteError::Api { status, .. } => is_retryable_status(*status),
            QuoteError::Decode(_) | QuoteError::InvalidEndpoint(_) => false,
        }
    }
}

/// Result type for quote operations.
pub type QuoteResult<T> = Result<T, QuoteError>;

/// The API encodes big integers as decimal strings; accept plain numbers too.
mod decimal {
    use super::*;
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(u64),
        Str(String),
    }

    fn parse_u256(s: &str) -> Result<U256, String> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x") {
            Some(hex) => U256::from_str_radix(hex, 16),
            None => U256::from_str_radix(s, 10),
        };
        parsed.map_err(|e| format!("invalid integer '{}': {}", s, e))
    }

    fn to_u256(raw: NumOrStr) -> Result<U256, String> {
        match raw {
            NumOrStr::Num(n) => Ok(U256::from(n)),
            NumOrStr::Str(s) => parse_u256(&s),
        }
    }

    pub fn u256<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
        to_u256(NumOrStr::deserialize(d)?).map_err(D::Error::custom)
    }

    pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        match Option::<NumOrStr>::deserialize(d)? {
            None => Ok(None),
            Some(raw) => {
                let v = to_u256(raw).map_err(D::Error::custom)?;
                u64::try_from(v).map(Some).map_err(D::Error::custom)
            }
        }
    }

    pub fn opt_u128<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u128>, D::Error> {
        match Option::<NumOrStr>::deserialize(d)? {
            None => Ok(None),
            Some(raw) => {
                let v = to_u256(raw).map_err(D::Error::custom)?;
                u128::try_from(v).map(Some).map_err(D::Error::custom)
            }
        }
    }
}
