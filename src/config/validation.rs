//! Configuration validation.
//!
//! Serde handles the syntax; this module checks values that parse but make no
//! sense (unparseable URLs and addresses, zero timeouts, negative multipliers).
//! All problems are collected instead of stopping at the first one.

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::SwapConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `blockchain.rpc_url`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration, returning every error found.
pub fn validate_config(config: &SwapConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let chain = &config.blockchain;
    if url::Url::parse(&chain.rpc_url).is_err() {
        errors.push(ValidationError::new("blockchain.rpc_url", "not a valid URL"));
    }
    for (i, failover) in chain.failover_urls.iter().enumerate() {
        if url::Url::parse(failover).is_err() {
            errors.push(ValidationError::new(
                &format!("blockchain.failover_urls[{}]", i),
                "not a valid URL",
            ));
        }
    }
    if chain.chain_id == 0 {
        errors.push(ValidationError::new("blockchain.chain_id", "must be non-zero"));
    }
    if chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("blockchain.rpc_timeout_secs", "must be > 0"));
    }
    if chain.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "blockchain.confirmation_timeout_secs",
            "must be > 0",
        ));
    }
    if !(chain.gas_price_multiplier.is_finite() && chain.gas_price_multiplier >= 1.0) {
        errors.push(ValidationError::new(
            "blockchain.gas_price_multiplier",
            "must be a finite value >= 1.0",
        ));
    }

    let api = &config.api;
    if url::Url::parse(&api.base_url).is_err() {
        errors.push(ValidationError::new("api.base_url", "not a valid URL"));
    }
    if !api.quote_path.starts_with('/') {
        errors.push(ValidationError::new("api.quote_path", "must start with '/'"));
    }
    if api.request_timeout_secs == 0 {
        errors.push(ValidationError::new("api.request_timeout_secs", "must be > 0"));
    }

    match config.swap.spender.parse::<Address>() {
        Ok(addr) if addr.is_zero() => {
            errors.push(ValidationError::new("swap.spender", "zero address not allowed"));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("swap.spender", e.to_string())),
    }
    if let Some(slippage) = config.swap.slippage_percentage {
        if !(slippage > 0.0 && slippage < 1.0) {
            errors.push(ValidationError::new(
                "swap.slippage_percentage",
                "must be between 0 and 1 (exclusive)",
            ));
        }
    }

    let retries = &config.retries;
    if retries.enabled && retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be >= 1"));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
