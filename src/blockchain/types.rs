//! Chain-specific types and error definitions.

use alloy::primitives::{address, Address, TxHash};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Re-export BlockchainConfig from config module to avoid duplication
pub use crate::config::schema::BlockchainConfig;

/// Sentinel address the quote API uses for the chain's native coin.
pub const NATIVE_TOKEN_ADDRESS: Address = address!("0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

/// A token taking part in a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenRef {
    /// The chain's native coin (ETH on mainnet). Needs no allowance.
    Native,
    /// An ERC-20 token contract.
    Erc20(Address),
}

impl TokenRef {
    /// Address used when talking to the quote API.
    pub fn api_address(&self) -> Address {
        match self {
            TokenRef::Native => NATIVE_TOKEN_ADDRESS,
            TokenRef::Erc20(addr) => *addr,
        }
    }
}

impl From<Address> for TokenRef {
    fn from(addr: Address) -> Self {
        if addr == NATIVE_TOKEN_ADDRESS {
            TokenRef::Native
        } else {
            TokenRef::Erc20(addr)
        }
    }
}

impl FromStr for TokenRef {
    type Err = BlockchainError;

    /// Accepts `ETH`/`native` (any case), the sentinel address, or a token address.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("eth") || s.eq_ignore_ascii_case("native") {
            return Ok(TokenRef::Native);
        }
        let addr: Address = s
            .parse()
            .map_err(|e| BlockchainError::InvalidToken(format!("'{}': {}", s, e)))?;
        if addr.is_zero() {
            return Err(BlockchainError::InvalidToken("zero address".to_string()));
        }
        Ok(TokenRef::from(addr))
    }
}

impl fmt::Display for TokenRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenRef::Native => write!(f, "native"),
            TokenRef::Erc20(addr) => write!(f, "{}", addr),
        }
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Transaction was not confirmed within expected time.
    #[error("Transaction {tx_hash} not confirmed within {secs} seconds")]
    ConfirmationTimeout { tx_hash: TxHash, secs: u64 },

    /// Transaction was reverted on-chain.
    #[error("Transaction reverted: {0}")]
    Reverted(TxHash),

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Token identifier could not be parsed.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Contract returned data that does not match the ABI.
    #[error("ABI decode error: {0}")]
    Decode(String),

    /// Local transaction assembly or signing failed.
    #[error("Transaction build error: {0}")]
    Build(String),
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Broadcast, not waited for.
    Pending,
    /// Transaction is confirmed with required block depth.
    Confirmed { block_number: u64 },
    /// Transaction was mined but reverted.
    Failed(String),
}

impl ConfirmationStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ConfirmationStatus::Confirmed { .. })
    }
}
