//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key) + BlockchainConfig (RPC URLs)
//!     → wallet.rs (key loading, signing)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → erc20.rs (balanceOf / allowance / approve encoding)
//!     → transaction.rs (build, sign, broadcast, confirm)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod erc20;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use transaction::{GasHints, TxBuilder};
pub use types::{
    BlockchainConfig, BlockchainError, BlockchainResult, ChainId, ConfirmationStatus, TokenRef,
};
pub use wallet::Wallet;
