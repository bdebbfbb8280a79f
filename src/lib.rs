//! Token swap workflow against a DEX quote API.
//!
//! Checks the taker's balance, makes sure the exchange may spend the sell
//! token, fetches a quote, and submits the transaction the quote describes.

pub mod blockchain;
pub mod config;
pub mod observability;
pub mod quoting;
pub mod resilience;
pub mod swap;

pub use config::SwapConfig;
pub use quoting::QuoteClient;
pub use swap::{SwapExecutor, SwapRequest};
