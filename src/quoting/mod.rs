//! Swap quote retrieval.

pub mod client;
pub mod types;

pub use client::QuoteClient;
pub use types::{ApiErrorBody, LiquiditySource, Quote, QuoteError, QuoteRequest, QuoteResult};
