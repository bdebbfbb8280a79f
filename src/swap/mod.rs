//! Token swap workflow.

pub mod executor;
pub mod types;

pub use executor::{ChainAccess, QuoteSource, SwapExecutor};
pub use types::{SwapError, SwapPolicy, SwapReceipt, SwapRequest};
