//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Quote request:
//!     → reqwest per-request timeout
//!     → On failure: retries.rs (retryable? back off and try again)
//!     → backoff.rs (exponential delay with jitter)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retries only for idempotent calls (the quote GET)
//! - Connection errors, 429 and 5xx are retryable; 4xx are not

pub mod backoff;
pub mod retries;

pub use retries::{retry, Retryable};
