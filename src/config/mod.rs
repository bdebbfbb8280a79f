//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse, environment overrides)
//!     → validation.rs (semantic checks)
//!     → SwapConfig (validated)
//!     → CLI flags patch individual fields
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so a missing or minimal file works
//! - Secrets (private key, API key) come from environment variables
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    ApprovalMode, BlockchainConfig, ObservabilityConfig, QuoteApiConfig, RetryConfig,
    SwapConfig, SwapSettings,
};
