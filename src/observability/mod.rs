//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (addresses, amounts, tx hashes)
//!
//! Consumers:
//!     → stderr, human-readable or JSON (observability.json_logs)
//! ```

pub mod logging;

pub use logging::init_logging;
