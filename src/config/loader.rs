//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::SwapConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides `api.api_key`.
pub const API_KEY_ENV_VAR: &str = "SWAP_API_KEY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SwapConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<SwapConfig, ConfigError> {
    let mut config: SwapConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Resolve the configuration: the file when given, defaults otherwise.
pub fn load_or_default(path: Option<&Path>) -> Result<SwapConfig, ConfigError> {
    match path {
        Some(p) => load_config(p),
        None => {
            let mut config = SwapConfig::default();
            apply_env_overrides(&mut config);
            Ok(config)
        }
    }
}

/// Secrets come from the environment and win over file values.
fn apply_env_overrides(config: &mut SwapConfig) {
    if let Ok(key) = std::env::var(API_KEY_ENV_VAR) {
        if !key.is_empty() {
            config.api.api_key = Some(key);
        }
    }
}
