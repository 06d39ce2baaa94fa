//! Credential resolution for plantfill
//!
//! Provides two-tier API key resolution with ENV → TOML priority.
//! Environment variables are named `PLANTFILL_<SOURCE>_API_KEY`.

use crate::models::SourceId;
use plantfill_common::EnrichConfig;
use tracing::{info, warn};

/// Environment variable holding a source's API key
pub fn api_key_env_var(source: SourceId) -> String {
    format!("PLANTFILL_{}_API_KEY", source.key().to_ascii_uppercase())
}

/// Resolve a source's API key from environment and config
///
/// **Priority:** ENV → TOML. Blank values count as absent.
///
/// # Returns
/// `None` when neither tier holds a usable key; the adapter then reports
/// itself unconfigured instead of failing the run.
pub fn resolve_api_key(config: &EnrichConfig, source: SourceId) -> Option<String> {
    let var = api_key_env_var(source);
    let env_key = std::env::var(&var).ok().filter(|k| is_valid_key(k));
    let toml_key = config.api_key(source.key()).map(str::to_string);

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} API key found in environment and TOML config. Using {} (highest priority).",
            source, var
        );
    }

    if let Some(key) = env_key {
        info!("{} API key loaded from environment variable", source);
        return Some(key);
    }

    if let Some(key) = toml_key {
        info!("{} API key loaded from TOML config", source);
        return Some(key);
    }

    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
