//! Configuration loading and config file resolution
//!
//! The configuration document is a small TOML file. A missing file is written
//! back with built-in defaults on first run; a file that exists but cannot be
//! read or parsed is a fatal startup error.
//!
//! # Config File Resolution
//!
//! 1. Command-line argument (highest priority)
//! 2. `PLANTFILL_CONFIG` environment variable
//! 3. `plantfill.toml` in the working directory, if present
//! 4. `<user config dir>/plantfill/plantfill.toml`, if present
//! 5. `plantfill.toml` in the working directory (created with defaults)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PLANTFILL_CONFIG";

/// Default config file name
pub const DEFAULT_CONFIG_FILE: &str = "plantfill.toml";

/// Enrichment run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Network request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Extra attempts after a transient fetch failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Minimum delay between network calls to one source, in seconds
    ///
    /// Courtesy throttle only; cache hits never wait on it.
    #[serde(default = "default_rate_limit_delay")]
    pub rate_limit_delay: f64,

    /// Root directory for per-source response caches
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// What to do with rows whose species name fails validation
    #[serde(default)]
    pub on_invalid_species: InvalidSpeciesMode,

    /// Load the reference table compiled into the binary
    #[serde(default = "default_true")]
    pub use_builtin_reference: bool,

    /// Additional reference table files (JSON)
    #[serde(default)]
    pub reference_tables: Vec<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Source name -> credential. Empty string means unconfigured.
    #[serde(default = "default_api_keys")]
    pub api_keys: BTreeMap<String, String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr only if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Open the configured log file for appending
    ///
    /// Missing parent directories are created. `None` when no file is set.
    pub fn open_file(&self) -> Result<Option<File>> {
        let Some(path) = &self.file else {
            return Ok(None);
        };
        create_parent_dir(path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::Config(format!("Open log file {} failed: {}", path.display(), e)))?;
        Ok(Some(file))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Handling of rows whose species name is malformed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidSpeciesMode {
    /// Emit the row unchanged, without enrichment
    #[default]
    Keep,
    /// Drop the row from the output
    Skip,
}

impl fmt::Display for InvalidSpeciesMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => f.write_str("keep"),
            Self::Skip => f.write_str("skip"),
        }
    }
}

impl FromStr for InvalidSpeciesMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "skip" => Ok(Self::Skip),
            other => Err(Error::InvalidInput(format!(
                "on_invalid_species must be 'keep' or 'skip', got '{}'",
                other
            ))),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_rate_limit_delay() -> f64 {
    1.0
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_keys() -> BTreeMap<String, String> {
    ["tropicos", "ipni", "eol"]
        .into_iter()
        .map(|name| (name.to_string(), String::new()))
        .collect()
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            rate_limit_delay: default_rate_limit_delay(),
            cache_dir: default_cache_dir(),
            on_invalid_species: InvalidSpeciesMode::default(),
            use_builtin_reference: true,
            reference_tables: Vec::new(),
            logging: LoggingConfig::default(),
            api_keys: default_api_keys(),
        }
    }
}

impl EnrichConfig {
    /// Parse a TOML document, filling omitted keys with defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, creating the file with defaults when missing
    ///
    /// Runs before logging is set up, so it reports nothing itself.
    ///
    /// # Errors
    /// Returns `Error::Config` if the file exists but cannot be read or parsed,
    /// or if it is missing and cannot be created.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Read {} failed: {}", path.display(), e))
            })?;
            return Self::from_toml_str(&content);
        }

        let config = Self::default();
        write_toml_config(&config, path)?;
        Ok(config)
    }

    /// Reject values that cannot be turned into durations
    pub fn validate(&self) -> Result<()> {
        if Duration::try_from_secs_f64(self.rate_limit_delay).is_err() {
            return Err(Error::Config(format!(
                "rate_limit_delay must be a non-negative number of seconds, got {}",
                self.rate_limit_delay
            )));
        }
        if self.timeout == 0 {
            return Err(Error::Config("timeout must be at least 1 second".to_string()));
        }
        Ok(())
    }

    /// Network timeout as a `Duration`
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Courtesy throttle as a `Duration` (zero disables throttling)
    pub fn rate_limit_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.rate_limit_delay).unwrap_or_default()
    }

    /// Configured credential for a source, if any
    ///
    /// Lookup is case-insensitive on the source name; blank values count as absent.
    pub fn api_key(&self, source: &str) -> Option<&str> {
        self.api_keys
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(source))
            .map(|(_, key)| key.as_str())
            .filter(|key| !key.trim().is_empty())
    }
}

/// Write configuration as TOML, creating parent directories
///
/// The content goes to a sibling temp file first and is renamed into place.
pub fn write_toml_config(config: &EnrichConfig, path: &Path) -> Result<()> {
    create_parent_dir(path)?;

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    let temp_path = path.with_extension(format!("toml.{}.tmp", std::process::id()));
    std::fs::write(&temp_path, content)
        .map_err(|e| Error::Config(format!("Write {} failed: {}", temp_path.display(), e)))?;
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Config(format!("Write {} failed: {}", path.display(), e)));
    }
    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Create {} failed: {}", parent.display(), e))
            })?;
        }
    }
    Ok(())
}

/// User-Agent sent with every outbound request
pub fn user_agent() -> String {
    format!(
        "plantfill/{} ( https://github.com/plantfill/plantfill )",
        env!("CARGO_PKG_VERSION")
    )
}

/// Resolve which config file to use (see module docs for priority order)
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
        warn!("{} is set but empty, ignoring", CONFIG_ENV_VAR);
    }

    // Priority 3: Working directory
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }

    // Priority 4: User config directory
    if let Some(user) = dirs::config_dir().map(|d| d.join("plantfill").join(DEFAULT_CONFIG_FILE)) {
        if user.exists() {
            return user;
        }
    }

    // Priority 5: create next to the data
    local
}
