//! # Plantfill Common Library
//!
//! Shared code for the plantfill workspace:
//! - Error type used across crates
//! - Configuration document loading, defaults and write-back

pub mod config;
pub mod error;

pub use config::{EnrichConfig, InvalidSpeciesMode, LoggingConfig};
pub use error::{Error, Result};
