//! Core Types and Trait Definitions for plantfill
//!
//! Defines the source adapter seam of the enrichment pipeline:
//! - **Adapters** turn a species name into a partial [`PlantRecord`]
//! - **Aggregator** merges adapter output in priority order and scores it
//! - **Pipeline** applies the aggregator to every table row
//!
//! Adapter failures are values ([`FetchError`]), never panics, so one source
//! going down cannot abort the other sources or the row.

use crate::models::{PlantRecord, SourceId};
use thiserror::Error;

// ============================================================================
// Source Adapter Trait
// ============================================================================

/// Source adapter trait
///
/// One implementation per external source. Implementations populate only the
/// fields their source is authoritative for and tag each one with
/// [`SourceAdapter::source`] as provenance.
///
/// # Example
/// ```rust,ignore
/// use plantfill::types::{SourceAdapter, FetchError};
/// use plantfill::models::{PlantRecord, RecordField, SourceId};
///
/// pub struct PowoClient;
///
/// #[async_trait::async_trait]
/// impl SourceAdapter for PowoClient {
///     fn source(&self) -> SourceId { SourceId::Powo }
///
///     async fn fetch(&self, species: &str) -> Result<PlantRecord, FetchError> {
///         let mut record = PlantRecord::new(species);
///         record.fill(RecordField::GeneralLocation, "Europe", Some(self.source()));
///         Ok(record)
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Source identity for provenance and cache keys
    fn source(&self) -> SourceId;

    /// Adapter name for logging
    fn name(&self) -> &'static str {
        self.source().display_name()
    }

    /// Fetch whatever this source knows about a species
    ///
    /// # Errors
    /// Returns `FetchError` on any failure (per-source error isolation).
    async fn fetch(&self, species: &str) -> Result<PlantRecord, FetchError>;
}

/// Fetch failure at the adapter boundary
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Required credential absent; no network call was attempted
    #[error("Source not configured: {0}")]
    Unconfigured(String),

    /// Transport-level failure (connect, DNS, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Non-2xx response
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Response body could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// Source has no entry for the species
    #[error("Not found: {0}")]
    NotFound(String),
}

impl FetchError {
    /// True when the adapter was skipped for lack of a credential
    pub fn is_unconfigured(&self) -> bool {
        matches!(self, Self::Unconfigured(_))
    }

    /// True when a retry may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
