//! Error types for plantfill
//!
//! Fetch failures never reach this type: they stay inside the aggregator as
//! [`FetchError`](crate::types::FetchError) values. `EnrichError` covers what
//! aborts a run: unreadable input, unwritable output, bad configuration.

use crate::adapters::reference_table::ReferenceTableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnrichError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input or output table could not be parsed or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Report serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input table lacks a required column
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Reference table could not be loaded
    #[error(transparent)]
    ReferenceTable(#[from] ReferenceTableError),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// plantfill-common error
    #[error("Common error: {0}")]
    Common(#[from] plantfill_common::Error),
}

pub type EnrichResult<T> = std::result::Result<T, EnrichError>;
