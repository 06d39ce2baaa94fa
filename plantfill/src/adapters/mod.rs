//! Source Adapters
//!
//! One adapter per external source, each implementing
//! [`SourceAdapter`](crate::types::SourceAdapter):
//! 1. **gbif_client** - GBIF species match + detail (common name)
//! 2. **tropicos_client** - Tropicos name search (literal Latin), needs API key
//! 3. **reference_table** - curated JSON tables, builtin plus configured files
//!
//! Remote adapters share [`http::HttpSource`] (timeout, throttle, retry) and
//! own a [`cache::ResponseCache`] directory.
//!
//! # Parallel Execution
//! [`ParallelFetcher`] queries every adapter for a species concurrently and
//! hands results back in adapter order, so merge precedence never depends on
//! which source answered first.

pub mod cache;
pub mod gbif_client;
pub mod http;
pub mod reference_table;
pub mod tropicos_client;

use crate::config::resolve_api_key;
use crate::error::EnrichResult;
use crate::models::{PlantRecord, SourceId};
use crate::types::{FetchError, SourceAdapter};
use futures::future::join_all;
use plantfill_common::EnrichConfig;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use gbif_client::GbifClient;
pub use http::HttpSettings;
pub use reference_table::{ReferenceTable, ReferenceTableAdapter};
pub use tropicos_client::TropicosClient;

/// Concurrent fetch over an ordered adapter list
pub struct ParallelFetcher {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

/// Result of one adapter for one species
#[derive(Debug)]
pub struct FetchOutcome {
    pub source: SourceId,
    pub adapter_name: &'static str,
    pub result: Result<PlantRecord, FetchError>,
}

impl ParallelFetcher {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    /// Query all adapters concurrently
    ///
    /// # Returns
    /// One outcome per adapter, in adapter order. Failures are returned as
    /// values and logged; they never cancel the other fetches.
    pub async fn fetch_all(&self, species: &str) -> Vec<FetchOutcome> {
        let futures = self.adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            async move {
                let name = adapter.name();
                let result = adapter.fetch(species).await;
                match &result {
                    Ok(record) => debug!(
                        adapter = name,
                        species,
                        fields = record.field_provenance().len(),
                        "Fetch successful"
                    ),
                    Err(e) if e.is_unconfigured() => debug!(adapter = name, species, "Adapter unconfigured, skipped"),
                    Err(FetchError::NotFound(_)) => debug!(adapter = name, species, "No entry"),
                    Err(e) => warn!(
                        adapter = name,
                        species,
                        error = %e,
                        "Fetch failed (per-source error isolation)"
                    ),
                }
                FetchOutcome {
                    source: adapter.source(),
                    adapter_name: name,
                    result,
                }
            }
        });

        join_all(futures).await
    }

    pub fn count(&self) -> usize {
        self.adapters.len()
    }
}

/// Build the configured adapter list in merge priority order
///
/// GBIF, then Tropicos, then the reference tables. With `offline` set, only
/// the reference tables are used.
///
/// # Errors
/// Fails if a reference table cannot be loaded or an HTTP client cannot be built.
pub fn build_adapters(config: &EnrichConfig, offline: bool) -> EnrichResult<Vec<Arc<dyn SourceAdapter>>> {
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();

    if offline {
        info!("Offline mode: remote sources disabled");
    } else {
        let settings = HttpSettings::from_config(config);
        adapters.push(Arc::new(GbifClient::new(&settings, &config.cache_dir)?));

        let tropicos_key = resolve_api_key(config, SourceId::Tropicos);
        if tropicos_key.is_none() {
            info!("Tropicos API key not configured, Tropicos lookups will be skipped");
        }
        adapters.push(Arc::new(TropicosClient::new(tropicos_key, &settings, &config.cache_dir)?));
    }

    let table = ReferenceTable::load(config.use_builtin_reference, &config.reference_tables)?;
    if !table.is_empty() {
        info!(entries = table.len(), "Reference tables loaded");
        adapters.push(Arc::new(ReferenceTableAdapter::new(Arc::new(table))));
    }

    Ok(adapters)
}

// ============================================================================
// Mock Adapter for Testing
// ============================================================================
