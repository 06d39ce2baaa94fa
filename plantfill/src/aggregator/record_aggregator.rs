//! Record Aggregator
//!
//! Queries every adapter for a species concurrently, then merges the answers
//! in adapter order: the first source to supply a field wins it, and fields
//! that already hold a value are never overwritten. The merged record is
//! scored once, after all merges.
//!
//! # Example
//! ```rust,ignore
//! use plantfill::aggregator::RecordAggregator;
//! use plantfill::models::SourceCatalog;
//!
//! let aggregator = RecordAggregator::new(SourceCatalog::standard(), adapters);
//! let record = aggregator.aggregate("Quercus robur").await;
//! println!("{} -> {:.2}", record.species(), record.confidence());
//! ```

use super::confidence_scorer::ConfidenceScorer;
use crate::adapters::ParallelFetcher;
use crate::models::{PlantRecord, RecordField, SourceCatalog, SourceId};
use crate::types::{FetchError, SourceAdapter};
use std::sync::Arc;
use tracing::debug;

/// How one source contributed to a merged record
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    pub source: SourceId,
    /// Fields this source won during the merge
    pub fields_filled: usize,
    /// Fetch failure, if the source did not answer
    pub error: Option<FetchError>,
}

/// Merged record plus per-source detail
#[derive(Debug, Clone)]
pub struct AggregationOutcome {
    pub record: PlantRecord,
    /// Empty when the input record was already complete
    pub sources: Vec<SourceReport>,
}

impl AggregationOutcome {
    /// Sources that failed for a reason other than missing configuration or data
    pub fn failures(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| {
            s.error
                .as_ref()
                .is_some_and(|e| !e.is_unconfigured() && !matches!(e, FetchError::NotFound(_)))
        })
    }
}

pub struct RecordAggregator {
    fetcher: ParallelFetcher,
    scorer: ConfidenceScorer,
}

impl RecordAggregator {
    /// `adapters` are in merge priority order, highest first
    pub fn new(catalog: SourceCatalog, adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self {
            fetcher: ParallelFetcher::new(adapters),
            scorer: ConfidenceScorer::new(catalog),
        }
    }

    pub fn scorer(&self) -> &ConfidenceScorer {
        &self.scorer
    }

    pub fn adapter_count(&self) -> usize {
        self.fetcher.count()
    }

    /// Build a scored record for a species from scratch
    pub async fn aggregate(&self, species: &str) -> PlantRecord {
        self.aggregate_into(PlantRecord::new(species)).await.record
    }

    /// Fill the empty fields of an existing record
    ///
    /// A record with no empty enrichable field is returned untouched apart
    /// from rescoring; no adapter is consulted.
    pub async fn aggregate_into(&self, base: PlantRecord) -> AggregationOutcome {
        let mut record = base;

        if record.is_complete() {
            debug!(species = record.species(), "Record complete, skipping sources");
            self.scorer.apply(&mut record);
            return AggregationOutcome {
                record,
                sources: Vec::new(),
            };
        }

        let species = record.species().to_string();
        let outcomes = self.fetcher.fetch_all(&species).await;

        let mut sources = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome.result {
                Ok(incoming) => {
                    let fields_filled = merge_into(&mut record, &incoming, outcome.source);
                    sources.push(SourceReport {
                        source: outcome.source,
                        fields_filled,
                        error: None,
                    });
                }
                Err(error) => sources.push(SourceReport {
                    source: outcome.source,
                    fields_filled: 0,
                    error: Some(error),
                }),
            }
        }

        let score = self.scorer.apply(&mut record);
        debug!(species = %species, confidence = score, "Record aggregated");

        AggregationOutcome { record, sources }
    }
}

/// Copy empty fields from `incoming` into `target`, with provenance
///
/// Values the adapter left untagged are attributed to the adapter itself.
///
/// # Returns
/// Number of fields written.
fn merge_into(target: &mut PlantRecord, incoming: &PlantRecord, source: SourceId) -> usize {
    let mut filled = 0;

    if let Some(confirmed_by) = incoming.provenance(RecordField::Species) {
        target.confirm_species(confirmed_by);
    }

    for field in RecordField::ENRICHABLE {
        if target.is_filled(field) {
            continue;
        }
        if let Some(value) = incoming.get(field) {
            let provenance = incoming.provenance(field).unwrap_or(source);
            if target.fill(field, value, Some(provenance)) {
                filled += 1;
            }
        }
    }

    filled
}
