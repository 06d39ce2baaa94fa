//! Aggregation Layer
//!
//! Merges adapter output into one record per species and scores it.

pub mod confidence_scorer;
pub mod record_aggregator;

pub use confidence_scorer::{ConfidenceScorer, FIELD_WEIGHTS};
pub use record_aggregator::{AggregationOutcome, RecordAggregator, SourceReport};
