//! Table enrichment workflow
//!
//! Reads a plant table, runs every row through the aggregator and the row
//! heuristics, and produces the enriched table plus a quality report.
//!
//! # Architecture
//! 1. **table** - CSV input/output and column management
//! 2. **pipeline** - per-row orchestration, cancellation, progress events
//! 3. **heuristics** - fallbacks derived from auxiliary input columns
//! 4. **report** - run statistics and the JSON quality report

pub mod heuristics;
pub mod pipeline;
pub mod report;
pub mod table;

pub use pipeline::{Pipeline, PipelineConfig};
pub use report::{QualityReport, RunStatistics, DEFAULT_REPORT_FILE};
pub use table::PlantTable;

/// Progress notification from a running pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Row enriched (1-based row number)
    RowEnriched {
        row: usize,
        species: String,
        confidence: f64,
    },
    /// Row not enriched because its species name is malformed
    RowSkipped {
        row: usize,
        species: String,
        reason: String,
    },
    /// Cancellation observed; this and later rows pass through
    Cancelled { row: usize },
}
