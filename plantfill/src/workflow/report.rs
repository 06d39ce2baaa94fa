//! Data quality report
//!
//! Summarizes one enrichment run: per-column completeness of the output
//! table, mean confidence over enriched rows, and how many values each
//! source contributed. Written as pretty-printed JSON.

use super::table::{PlantTable, METADATA_COLUMNS};
use crate::error::EnrichResult;
use crate::models::SourceId;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default report file name
pub const DEFAULT_REPORT_FILE: &str = "data_quality_report.json";

/// Counters accumulated while processing rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    /// Rows dropped for an empty or `nan` species cell
    pub dropped_empty: usize,
    /// Rows whose species failed validation
    pub invalid_species: usize,
    /// Pre-existing values that failed a vocabulary check
    pub flagged_values: usize,
    /// Rows passed through untouched after cancellation
    pub passed_through: usize,
    /// Confidence of every enriched row
    pub confidences: Vec<f64>,
    /// Values written per source
    pub source_counts: BTreeMap<SourceId, usize>,
    pub cancelled: bool,
}

impl RunStatistics {
    pub fn enriched_records(&self) -> usize {
        self.confidences.len()
    }

    /// Mean confidence over enriched rows, two decimals (0.0 when none)
    pub fn average_confidence(&self) -> f64 {
        if self.confidences.is_empty() {
            return 0.0;
        }
        let mean = self.confidences.iter().sum::<f64>() / self.confidences.len() as f64;
        crate::aggregator::confidence_scorer::round_score(mean)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub timestamp: DateTime<Utc>,
    pub total_records: usize,
    /// Column -> `"NN.N%"`, in output column order
    pub fields_completeness: IndexMap<String, String>,
    pub average_confidence: f64,
    pub enriched_records: usize,
    pub invalid_species: usize,
    pub flagged_values: usize,
    /// Source display name -> values contributed
    pub data_source_distribution: BTreeMap<String, usize>,
    pub cancelled: bool,
}

impl QualityReport {
    pub fn build(table: &PlantTable, stats: &RunStatistics) -> Self {
        let total = table.len();

        let fields_completeness = table
            .headers()
            .iter()
            .enumerate()
            .filter(|(_, name)| !METADATA_COLUMNS.iter().any(|m| m.eq_ignore_ascii_case(name)))
            .map(|(index, name)| {
                let filled = table
                    .rows()
                    .iter()
                    .filter(|row| row.get(index).is_some_and(|cell| !cell.trim().is_empty()))
                    .count();
                let percent = if total == 0 {
                    0.0
                } else {
                    filled as f64 / total as f64 * 100.0
                };
                (name.clone(), format!("{:.1}%", percent))
            })
            .collect();

        let data_source_distribution = stats
            .source_counts
            .iter()
            .map(|(source, count)| (source.display_name().to_string(), *count))
            .collect();

        Self {
            timestamp: Utc::now(),
            total_records: total,
            fields_completeness,
            average_confidence: stats.average_confidence(),
            enriched_records: stats.enriched_records(),
            invalid_species: stats.invalid_species,
            flagged_values: stats.flagged_values,
            data_source_distribution,
            cancelled: stats.cancelled,
        }
    }

    pub fn write_json(&self, path: &Path) -> EnrichResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Data quality report saved");
        Ok(())
    }
}
