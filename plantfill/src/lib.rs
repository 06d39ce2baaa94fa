//! plantfill library interface
//!
//! Enriches botanical plant tables with taxonomic and ecological data from
//! multiple sources. Exposes public APIs for the CLI and integration testing.

pub mod adapters;
pub mod aggregator;
pub mod config;
pub mod error;
pub mod models;
pub mod types;
pub mod validators;
pub mod workflow;

pub use crate::error::{EnrichError, EnrichResult};

use crate::aggregator::RecordAggregator;
use crate::models::SourceCatalog;
use crate::workflow::{Pipeline, PipelineConfig, PlantTable, QualityReport};
use plantfill_common::EnrichConfig;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Files and switches for one enrichment run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub report: PathBuf,
    /// Skip remote sources
    pub offline: bool,
}

/// Read, enrich and write one table
///
/// The output table and report are written even when the run is cancelled;
/// rows not reached pass through unchanged.
///
/// # Errors
/// Fails on unreadable input, unwritable output or unloadable reference
/// tables. Source failures are logged and never abort the run.
pub async fn enrich_file(
    config: &EnrichConfig,
    options: &RunOptions,
    cancel: CancellationToken,
) -> EnrichResult<QualityReport> {
    let input = PlantTable::read_csv(&options.input)?;
    info!(path = %options.input.display(), rows = input.len(), "Input table loaded");

    let adapters = adapters::build_adapters(config, options.offline)?;
    let aggregator = RecordAggregator::new(SourceCatalog::standard(), adapters);
    let pipeline = Pipeline::new(aggregator, PipelineConfig::from_config(config)).with_cancellation(cancel);

    let (output, report) = pipeline.process(input).await?;

    output.write_csv(&options.output)?;
    info!(path = %options.output.display(), rows = output.len(), "Enriched table written");
    report.write_json(&options.report)?;

    Ok(report)
}
