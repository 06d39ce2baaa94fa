//! Pipeline Orchestrator
//!
//! Applies the aggregator to every row of a plant table.
//!
//! # Per-row phases
//! 1. **Screen**: drop rows with an empty or `nan` species; validate the name
//! 2. **Load**: existing cells become the base record (manual values)
//! 3. **Flag**: vocabulary checks on existing values, logged only
//! 4. **Aggregate**: sources fill the empty fields
//! 5. **Fallback**: row heuristics fill what the sources left empty
//! 6. **Write back**: empty cells only, plus provenance, confidence, timestamp
//!
//! Rows are processed in input order and the output keeps that order. Once
//! cancellation is requested, the remaining rows pass through unchanged.
//!
//! # Example
//! ```rust,ignore
//! let pipeline = Pipeline::new(aggregator, PipelineConfig::from_config(&config))
//!     .with_cancellation(token.clone());
//! let (table, report) = pipeline.process(PlantTable::read_csv(input)?).await?;
//! ```

use super::heuristics::{
    self, RowHints, GEOGRAPHIC_ORIGIN_COLUMN, GROWTH_FORM_COLUMN, GROWTH_HABIT_COLUMN,
    HORTICULTURAL_COLUMN, LIFE_FORM_TYPE_COLUMN,
};
use super::report::{QualityReport, RunStatistics};
use super::table::{PlantTable, CONFIDENCE_SCORE_COLUMN, DATA_SOURCES_COLUMN, LAST_UPDATED_COLUMN};
use super::PipelineEvent;
use crate::aggregator::RecordAggregator;
use crate::error::EnrichResult;
use crate::models::{PlantRecord, RecordField, SourceId};
use crate::validators::{normalize_species_name, validate_record, validate_species_name};
use chrono::SecondsFormat;
use plantfill_common::{EnrichConfig, InvalidSpeciesMode};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Keep or drop rows with a malformed species name
    pub on_invalid_species: InvalidSpeciesMode,
}

impl PipelineConfig {
    pub fn from_config(config: &EnrichConfig) -> Self {
        Self {
            on_invalid_species: config.on_invalid_species,
        }
    }
}

/// Output column positions, resolved once per run
struct Columns {
    species: usize,
    fields: Vec<(RecordField, usize)>,
    data_sources: usize,
    confidence: usize,
    last_updated: usize,
    growth_form: Option<usize>,
    life_form_type: Option<usize>,
    geographic_origin: Option<usize>,
    horticultural: Option<usize>,
    growth_habit: Option<usize>,
}

impl Columns {
    /// Resolve positions, appending any missing field and metadata columns
    fn prepare(table: &mut PlantTable) -> EnrichResult<Self> {
        let species = table.species_column()?;
        let fields = RecordField::ENRICHABLE
            .iter()
            .map(|&field| (field, table.ensure_column(field.column())))
            .collect();

        Ok(Self {
            species,
            fields,
            data_sources: table.ensure_column(DATA_SOURCES_COLUMN),
            confidence: table.ensure_column(CONFIDENCE_SCORE_COLUMN),
            last_updated: table.ensure_column(LAST_UPDATED_COLUMN),
            growth_form: table.column_index(GROWTH_FORM_COLUMN),
            life_form_type: table.column_index(LIFE_FORM_TYPE_COLUMN),
            geographic_origin: table.column_index(GEOGRAPHIC_ORIGIN_COLUMN),
            horticultural: table.column_index(HORTICULTURAL_COLUMN),
            growth_habit: table.column_index(GROWTH_HABIT_COLUMN),
        })
    }

    fn hints<'a>(&self, table: &PlantTable, row: &'a [String]) -> RowHints<'a> {
        RowHints {
            growth_form: table.cell(row, self.growth_form),
            life_form_type: table.cell(row, self.life_form_type),
            geographic_origin: table.cell(row, self.geographic_origin),
            horticultural_development: self.horticultural.map(|i| table.cell(row, Some(i))),
            growth_habit: self.growth_habit.map(|i| table.cell(row, Some(i))),
        }
    }
}

/// Result of enriching one row
enum RowDisposition {
    Enriched(Vec<String>),
    PassThrough,
}

pub struct Pipeline {
    aggregator: RecordAggregator,
    config: PipelineConfig,
    cancel: CancellationToken,
    event_tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl Pipeline {
    pub fn new(aggregator: RecordAggregator, config: PipelineConfig) -> Self {
        Self {
            aggregator,
            config,
            cancel: CancellationToken::new(),
            event_tx: None,
        }
    }

    /// Stop enriching when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Report per-row progress on a channel
    pub fn with_events(mut self, event_tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Enrich a table
    ///
    /// # Returns
    /// The output table (input columns first, then any added field and
    /// metadata columns) and the run's quality report.
    ///
    /// # Errors
    /// `MissingColumn` if the input has no species column. Source failures
    /// never surface here.
    pub async fn process(&self, input: PlantTable) -> EnrichResult<(PlantTable, QualityReport)> {
        let mut output = PlantTable::new(input.headers().to_vec());
        let columns = Columns::prepare(&mut output)?;
        let total = input.len();
        let mut stats = RunStatistics::default();

        info!(
            rows = total,
            adapters = self.aggregator.adapter_count(),
            on_invalid_species = %self.config.on_invalid_species,
            "Enrichment started"
        );

        for (index, input_row) in input.rows().iter().enumerate() {
            let row_number = index + 1;
            let mut row = input_row.clone();
            row.resize(output.headers().len(), String::new());

            let raw_species = row[columns.species].trim().to_string();
            if raw_species.is_empty() || raw_species.eq_ignore_ascii_case("nan") {
                debug!(row = row_number, "Empty species, row dropped");
                stats.dropped_empty += 1;
                continue;
            }

            if self.cancel.is_cancelled() {
                self.pass_through(&mut output, row, row_number, &mut stats).await;
                continue;
            }

            let species = normalize_species_name(&raw_species);
            if let Err(issue) = validate_species_name(&species) {
                stats.invalid_species += 1;
                warn!(row = row_number, species = %raw_species, %issue, "Invalid species name");
                self.emit_event(PipelineEvent::RowSkipped {
                    row: row_number,
                    species: raw_species,
                    reason: issue.to_string(),
                })
                .await;
                if self.config.on_invalid_species == InvalidSpeciesMode::Keep {
                    output.push_row(row);
                }
                continue;
            }

            let disposition = self
                .enrich_row(&output, &columns, row, &species, row_number, &mut stats)
                .await;
            match disposition {
                RowDisposition::Enriched(row) => output.push_row(row),
                RowDisposition::PassThrough => {
                    self.pass_through(&mut output, input_row.clone(), row_number, &mut stats)
                        .await
                }
            }
        }

        let report = QualityReport::build(&output, &stats);
        info!(
            rows_out = output.len(),
            enriched = stats.enriched_records(),
            invalid_species = stats.invalid_species,
            dropped = stats.dropped_empty,
            average_confidence = report.average_confidence,
            cancelled = stats.cancelled,
            "Enrichment finished"
        );

        Ok((output, report))
    }

    async fn enrich_row(
        &self,
        table: &PlantTable,
        columns: &Columns,
        mut row: Vec<String>,
        species: &str,
        row_number: usize,
        stats: &mut RunStatistics,
    ) -> RowDisposition {
        let base = load_record(species, &row, columns);

        for (field, issue) in validate_record(&base) {
            stats.flagged_values += 1;
            warn!(row = row_number, species, field = %field, %issue, "Suspicious value kept");
        }

        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => return RowDisposition::PassThrough,
            outcome = self.aggregator.aggregate_into(base) => outcome,
        };

        let mut record = outcome.record;
        heuristics::apply_fallbacks(&mut record, &columns.hints(table, &row));
        let confidence = self.aggregator.scorer().apply(&mut record);

        row[columns.species] = species.to_string();
        for &(field, column) in &columns.fields {
            if row[column].trim().is_empty() {
                if let Some(value) = record.get(field) {
                    row[column] = value.to_string();
                }
            }
        }
        row[columns.data_sources] = record.provenance_json();
        row[columns.confidence] = format!("{:.2}", confidence);
        row[columns.last_updated] = record.last_updated().to_rfc3339_opts(SecondsFormat::Secs, true);

        stats.confidences.push(confidence);
        for source in record.field_provenance().values() {
            *stats.source_counts.entry(*source).or_insert(0) += 1;
        }

        debug!(row = row_number, species, confidence, "Row enriched");
        self.emit_event(PipelineEvent::RowEnriched {
            row: row_number,
            species: species.to_string(),
            confidence,
        })
        .await;

        RowDisposition::Enriched(row)
    }

    async fn pass_through(
        &self,
        output: &mut PlantTable,
        row: Vec<String>,
        row_number: usize,
        stats: &mut RunStatistics,
    ) {
        if !stats.cancelled {
            warn!(row = row_number, "Cancellation requested, passing remaining rows through");
            self.emit_event(PipelineEvent::Cancelled { row: row_number }).await;
        }
        stats.cancelled = true;
        stats.passed_through += 1;
        output.push_row(row);
    }

    async fn emit_event(&self, event: PipelineEvent) {
        if let Some(tx) = &self.event_tx {
            if let Err(e) = tx.send(event).await {
                debug!("Pipeline event receiver dropped: {}", e);
            }
        }
    }
}

/// Base record from a row's existing cells
///
/// Provenance from a previous run's `DATA_SOURCES` cell is restored for
/// fields that still hold a value; everything else counts as manual.
fn load_record(species: &str, row: &[String], columns: &Columns) -> PlantRecord {
    let prior: BTreeMap<String, SourceId> =
        serde_json::from_str(row[columns.data_sources].trim()).unwrap_or_default();

    let mut record = PlantRecord::new(species);
    if let Some(source) = prior.get(RecordField::Species.key()) {
        record.confirm_species(*source);
    }
    for &(field, column) in &columns.fields {
        record.fill(field, &row[column], prior.get(field.key()).copied());
    }
    record
}
