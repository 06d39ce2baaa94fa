//! plantfill - botanical table enrichment
//!
//! Fills empty cells of a plant CSV from GBIF, Tropicos and curated
//! reference tables, records per-field provenance and a confidence score,
//! and writes a data quality report next to the output.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plantfill::models::PlantRecord;
use plantfill::validators::{normalize_species_name, validate_record, validate_species_name};
use plantfill::workflow::{PlantTable, DEFAULT_REPORT_FILE};
use plantfill::RunOptions;
use plantfill_common::config::resolve_config_path;
use plantfill_common::{EnrichConfig, InvalidSpeciesMode, LoggingConfig};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for plantfill
#[derive(Parser, Debug)]
#[command(name = "plantfill")]
#[command(about = "Enrich botanical plant tables from taxonomic sources")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, global = true, env = "PLANTFILL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enrich a plant table
    Enrich {
        /// Input CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,

        /// Quality report path [default: data_quality_report.json next to the output]
        #[arg(long)]
        report: Option<PathBuf>,

        /// Override on_invalid_species (keep | skip)
        #[arg(long)]
        on_invalid_species: Option<InvalidSpeciesMode>,

        /// Use reference tables only, no network
        #[arg(long)]
        offline: bool,
    },

    /// Check a plant table without enriching it
    Validate {
        /// Input CSV
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let first_run = !config_path.exists();
    let mut config = EnrichConfig::load_or_create(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    init_tracing(&config.logging)?;
    info!("plantfill {}", env!("CARGO_PKG_VERSION"));
    if first_run {
        info!("Created default config: {}", config_path.display());
    } else {
        info!("Config: {}", config_path.display());
    }

    match args.command {
        Command::Enrich {
            input,
            output,
            report,
            on_invalid_species,
            offline,
        } => {
            if let Some(mode) = on_invalid_species {
                config.on_invalid_species = mode;
            }
            let report = report.unwrap_or_else(|| default_report_path(&output));
            let options = RunOptions {
                input,
                output,
                report,
                offline,
            };
            run_enrich(&config, options).await
        }
        Command::Validate { input } => run_validate(&input),
    }
}

async fn run_enrich(config: &EnrichConfig, options: RunOptions) -> Result<ExitCode> {
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let span = info_span!("enrich", input = %options.input.display());
    let report = plantfill::enrich_file(config, &options, cancel)
        .instrument(span)
        .await
        .context("Enrichment failed")?;

    info!(
        "Processed {} records, average confidence {:.2}, report at {}",
        report.total_records,
        report.average_confidence,
        options.report.display()
    );

    Ok(if report.cancelled {
        ExitCode::from(130)
    } else {
        ExitCode::SUCCESS
    })
}

/// Print every species and vocabulary issue; non-zero exit if any
fn run_validate(input: &Path) -> Result<ExitCode> {
    let table = PlantTable::read_csv(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let species_column = table.species_column()?;
    let field_columns: Vec<_> = plantfill::models::RecordField::ENRICHABLE
        .iter()
        .map(|&field| (field, table.column_index(field.column())))
        .collect();

    let mut issues = 0usize;
    for (index, row) in table.rows().iter().enumerate() {
        let raw = row[species_column].trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
            continue;
        }
        let species = normalize_species_name(raw);
        if let Err(issue) = validate_species_name(&species) {
            println!("row {}: SPECIES: {}", index + 1, issue);
            issues += 1;
            continue;
        }

        let mut record = PlantRecord::new(species);
        for &(field, column) in &field_columns {
            record.fill(field, table.cell(row, column), None);
        }
        for (field, issue) in validate_record(&record) {
            println!("row {}: {}: {}", index + 1, field.column(), issue);
            issues += 1;
        }
    }

    if issues == 0 {
        println!("{}: no issues in {} rows", input.display(), table.len());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{}: {} issue(s)", input.display(), issues);
        Ok(ExitCode::FAILURE)
    }
}

fn default_report_path(output: &Path) -> PathBuf {
    output
        .parent()
        .map(|dir| dir.join(DEFAULT_REPORT_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_FILE))
}

/// Console layer always; plain-text file layer when configured
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let file_layer = logging
        .open_file()
        .context("Failed to set up file logging")?
        .map(|file| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
        });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            warn!("Received Ctrl+C, finishing current row and writing partial results");
            cancel.cancel();
        }
        Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
    }
}
