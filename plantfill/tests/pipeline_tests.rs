//! End-to-end enrichment runs over CSV files
//!
//! Offline runs only: the built-in reference table plus row heuristics.
//! Remote sources are covered in adapter_http_tests.rs.

mod helpers;

use helpers::LogCapture;
use plantfill::workflow::{PlantTable, QualityReport};
use plantfill::{enrich_file, RunOptions};
use plantfill_common::{EnrichConfig, InvalidSpeciesMode};
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn write_input(dir: &Path, csv: &str) -> RunOptions {
    let input = dir.join("plants.csv");
    std::fs::write(&input, csv).unwrap();
    RunOptions {
        input,
        output: dir.join("out").join("plants_enriched.csv"),
        report: dir.join("out").join("data_quality_report.json"),
        offline: true,
    }
}

fn offline_config(dir: &Path) -> EnrichConfig {
    EnrichConfig {
        cache_dir: dir.join("cache"),
        ..EnrichConfig::default()
    }
}

fn column(table: &PlantTable, name: &str) -> Vec<String> {
    let index = table
        .column_index(name)
        .unwrap_or_else(|| panic!("missing column {name}"));
    table.rows().iter().map(|row| row[index].clone()).collect()
}

#[tokio::test]
async fn test_offline_run_fills_from_builtin_table() {
    let dir = TempDir::new().unwrap();
    let options = write_input(dir.path(), "SPECIES,COMMON NAME\nabies pinsapo,\n");

    let report = enrich_file(&offline_config(dir.path()), &options, CancellationToken::new())
        .await
        .unwrap();

    let output = PlantTable::read_csv(&options.output).unwrap();
    assert_eq!(column(&output, "SPECIES"), vec!["Abies pinsapo"]);
    assert_eq!(column(&output, "COMMON NAME"), vec!["Spanish fir"]);
    assert_eq!(column(&output, "GENERAL LOCATION"), vec!["Europe"]);
    assert_eq!(column(&output, "HEMISPHERE"), vec!["northern"]);
    assert_eq!(column(&output, "CONFIDENCE_SCORE"), vec!["0.24"]);
    assert!(column(&output, "DATA_SOURCES")[0].contains(r#""common_name":"Manual""#));
    assert!(column(&output, "LAST_UPDATED")[0].ends_with('Z'));

    assert_eq!(report.total_records, 1);
    assert_eq!(report.enriched_records, 1);
    assert_eq!(report.average_confidence, 0.24);
    assert_eq!(report.data_source_distribution["Manual"], 7);
    assert!(!report.cancelled);
}

#[tokio::test]
async fn test_report_written_as_json() {
    let dir = TempDir::new().unwrap();
    let options = write_input(dir.path(), "SPECIES\nAbies pinsapo\nQuercus robur\n");

    let report = enrich_file(&offline_config(dir.path()), &options, CancellationToken::new())
        .await
        .unwrap();

    let written: QualityReport =
        serde_json::from_str(&std::fs::read_to_string(&options.report).unwrap()).unwrap();
    assert_eq!(written, report);
    assert_eq!(written.fields_completeness["SPECIES"], "100.0%");
    assert_eq!(written.fields_completeness["COMMON NAME"], "50.0%");
    assert!(!written.fields_completeness.contains_key("DATA_SOURCES"));
    assert!(!written.fields_completeness.contains_key("CONFIDENCE_SCORE"));
}

#[tokio::test]
async fn test_empty_and_nan_species_are_dropped() {
    let dir = TempDir::new().unwrap();
    let options = write_input(dir.path(), "SPECIES,NOTES\n,blank\nNaN,missing\nAbies pinsapo,kept\n");

    let report = enrich_file(&offline_config(dir.path()), &options, CancellationToken::new())
        .await
        .unwrap();

    let output = PlantTable::read_csv(&options.output).unwrap();
    assert_eq!(column(&output, "NOTES"), vec!["kept"]);
    assert_eq!(report.total_records, 1);
}

#[tokio::test]
async fn test_existing_values_are_never_overwritten() {
    let dir = TempDir::new().unwrap();
    let options = write_input(
        dir.path(),
        "SPECIES,COMMON NAME,LIFE FORM\nAbies pinsapo,Hedgehog fir,\n",
    );

    enrich_file(&offline_config(dir.path()), &options, CancellationToken::new())
        .await
        .unwrap();

    let output = PlantTable::read_csv(&options.output).unwrap();
    assert_eq!(column(&output, "COMMON NAME"), vec!["Hedgehog fir"]);
    assert_eq!(column(&output, "LIFE FORM"), vec!["phanerophyte"]);
    assert!(!column(&output, "DATA_SOURCES")[0].contains("common_name"));
}

#[tokio::test]
async fn test_invalid_species_keep_and_skip() {
    let csv = "SPECIES,NOTES\nAbies pinsapo,good\nQuercus,bad\n";

    let dir = TempDir::new().unwrap();
    let options = write_input(dir.path(), csv);
    let keep = EnrichConfig {
        on_invalid_species: InvalidSpeciesMode::Keep,
        ..offline_config(dir.path())
    };
    let report = enrich_file(&keep, &options, CancellationToken::new()).await.unwrap();
    let output = PlantTable::read_csv(&options.output).unwrap();
    assert_eq!(column(&output, "NOTES"), vec!["good", "bad"]);
    assert_eq!(column(&output, "SPECIES")[1], "Quercus");
    assert_eq!(column(&output, "CONFIDENCE_SCORE")[1], "");
    assert_eq!(report.invalid_species, 1);

    let dir = TempDir::new().unwrap();
    let options = write_input(dir.path(), csv);
    let skip = EnrichConfig {
        on_invalid_species: InvalidSpeciesMode::Skip,
        ..offline_config(dir.path())
    };
    let report = enrich_file(&skip, &options, CancellationToken::new()).await.unwrap();
    let output = PlantTable::read_csv(&options.output).unwrap();
    assert_eq!(column(&output, "NOTES"), vec!["good"]);
    assert_eq!(report.invalid_species, 1);
}

#[tokio::test]
async fn test_heuristics_fill_what_sources_miss() {
    let dir = TempDir::new().unwrap();
    let options = write_input(
        dir.path(),
        "SPECIES,GROWTH FORM,GEOGRAPHIC ORIGIN\nQuercus robur,tree,Europe\n",
    );

    enrich_file(&offline_config(dir.path()), &options, CancellationToken::new())
        .await
        .unwrap();

    let output = PlantTable::read_csv(&options.output).unwrap();
    assert_eq!(column(&output, "GENERAL LOCATION"), vec!["Europe"]);
    assert_eq!(column(&output, "HEMISPHERE"), vec!["northern"]);
    assert_eq!(column(&output, "LIFE FORM"), vec!["phanerophyte"]);
}

#[tokio::test]
async fn test_rerun_is_stable() {
    let dir = TempDir::new().unwrap();
    let first = write_input(dir.path(), "SPECIES\nAbies pinsapo\n");
    let config = offline_config(dir.path());
    enrich_file(&config, &first, CancellationToken::new()).await.unwrap();

    let second = RunOptions {
        input: first.output.clone(),
        output: dir.path().join("second.csv"),
        report: dir.path().join("second.json"),
        offline: true,
    };
    enrich_file(&config, &second, CancellationToken::new()).await.unwrap();

    let once = PlantTable::read_csv(&first.output).unwrap();
    let twice = PlantTable::read_csv(&second.output).unwrap();
    assert_eq!(once.headers(), twice.headers());
    assert_eq!(column(&once, "DATA_SOURCES"), column(&twice, "DATA_SOURCES"));
    assert_eq!(column(&once, "CONFIDENCE_SCORE"), column(&twice, "CONFIDENCE_SCORE"));
    assert_eq!(column(&once, "COMMON NAME"), column(&twice, "COMMON NAME"));
}

#[tokio::test]
async fn test_cancelled_run_passes_rows_through() {
    let dir = TempDir::new().unwrap();
    let options = write_input(dir.path(), "SPECIES,COMMON NAME\nAbies pinsapo,\nQuercus robur,\n");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = enrich_file(&offline_config(dir.path()), &options, cancel).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.enriched_records, 0);
    let output = PlantTable::read_csv(&options.output).unwrap();
    assert_eq!(column(&output, "SPECIES"), vec!["Abies pinsapo", "Quercus robur"]);
    assert_eq!(column(&output, "COMMON NAME"), vec!["", ""]);
}

#[tokio::test]
async fn test_missing_species_column_fails() {
    let dir = TempDir::new().unwrap();
    let options = write_input(dir.path(), "NAME,NOTES\nAbies pinsapo,x\n");

    let err = enrich_file(&offline_config(dir.path()), &options, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("SPECIES"), "{err}");
    assert!(!options.output.exists());
}

#[tokio::test]
async fn test_missing_input_file_fails() {
    let dir = TempDir::new().unwrap();
    let options = RunOptions {
        input: dir.path().join("absent.csv"),
        output: dir.path().join("out.csv"),
        report: dir.path().join("report.json"),
        offline: true,
    };

    assert!(enrich_file(&offline_config(dir.path()), &options, CancellationToken::new())
        .await
        .is_err());
}

#[test]
fn test_invalid_species_is_logged() {
    let dir = TempDir::new().unwrap();
    let options = write_input(dir.path(), "SPECIES\nQuercus\n");
    let config = offline_config(dir.path());
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let capture = LogCapture::new();
    capture.capture(|| {
        runtime
            .block_on(enrich_file(&config, &options, CancellationToken::new()))
            .unwrap()
    });

    assert!(capture.contains_at(tracing::Level::WARN, "Invalid species name"));
}
