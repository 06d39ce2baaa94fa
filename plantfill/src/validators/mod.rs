//! Validation Layer
//!
//! Checks species names and controlled-vocabulary fields. The pipeline uses
//! these to skip malformed rows before enrichment and to flag suspicious
//! pre-existing values; it never rewrites data because of them.

pub mod field_rules;

pub use field_rules::{
    normalize_species_name, validate_hemisphere, validate_life_form, validate_source_type,
    validate_species_name, ValidationIssue,
};

use crate::models::{PlantRecord, RecordField};

/// Run every field check against a record
///
/// # Returns
/// One entry per failing field, in field order. Empty when all checks pass.
pub fn validate_record(record: &PlantRecord) -> Vec<(RecordField, ValidationIssue)> {
    RecordField::ALL
        .iter()
        .filter_map(|&field| {
            let value = record.get(field).unwrap_or("");
            let result = match field {
                RecordField::Species => validate_species_name(value),
                RecordField::LifeForm => validate_life_form(value),
                RecordField::Hemisphere => validate_hemisphere(value),
                RecordField::SourceType => validate_source_type(value),
                _ => Ok(()),
            };
            result.err().map(|issue| (field, issue))
        })
        .collect()
}
