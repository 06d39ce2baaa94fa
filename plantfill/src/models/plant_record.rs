//! Per-species record with field provenance
//!
//! A [`PlantRecord`] carries the enrichable attributes of one species. Every
//! write goes through [`PlantRecord::fill`], which keeps the provenance map in
//! step with the values: a provenance entry only ever exists for a populated
//! field, and only enrichment writes create one (manual values carry none).

use super::source::SourceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scored fields of a plant record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Species,
    LiteralLatin,
    CommonName,
    LifeForm,
    SpecificLocation,
    GeneralLocation,
    Hemisphere,
    SourceType,
}

impl RecordField {
    /// Every scored field, identity key first
    pub const ALL: [RecordField; 8] = [
        RecordField::Species,
        RecordField::LiteralLatin,
        RecordField::CommonName,
        RecordField::LifeForm,
        RecordField::SpecificLocation,
        RecordField::GeneralLocation,
        RecordField::Hemisphere,
        RecordField::SourceType,
    ];

    /// Fields enrichment may write (everything except the identity key)
    pub const ENRICHABLE: [RecordField; 7] = [
        RecordField::LiteralLatin,
        RecordField::CommonName,
        RecordField::LifeForm,
        RecordField::SpecificLocation,
        RecordField::GeneralLocation,
        RecordField::Hemisphere,
        RecordField::SourceType,
    ];

    /// snake_case key used in `DATA_SOURCES` and reference tables
    pub fn key(self) -> &'static str {
        match self {
            Self::Species => "species",
            Self::LiteralLatin => "literal_latin",
            Self::CommonName => "common_name",
            Self::LifeForm => "life_form",
            Self::SpecificLocation => "specific_location",
            Self::GeneralLocation => "general_location",
            Self::Hemisphere => "hemisphere",
            Self::SourceType => "source_type",
        }
    }

    /// Table column header
    pub fn column(self) -> &'static str {
        match self {
            Self::Species => "SPECIES",
            Self::LiteralLatin => "LITERAL LATIN",
            Self::CommonName => "COMMON NAME",
            Self::LifeForm => "LIFE FORM",
            Self::SpecificLocation => "SPECIFIC LOCATION",
            Self::GeneralLocation => "GENERAL LOCATION",
            Self::Hemisphere => "HEMISPHERE",
            Self::SourceType => "SOURCE",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One species' enrichable attributes
#[derive(Debug, Clone, PartialEq)]
pub struct PlantRecord {
    species: String,
    values: BTreeMap<RecordField, String>,
    field_provenance: BTreeMap<RecordField, SourceId>,
    confidence: f64,
    last_updated: DateTime<Utc>,
}

impl PlantRecord {
    /// Empty record for a species
    pub fn new(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            values: BTreeMap::new(),
            field_provenance: BTreeMap::new(),
            confidence: 0.0,
            last_updated: Utc::now(),
        }
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    /// Current value of a field (the species for `RecordField::Species`)
    pub fn get(&self, field: RecordField) -> Option<&str> {
        match field {
            RecordField::Species => Some(self.species.as_str()).filter(|s| !s.is_empty()),
            _ => self.values.get(&field).map(String::as_str),
        }
    }

    pub fn is_filled(&self, field: RecordField) -> bool {
        self.get(field).is_some()
    }

    /// Write a value into an empty field
    ///
    /// `source` is `None` for values that were already present in the input
    /// (manual data); enrichment always passes its source.
    ///
    /// # Returns
    /// `true` if the value was written. Blank values, filled fields and the
    /// immutable species key are left alone.
    pub fn fill(&mut self, field: RecordField, value: &str, source: Option<SourceId>) -> bool {
        let value = value.trim();
        if field == RecordField::Species || value.is_empty() || self.is_filled(field) {
            return false;
        }

        self.values.insert(field, value.to_string());
        if let Some(source) = source {
            self.field_provenance.insert(field, source);
        }
        self.last_updated = Utc::now();
        true
    }

    /// Record that a source confirmed the species name itself
    pub fn confirm_species(&mut self, source: SourceId) -> bool {
        if self.species.is_empty() || self.field_provenance.contains_key(&RecordField::Species) {
            return false;
        }
        self.field_provenance.insert(RecordField::Species, source);
        self.last_updated = Utc::now();
        true
    }

    pub fn provenance(&self, field: RecordField) -> Option<SourceId> {
        self.field_provenance.get(&field).copied()
    }

    pub fn field_provenance(&self) -> &BTreeMap<RecordField, SourceId> {
        &self.field_provenance
    }

    /// Confidence score (0.0-1.0), assigned by the confidence scorer
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub(crate) fn set_confidence(&mut self, confidence: f64) {
        self.confidence = confidence;
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Enrichable fields that are still empty
    pub fn missing_fields(&self) -> Vec<RecordField> {
        RecordField::ENRICHABLE
            .iter()
            .copied()
            .filter(|&f| !self.is_filled(f))
            .collect()
    }

    /// True when no enrichable field is empty
    pub fn is_complete(&self) -> bool {
        RecordField::ENRICHABLE.iter().all(|&f| self.is_filled(f))
    }

    /// Provenance as a JSON object of field key -> source display name
    pub fn provenance_json(&self) -> String {
        let map: BTreeMap<&str, &str> = self
            .field_provenance
            .iter()
            .map(|(field, source)| (field.key(), source.display_name()))
            .collect();
        serde_json::to_string(&map).unwrap_or_else(|_| "{}".to_string())
    }
}
