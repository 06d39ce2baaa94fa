//! Curated reference tables
//!
//! A reference table is a JSON array of objects keyed by `species` with any of
//! the enrichable field keys. Tables are data, not code: one ships inside the
//! binary and more can be listed in the config. Lookups are case-insensitive
//! on the species name. A species appearing twice, within one table or across
//! tables, is a load error rather than a silent override.
//!
//! The adapter contributes values under [`SourceId::Manual`] and runs after
//! the remote sources, so curated values fill what the APIs left empty.

use crate::models::{PlantRecord, RecordField, SourceId};
use crate::types::{FetchError, SourceAdapter};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

const BUILTIN_TABLE: &str = include_str!("../../data/reference_plants.json");
const BUILTIN_ORIGIN: &str = "<builtin>";

#[derive(Debug, Error)]
pub enum ReferenceTableError {
    #[error("Failed to read reference table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid reference table {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("Duplicate reference entry for '{species}' in {first} and {second}")]
    DuplicateSpecies {
        species: String,
        first: String,
        second: String,
    },
}

/// One curated row
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReferenceEntry {
    pub species: String,
    #[serde(default)]
    pub literal_latin: Option<String>,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub life_form: Option<String>,
    #[serde(default)]
    pub specific_location: Option<String>,
    #[serde(default)]
    pub general_location: Option<String>,
    #[serde(default)]
    pub hemisphere: Option<String>,
    #[serde(default, alias = "source")]
    pub source_type: Option<String>,
}

impl ReferenceEntry {
    fn value(&self, field: RecordField) -> Option<&str> {
        let value = match field {
            RecordField::Species => Some(&self.species),
            RecordField::LiteralLatin => self.literal_latin.as_ref(),
            RecordField::CommonName => self.common_name.as_ref(),
            RecordField::LifeForm => self.life_form.as_ref(),
            RecordField::SpecificLocation => self.specific_location.as_ref(),
            RecordField::GeneralLocation => self.general_location.as_ref(),
            RecordField::Hemisphere => self.hemisphere.as_ref(),
            RecordField::SourceType => self.source_type.as_ref(),
        };
        value.map(String::as_str)
    }
}

/// Lowercase, single-spaced lookup key
fn lookup_key(species: &str) -> String {
    species
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Species -> curated entry, merged from one or more tables
#[derive(Debug, Default)]
pub struct ReferenceTable {
    /// lookup key -> (entry, origin it was loaded from)
    entries: HashMap<String, (ReferenceEntry, String)>,
}

impl ReferenceTable {
    /// Table compiled into the binary
    pub fn builtin() -> Result<Self, ReferenceTableError> {
        Self::from_json_str(BUILTIN_TABLE, BUILTIN_ORIGIN)
    }

    pub fn from_json_str(json: &str, origin: &str) -> Result<Self, ReferenceTableError> {
        let rows: Vec<ReferenceEntry> = serde_json::from_str(json).map_err(|e| ReferenceTableError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;

        let mut table = Self::default();
        for entry in rows {
            table.insert(entry, origin)?;
        }
        Ok(table)
    }

    pub fn load_file(path: &Path) -> Result<Self, ReferenceTableError> {
        let json = std::fs::read_to_string(path).map_err(|source| ReferenceTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json, &path.display().to_string())
    }

    /// Builtin table (optional) plus every listed file, duplicates rejected
    pub fn load(use_builtin: bool, paths: &[PathBuf]) -> Result<Self, ReferenceTableError> {
        let mut table = if use_builtin {
            Self::builtin()?
        } else {
            Self::default()
        };
        for path in paths {
            table.merge(Self::load_file(path)?)?;
        }
        tracing::debug!(entries = table.len(), files = paths.len(), "Reference tables loaded");
        Ok(table)
    }

    /// Absorb another table
    ///
    /// # Errors
    /// `DuplicateSpecies` naming both origins if any species is already present.
    pub fn merge(&mut self, other: ReferenceTable) -> Result<(), ReferenceTableError> {
        for (_, (entry, origin)) in other.entries {
            self.insert(entry, &origin)?;
        }
        Ok(())
    }

    fn insert(&mut self, entry: ReferenceEntry, origin: &str) -> Result<(), ReferenceTableError> {
        let key = lookup_key(&entry.species);
        if key.is_empty() {
            return Err(ReferenceTableError::Parse {
                origin: origin.to_string(),
                message: "entry with empty species".to_string(),
            });
        }
        if let Some((existing, first)) = self.entries.get(&key) {
            return Err(ReferenceTableError::DuplicateSpecies {
                species: existing.species.clone(),
                first: first.clone(),
                second: origin.to_string(),
            });
        }
        self.entries.insert(key, (entry, origin.to_string()));
        Ok(())
    }

    pub fn lookup(&self, species: &str) -> Option<&ReferenceEntry> {
        self.entries.get(&lookup_key(species)).map(|(entry, _)| entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source adapter over a loaded [`ReferenceTable`]
pub struct ReferenceTableAdapter {
    table: Arc<ReferenceTable>,
}

impl ReferenceTableAdapter {
    pub fn new(table: Arc<ReferenceTable>) -> Self {
        Self { table }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for ReferenceTableAdapter {
    fn source(&self) -> SourceId {
        SourceId::Manual
    }

    fn name(&self) -> &'static str {
        "Reference table"
    }

    async fn fetch(&self, species: &str) -> Result<PlantRecord, FetchError> {
        let entry = self
            .table
            .lookup(species)
            .ok_or_else(|| FetchError::NotFound(format!("{} not in reference tables", species)))?;

        let mut record = PlantRecord::new(species);
        for field in RecordField::ENRICHABLE {
            if let Some(value) = entry.value(field) {
                record.fill(field, value, Some(SourceId::Manual));
            }
        }
        Ok(record)
    }
}
