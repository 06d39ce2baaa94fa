//! Source descriptor catalog
//!
//! Every value written by enrichment is tagged with the [`SourceId`] that
//! supplied it. The reliability weights here only feed confidence scoring;
//! merge precedence is decided by adapter order, not by these numbers.

use plantfill_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Known data sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceId {
    /// Global Biodiversity Information Facility
    #[serde(rename = "GBIF")]
    Gbif,
    /// Missouri Botanical Garden
    #[serde(rename = "Tropicos")]
    Tropicos,
    /// International Plant Names Index
    #[serde(rename = "IPNI")]
    Ipni,
    /// Plants of the World Online (Kew)
    #[serde(rename = "POWO")]
    Powo,
    /// Encyclopedia of Life
    #[serde(rename = "EOL")]
    Eol,
    /// Manual entry, reference tables and row heuristics
    #[serde(rename = "Manual")]
    Manual,
}

impl SourceId {
    /// All sources in catalog order
    pub const ALL: [SourceId; 6] = [
        SourceId::Gbif,
        SourceId::Tropicos,
        SourceId::Ipni,
        SourceId::Powo,
        SourceId::Eol,
        SourceId::Manual,
    ];

    /// Human-readable name, also used in `DATA_SOURCES` output
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Gbif => "GBIF",
            Self::Tropicos => "Tropicos",
            Self::Ipni => "IPNI",
            Self::Powo => "POWO",
            Self::Eol => "EOL",
            Self::Manual => "Manual",
        }
    }

    /// Stable lowercase identifier used for cache keys, directories and config lookups
    pub fn key(self) -> &'static str {
        match self {
            Self::Gbif => "gbif",
            Self::Tropicos => "tropicos",
            Self::Ipni => "ipni",
            Self::Powo => "powo",
            Self::Eol => "eol",
            Self::Manual => "manual",
        }
    }

    /// Fixed reliability weight (0.0-1.0]
    pub fn default_reliability(self) -> f64 {
        match self {
            Self::Gbif => 0.90,
            Self::Tropicos => 0.85,
            Self::Ipni => 0.90,
            Self::Powo => 0.95,
            Self::Eol => 0.80,
            Self::Manual => 0.30,
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Static catalog entry for one source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceDescriptor {
    pub id: SourceId,
    pub name: &'static str,
    pub reliability: f64,
}

/// Immutable set of source descriptors handed to the aggregator
#[derive(Debug, Clone, PartialEq)]
pub struct SourceCatalog {
    descriptors: Vec<SourceDescriptor>,
}

impl SourceCatalog {
    /// Catalog with the fixed production reliability weights
    pub fn standard() -> Self {
        Self {
            descriptors: SourceId::ALL
                .iter()
                .map(|&id| SourceDescriptor {
                    id,
                    name: id.display_name(),
                    reliability: id.default_reliability(),
                })
                .collect(),
        }
    }

    /// Build a catalog from explicit descriptors
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` if a reliability lies outside (0, 1]
    /// or a source is listed twice.
    pub fn new(descriptors: Vec<SourceDescriptor>) -> Result<Self> {
        for (i, d) in descriptors.iter().enumerate() {
            if !(d.reliability > 0.0 && d.reliability <= 1.0) {
                return Err(Error::InvalidInput(format!(
                    "Reliability for {} must be in (0, 1], got {}",
                    d.name, d.reliability
                )));
            }
            if descriptors[..i].iter().any(|other| other.id == d.id) {
                return Err(Error::InvalidInput(format!(
                    "Source {} listed twice in catalog",
                    d.name
                )));
            }
        }
        Ok(Self { descriptors })
    }

    /// Descriptor for a source, if cataloged
    pub fn descriptor(&self, id: SourceId) -> Option<&SourceDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    /// Reliability of a source; uncataloged sources score as Manual
    pub fn reliability(&self, id: SourceId) -> f64 {
        self.descriptor(id)
            .or_else(|| self.descriptor(SourceId::Manual))
            .map(|d| d.reliability)
            .unwrap_or_else(|| SourceId::Manual.default_reliability())
    }

    pub fn descriptors(&self) -> &[SourceDescriptor] {
        &self.descriptors
    }
}

impl Default for SourceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
