//! Data models for plantfill
//!
//! - `plant_record`: per-species record and field provenance
//! - `source`: source descriptor catalog (reliability weights)

pub mod plant_record;
pub mod source;

pub use plant_record::{PlantRecord, RecordField};
pub use source::{SourceCatalog, SourceDescriptor, SourceId};
