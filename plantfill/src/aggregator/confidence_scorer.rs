//! Confidence Scorer
//!
//! Scores a record by which fields are populated and how reliable their
//! sources are.
//!
//! # Scoring Algorithm
//! For each populated field: `weight(field) * reliability(provenance)`, summed
//! and rounded to two decimals. The weights add up to 1.0, so a record with
//! every field supplied by fully reliable sources scores 1.0.
//!
//! - Enrichable fields without provenance (pre-existing manual values) score
//!   at the Manual reliability.
//! - The species field counts only once a source has confirmed the name.

use crate::models::{PlantRecord, RecordField, SourceCatalog, SourceId};
use std::cmp::Ordering;

/// Per-field weights (sum to 1.0)
pub const FIELD_WEIGHTS: [(RecordField, f64); 8] = [
    (RecordField::Species, 0.20),
    (RecordField::LiteralLatin, 0.10),
    (RecordField::CommonName, 0.15),
    (RecordField::LifeForm, 0.15),
    (RecordField::SpecificLocation, 0.10),
    (RecordField::GeneralLocation, 0.10),
    (RecordField::Hemisphere, 0.10),
    (RecordField::SourceType, 0.10),
];

/// Round to two decimals
///
/// Works on the exact binary value of `score` and breaks exact ties to even,
/// so 0.045 (stored just below 0.045) gives 0.04 and 0.625 gives 0.62.
pub fn round_score(score: f64) -> f64 {
    if !score.is_finite() || score <= 0.0 {
        return 0.0;
    }
    let scaled = score * 100.0;
    if scaled >= (1u64 << 52) as f64 {
        return score;
    }

    // `scaled` may be off by one ulp; comparing the exact value against the
    // midpoint above `lower` still picks the nearest hundredth.
    let lower = scaled.floor() as u64;
    let hundredths = match compare_to_midpoint(score, lower) {
        Ordering::Less => lower,
        Ordering::Greater => lower + 1,
        Ordering::Equal if lower % 2 == 0 => lower,
        Ordering::Equal => lower + 1,
    };
    hundredths as f64 / 100.0
}

/// Exact comparison of positive `value` against `(lower + 0.5) / 100`
fn compare_to_midpoint(value: f64, lower: u64) -> Ordering {
    let bits = value.to_bits();
    let exponent_bits = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if exponent_bits == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), exponent_bits - 1075)
    };

    // value * 200 vs 2 * lower + 1, scaled by 2^-exponent
    let midpoint = 2 * lower as u128 + 1;
    if exponent >= 0 {
        return (mantissa as u128 * 200).cmp(&(midpoint << exponent));
    }
    let shift = (-exponent) as u32;
    if shift >= 120 {
        return Ordering::Less;
    }
    (mantissa as u128 * 200).cmp(&(midpoint << shift))
}

#[derive(Debug, Clone, Default)]
pub struct ConfidenceScorer {
    catalog: SourceCatalog,
}

impl ConfidenceScorer {
    pub fn new(catalog: SourceCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    /// Confidence in [0.0, 1.0], rounded to two decimals
    pub fn score(&self, record: &PlantRecord) -> f64 {
        let total: f64 = FIELD_WEIGHTS
            .iter()
            .filter_map(|&(field, weight)| self.field_reliability(record, field).map(|r| weight * r))
            .sum();
        round_score(total.clamp(0.0, 1.0))
    }

    /// Score a record and store the result on it
    pub fn apply(&self, record: &mut PlantRecord) -> f64 {
        let score = self.score(record);
        record.set_confidence(score);
        score
    }

    fn field_reliability(&self, record: &PlantRecord, field: RecordField) -> Option<f64> {
        match (field, record.provenance(field)) {
            (_, Some(source)) => Some(self.catalog.reliability(source)),
            (RecordField::Species, None) => None,
            (_, None) if record.is_filled(field) => Some(self.catalog.reliability(SourceId::Manual)),
            _ => None,
        }
    }
}
