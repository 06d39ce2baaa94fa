//! Row heuristics
//!
//! Derives field values from auxiliary input columns (`GROWTH FORM`,
//! `LIFE-FORM TYPE`, `GEOGRAPHIC ORIGIN`, `HORTICULTURAL DEVELOPMENT`,
//! `GROWTH HABIT`) when no source supplied them. Runs after aggregation and
//! only fills empty fields; every value it writes is tagged Manual.

use crate::models::{PlantRecord, RecordField, SourceId};

pub const GROWTH_FORM_COLUMN: &str = "GROWTH FORM";
pub const LIFE_FORM_TYPE_COLUMN: &str = "LIFE-FORM TYPE";
pub const GEOGRAPHIC_ORIGIN_COLUMN: &str = "GEOGRAPHIC ORIGIN";
pub const HORTICULTURAL_COLUMN: &str = "HORTICULTURAL DEVELOPMENT";
pub const GROWTH_HABIT_COLUMN: &str = "GROWTH HABIT";

/// Origin phrase -> (specific location, general location)
///
/// Checked in order; longer phrases precede the ones they contain.
const ORIGIN_LOCATIONS: [(&str, &str, &str); 17] = [
    ("spain", "Spain", "Europe"),
    ("japan", "Japan", "East Asia"),
    ("china", "China", "East Asia"),
    ("australia", "Australia", "Oceania"),
    ("mediterranean", "", "Mediterranean"),
    ("eastern north america", "Eastern United States", "North America"),
    ("western north america", "Western United States", "North America"),
    ("north america", "", "North America"),
    ("south america", "", "South America"),
    ("central america", "", "Central America"),
    ("europe", "", "Europe"),
    ("africa", "", "Africa"),
    ("southeast asia", "", "Southeast Asia"),
    ("central asia", "", "Central Asia"),
    ("asia", "", "Asia"),
    ("indian subcontinent", "India", "South Asia"),
    ("canary islands", "Canary Islands", "Macaronesia"),
];

const NORTHERN_HINTS: [&str; 6] = ["europe", "north america", "asia", "mediterranean", "japan", "china"];
const SOUTHERN_HINTS: [&str; 4] = ["australia", "south america", "africa", "new zealand"];

/// Auxiliary cell values for one row
///
/// Text hints are empty when the column is absent. The two source-type
/// hints are `None` when the table has no such column, so a present but
/// blank cell still counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowHints<'a> {
    pub growth_form: &'a str,
    pub life_form_type: &'a str,
    pub geographic_origin: &'a str,
    pub horticultural_development: Option<&'a str>,
    pub growth_habit: Option<&'a str>,
}

/// Placeholder cells that mean "no value"
fn is_blank(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("na") || value.eq_ignore_ascii_case("nan")
}

/// Collapse free-text growth forms onto tree / shrub / herb / vine
pub fn clean_growth_form(value: &str) -> Option<&'static str> {
    if is_blank(value) {
        return None;
    }
    let value = value.to_lowercase();
    ["tree", "shrub", "herb", "vine"]
        .into_iter()
        .find(|form| value.contains(form))
}

/// Raunkiær life form from the growth form and any explicit life-form type
pub fn infer_life_form(species: &str, hints: &RowHints<'_>) -> Option<&'static str> {
    let life_form_type = hints.life_form_type.to_lowercase();
    for (needle, life_form) in [
        ("hydrophyte", "hydrophyte"),
        ("halophyte", "hemicryptophyte"),
        ("geophyte", "geophyte"),
        ("epiphyte", "epiphyte"),
        ("chamaephyte", "chamaephyte"),
    ] {
        if life_form_type.contains(needle) {
            return Some(life_form);
        }
    }

    let species = species.to_lowercase();
    match clean_growth_form(hints.growth_form)? {
        "tree" | "shrub" | "vine" => Some("phanerophyte"),
        "herb" if ["annual", "annua"].iter().any(|t| species.contains(t)) => Some("therophyte"),
        "herb" if ["bulb", "corm", "tuber"].iter().any(|t| species.contains(t)) => Some("geophyte"),
        "herb" => Some("hemicryptophyte"),
        _ => None,
    }
}

/// Split a free-text origin into (specific, general, hemisphere)
///
/// Any part may be empty.
pub fn split_geographic_origin(origin: &str) -> (&'static str, &'static str, &'static str) {
    if is_blank(origin) {
        return ("", "", "");
    }
    let origin = origin.to_lowercase();

    let hemisphere = if origin.contains("northern") || NORTHERN_HINTS.iter().any(|h| origin.contains(h)) {
        "northern"
    } else if origin.contains("southern") || SOUTHERN_HINTS.iter().any(|h| origin.contains(h)) {
        "southern"
    } else if origin.contains("worldwide") || origin.contains("tropical") {
        "both"
    } else {
        ""
    };

    let (specific, general) = ORIGIN_LOCATIONS
        .iter()
        .find(|(needle, _, _)| origin.contains(needle))
        .map(|&(_, specific, general)| (specific, general))
        .unwrap_or(if origin.contains("worldwide") { ("", "Worldwide") } else { ("", "") });

    (specific, general, hemisphere)
}

/// natural / bred from horticultural hints
///
/// "high" development or a "cultivated" habit means bred; anything else,
/// blank cells included, is natural. `None` only when the table carries
/// neither hint column.
pub fn infer_source_type(hints: &RowHints<'_>) -> Option<&'static str> {
    if hints.horticultural_development.is_none() && hints.growth_habit.is_none() {
        return None;
    }
    let says = |cell: Option<&str>, word: &str| cell.is_some_and(|v| v.trim().eq_ignore_ascii_case(word));
    let bred = says(hints.horticultural_development, "high") || says(hints.growth_habit, "cultivated");
    Some(if bred { "bred" } else { "natural" })
}

/// Fill empty fields from row hints
///
/// # Returns
/// Number of fields written.
pub fn apply_fallbacks(record: &mut PlantRecord, hints: &RowHints<'_>) -> usize {
    let mut candidates: Vec<(RecordField, &str)> = Vec::new();

    if let Some(life_form) = infer_life_form(record.species(), hints) {
        candidates.push((RecordField::LifeForm, life_form));
    }

    let (specific, general, hemisphere) = split_geographic_origin(hints.geographic_origin);
    candidates.push((RecordField::SpecificLocation, specific));
    candidates.push((RecordField::GeneralLocation, general));
    candidates.push((RecordField::Hemisphere, hemisphere));

    if let Some(source_type) = infer_source_type(hints) {
        candidates.push((RecordField::SourceType, source_type));
    }

    candidates
        .into_iter()
        .filter(|(field, value)| record.fill(*field, value, Some(SourceId::Manual)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_growth_form() {
        assert_eq!(clean_growth_form("Tree"), Some("tree"));
        assert_eq!(clean_growth_form("small shrub"), Some("shrub"));
        assert_eq!(clean_growth_form("NA"), None);
        assert_eq!(clean_growth_form("succulent"), None);
    }

    #[test]
    fn test_life_form_type_takes_precedence() {
        let hints = RowHints {
            growth_form: "tree",
            life_form_type: "Geophyte (bulb)",
            ..RowHints::default()
        };
        assert_eq!(infer_life_form("Tulipa gesneriana", &hints), Some("geophyte"));
    }

    #[test]
    fn test_life_form_from_growth_form() {
        let tree = RowHints {
            growth_form: "tree",
            ..RowHints::default()
        };
        let herb = RowHints {
            growth_form: "herb",
            ..RowHints::default()
        };
        assert_eq!(infer_life_form("Quercus robur", &tree), Some("phanerophyte"));
        assert_eq!(infer_life_form("Artemisia annua", &herb), Some("therophyte"));
        assert_eq!(infer_life_form("Achillea millefolium", &herb), Some("hemicryptophyte"));
        assert_eq!(infer_life_form("Achillea millefolium", &RowHints::default()), None);
    }

    #[test]
    fn test_split_geographic_origin() {
        assert_eq!(split_geographic_origin("Southern Spain"), ("Spain", "Europe", "southern"));
        assert_eq!(
            split_geographic_origin("Eastern North America"),
            ("Eastern United States", "North America", "northern")
        );
        assert_eq!(split_geographic_origin("Southeast Asia"), ("", "Southeast Asia", "northern"));
        assert_eq!(split_geographic_origin("New Zealand"), ("", "", "southern"));
        assert_eq!(split_geographic_origin("Worldwide"), ("", "Worldwide", "both"));
        assert_eq!(split_geographic_origin("NA"), ("", "", ""));
    }

    #[test]
    fn test_infer_source_type() {
        let high = RowHints {
            horticultural_development: Some("High"),
            ..RowHints::default()
        };
        let cultivated = RowHints {
            horticultural_development: Some("low"),
            growth_habit: Some(" Cultivated "),
            ..RowHints::default()
        };
        let wild = RowHints {
            growth_habit: Some("wild"),
            ..RowHints::default()
        };
        assert_eq!(infer_source_type(&high), Some("bred"));
        assert_eq!(infer_source_type(&cultivated), Some("bred"));
        assert_eq!(infer_source_type(&wild), Some("natural"));
        // No hint columns at all
        assert_eq!(infer_source_type(&RowHints::default()), None);
    }

    #[test]
    fn test_blank_source_hints_mean_natural() {
        for cell in ["", "  ", "nan", "NA"] {
            let blank = RowHints {
                horticultural_development: Some(cell),
                ..RowHints::default()
            };
            assert_eq!(infer_source_type(&blank), Some("natural"), "{cell:?}");
        }
        let both_blank = RowHints {
            horticultural_development: Some(""),
            growth_habit: Some(""),
            ..RowHints::default()
        };
        assert_eq!(infer_source_type(&both_blank), Some("natural"));
    }

    #[test]
    fn test_apply_fallbacks_fills_only_empty_fields() {
        let mut record = PlantRecord::new("Quercus robur");
        record.fill(RecordField::GeneralLocation, "Western Europe", Some(SourceId::Gbif));

        let hints = RowHints {
            growth_form: "tree",
            geographic_origin: "Europe",
            ..RowHints::default()
        };
        let filled = apply_fallbacks(&mut record, &hints);

        assert_eq!(filled, 2);
        assert_eq!(record.get(RecordField::LifeForm), Some("phanerophyte"));
        assert_eq!(record.provenance(RecordField::LifeForm), Some(SourceId::Manual));
        assert_eq!(record.get(RecordField::Hemisphere), Some("northern"));
        assert_eq!(record.get(RecordField::GeneralLocation), Some("Western Europe"));
        assert_eq!(record.provenance(RecordField::GeneralLocation), Some(SourceId::Gbif));
        assert!(!record.is_filled(RecordField::SourceType));
    }

    #[test]
    fn test_apply_fallbacks_blank_habit_fills_natural() {
        let mut record = PlantRecord::new("Quercus robur");
        let hints = RowHints {
            growth_habit: Some(""),
            ..RowHints::default()
        };

        assert_eq!(apply_fallbacks(&mut record, &hints), 1);
        assert_eq!(record.get(RecordField::SourceType), Some("natural"));
        assert_eq!(record.provenance(RecordField::SourceType), Some(SourceId::Manual));
    }
}
