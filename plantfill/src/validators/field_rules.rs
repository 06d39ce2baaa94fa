//! Closed-vocabulary field checks
//!
//! Pure functions, no side effects. Each returns `Ok(())` or the reason the
//! value was rejected. Empty values are valid for every field except the
//! species name: an empty field makes no claim.

use thiserror::Error;

/// Raunkiær life-form classes plus the usual extensions
pub const VALID_LIFE_FORMS: [&str; 11] = [
    "phanerophyte",
    "chamaephyte",
    "hemicryptophyte",
    "cryptophyte",
    "therophyte",
    "geophyte",
    "hydrophyte",
    "helophyte",
    "epiphyte",
    "lithophyte",
    "aerophyte",
];

pub const VALID_HEMISPHERES: [&str; 3] = ["northern", "southern", "both"];

pub const VALID_SOURCE_TYPES: [&str; 4] = ["natural", "bred", "hybrid", "cultivar"];

/// Reason a value failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("Species name cannot be empty")]
    EmptySpecies,

    #[error("Invalid species name format: {0}. Must be binomial")]
    NotBinomial(String),

    #[error("Genus name must be capitalized: {0}")]
    GenusNotCapitalized(String),

    #[error("Species epithet must be lowercase: {0}")]
    EpithetNotLowercase(String),

    #[error("Invalid life form: {0}. Must be one of {}", VALID_LIFE_FORMS.join(", "))]
    LifeForm(String),

    #[error("Invalid hemisphere: {0}. Must be one of {}", VALID_HEMISPHERES.join(", "))]
    Hemisphere(String),

    #[error("Invalid source: {0}. Must be one of {}", VALID_SOURCE_TYPES.join(", "))]
    SourceType(String),
}

/// Check binomial casing: `Genus epithet [...]`
///
/// Encodes the naming convention only; any genus/epithet pair with the right
/// casing passes.
pub fn validate_species_name(species: &str) -> Result<(), ValidationIssue> {
    let parts: Vec<&str> = species.split_whitespace().collect();
    if parts.is_empty() {
        return Err(ValidationIssue::EmptySpecies);
    }
    if parts.len() < 2 {
        return Err(ValidationIssue::NotBinomial(species.to_string()));
    }

    if !parts[0].chars().next().is_some_and(char::is_uppercase) {
        return Err(ValidationIssue::GenusNotCapitalized(species.to_string()));
    }

    if !is_lowercase_word(parts[1]) {
        return Err(ValidationIssue::EpithetNotLowercase(species.to_string()));
    }

    Ok(())
}

pub fn validate_life_form(life_form: &str) -> Result<(), ValidationIssue> {
    check_vocabulary(life_form, &VALID_LIFE_FORMS, ValidationIssue::LifeForm)
}

pub fn validate_hemisphere(hemisphere: &str) -> Result<(), ValidationIssue> {
    check_vocabulary(hemisphere, &VALID_HEMISPHERES, ValidationIssue::Hemisphere)
}

pub fn validate_source_type(source_type: &str) -> Result<(), ValidationIssue> {
    check_vocabulary(source_type, &VALID_SOURCE_TYPES, ValidationIssue::SourceType)
}

/// Put a raw species cell into binomial casing
///
/// `"quercus ROBUR"` -> `"Quercus robur"`. Whitespace runs collapse to one space.
pub fn normalize_species_name(raw: &str) -> String {
    let mut tokens = raw.split_whitespace().map(str::to_lowercase);
    let Some(genus) = tokens.next() else {
        return String::new();
    };

    let mut chars = genus.chars();
    let mut normalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    for token in tokens {
        normalized.push(' ');
        normalized.push_str(&token);
    }
    normalized
}

fn check_vocabulary(
    value: &str,
    vocabulary: &[&str],
    issue: fn(String) -> ValidationIssue,
) -> Result<(), ValidationIssue> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    if vocabulary.iter().any(|term| term.eq_ignore_ascii_case(trimmed)) {
        Ok(())
    } else {
        Err(issue(value.to_string()))
    }
}

/// At least one cased character and no uppercase ones
fn is_lowercase_word(word: &str) -> bool {
    word.chars().any(char::is_lowercase) && !word.chars().any(char::is_uppercase)
}
