//! GBIF species API client
//!
//! Two calls per species: `/species/match` resolves the name to a usage key,
//! then `/species/{key}` returns the taxon detail. Only the detail payload is
//! cached, so a cache hit costs no network traffic at all.
//!
//! GBIF supplies the common name (`vernacularName`) and confirms the species
//! name when the match succeeds.

use super::cache::ResponseCache;
use super::http::{HttpSettings, HttpSource};
use crate::models::{PlantRecord, RecordField, SourceId};
use crate::types::{FetchError, SourceAdapter};
use serde::Deserialize;
use std::path::Path;

pub const GBIF_API_URL: &str = "https://api.gbif.org/v1";

/// Response of `/species/match`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbifMatch {
    match_type: Option<String>,
    usage_key: Option<u64>,
}

/// Response of `/species/{key}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbifSpecies {
    vernacular_name: Option<String>,
}

pub struct GbifClient {
    http: HttpSource,
    cache: ResponseCache,
}

impl GbifClient {
    pub fn new(settings: &HttpSettings, cache_root: &Path) -> Result<Self, reqwest::Error> {
        Self::with_base_url(GBIF_API_URL, settings, cache_root)
    }

    /// Client against a non-default endpoint (mirrors, test servers)
    pub fn with_base_url(
        base_url: &str,
        settings: &HttpSettings,
        cache_root: &Path,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: HttpSource::new(SourceId::Gbif, base_url, settings)?,
            cache: ResponseCache::new(cache_root, SourceId::Gbif),
        })
    }

    fn parse_detail(&self, species: &str, payload: &str) -> Result<PlantRecord, FetchError> {
        let detail: GbifSpecies = serde_json::from_str(payload)
            .map_err(|e| FetchError::Parse(format!("GBIF species detail: {}", e)))?;

        let mut record = PlantRecord::new(species);
        record.confirm_species(SourceId::Gbif);
        if let Some(name) = detail.vernacular_name {
            record.fill(RecordField::CommonName, &name, Some(SourceId::Gbif));
        }
        Ok(record)
    }

    async fn lookup_usage_key(&self, species: &str) -> Result<u64, FetchError> {
        let body = self
            .http
            .get_text("species/match", &[("name", species), ("kingdom", "Plantae")])
            .await?;

        let matched: GbifMatch = serde_json::from_str(&body)
            .map_err(|e| FetchError::Parse(format!("GBIF match: {}", e)))?;

        match (matched.match_type.as_deref(), matched.usage_key) {
            (Some("NONE"), _) | (_, None) => Err(FetchError::NotFound(format!(
                "GBIF has no match for {}",
                species
            ))),
            (_, Some(key)) => Ok(key),
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for GbifClient {
    fn source(&self) -> SourceId {
        SourceId::Gbif
    }

    async fn fetch(&self, species: &str) -> Result<PlantRecord, FetchError> {
        if let Some(entry) = self.cache.get(species) {
            match self.parse_detail(species, &entry.payload) {
                Ok(record) => {
                    tracing::debug!(species, "GBIF cache hit");
                    return Ok(record);
                }
                Err(e) => tracing::warn!(species, error = %e, "Unusable GBIF cache entry, refetching"),
            }
        }

        let key = self.lookup_usage_key(species).await?;
        tracing::debug!(species, usage_key = key, "GBIF match");

        let payload = self.http.get_text(&format!("species/{}", key), &[]).await?;
        if let Err(e) = self.cache.put(species, &payload) {
            tracing::warn!(species, error = %e, "GBIF cache write failed");
        }

        self.parse_detail(species, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn client(dir: &TempDir) -> GbifClient {
        GbifClient::with_base_url("http://127.0.0.1:9", &HttpSettings::default(), dir.path()).unwrap()
    }

    #[test]
    fn test_parse_detail_fills_common_name() {
        let dir = TempDir::new().unwrap();
        let record = client(&dir)
            .parse_detail("Quercus robur", r#"{"key": 2878688, "vernacularName": "English oak"}"#)
            .unwrap();

        assert_eq!(record.get(RecordField::CommonName), Some("English oak"));
        assert_eq!(record.provenance(RecordField::CommonName), Some(SourceId::Gbif));
        assert_eq!(record.provenance(RecordField::Species), Some(SourceId::Gbif));
    }

    #[test]
    fn test_parse_detail_without_vernacular_name() {
        let dir = TempDir::new().unwrap();
        let record = client(&dir).parse_detail("Quercus robur", r#"{"key": 2878688}"#).unwrap();
        assert!(!record.is_filled(RecordField::CommonName));
    }

    #[test]
    fn test_parse_detail_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let err = client(&dir).parse_detail("Quercus robur", "<html>").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fresh_cache_entry_answers_without_network() {
        let dir = TempDir::new().unwrap();
        let gbif = client(&dir);
        gbif.cache
            .put("Quercus robur", r#"{"vernacularName": "English oak"}"#)
            .unwrap();

        // Base URL points at a closed port; any network call would fail
        let record = gbif.fetch("Quercus robur").await.unwrap();
        assert_eq!(record.get(RecordField::CommonName), Some("English oak"));
    }
}
