//! Tropicos name search client
//!
//! Requires an API key. Without one the adapter reports
//! [`FetchError::Unconfigured`] and never touches the network or the cache.
//! Tropicos contributes the literal meaning of the Latin name (`Etymology`).

use super::cache::ResponseCache;
use super::http::{HttpSettings, HttpSource};
use crate::models::{PlantRecord, RecordField, SourceId};
use crate::types::{FetchError, SourceAdapter};
use serde::Deserialize;
use std::path::Path;

pub const TROPICOS_API_URL: &str = "https://services.tropicos.org";

/// One element of the `/Name/Search` result array
#[derive(Debug, Deserialize)]
struct TropicosName {
    #[serde(rename = "NameId")]
    name_id: Option<u64>,
    #[serde(rename = "Etymology")]
    etymology: Option<String>,
}

pub struct TropicosClient {
    http: HttpSource,
    cache: ResponseCache,
    api_key: Option<String>,
}

impl TropicosClient {
    pub fn new(
        api_key: Option<String>,
        settings: &HttpSettings,
        cache_root: &Path,
    ) -> Result<Self, reqwest::Error> {
        Self::with_base_url(TROPICOS_API_URL, api_key, settings, cache_root)
    }

    pub fn with_base_url(
        base_url: &str,
        api_key: Option<String>,
        settings: &HttpSettings,
        cache_root: &Path,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: HttpSource::new(SourceId::Tropicos, base_url, settings)?,
            cache: ResponseCache::new(cache_root, SourceId::Tropicos),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn parse_name(&self, species: &str, payload: &str) -> Result<PlantRecord, FetchError> {
        let name: TropicosName = serde_json::from_str(payload)
            .map_err(|e| FetchError::Parse(format!("Tropicos name: {}", e)))?;

        let mut record = PlantRecord::new(species);
        if name.name_id.is_some() {
            record.confirm_species(SourceId::Tropicos);
        }
        if let Some(etymology) = name.etymology {
            record.fill(RecordField::LiteralLatin, &etymology, Some(SourceId::Tropicos));
        }
        Ok(record)
    }

    /// First usable element of a search response, re-serialized for caching
    fn first_result(species: &str, body: &str) -> Result<String, FetchError> {
        let results: Vec<serde_json::Value> = serde_json::from_str(body)
            .map_err(|e| FetchError::Parse(format!("Tropicos search: {}", e)))?;

        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::NotFound(format!("Tropicos has no name {}", species)))?;

        if let Some(message) = first.get("Error") {
            return Err(FetchError::NotFound(format!("Tropicos: {}", message)));
        }

        serde_json::to_string(&first).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl SourceAdapter for TropicosClient {
    fn source(&self) -> SourceId {
        SourceId::Tropicos
    }

    async fn fetch(&self, species: &str) -> Result<PlantRecord, FetchError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(FetchError::Unconfigured("Tropicos API key not set".to_string()));
        };

        if let Some(entry) = self.cache.get(species) {
            match self.parse_name(species, &entry.payload) {
                Ok(record) => {
                    tracing::debug!(species, "Tropicos cache hit");
                    return Ok(record);
                }
                Err(e) => tracing::warn!(species, error = %e, "Unusable Tropicos cache entry, refetching"),
            }
        }

        let body = self
            .http
            .get_text(
                "Name/Search",
                &[
                    ("name", species),
                    ("type", "exact"),
                    ("apikey", api_key),
                    ("format", "json"),
                ],
            )
            .await?;

        let payload = Self::first_result(species, &body)?;
        if let Err(e) = self.cache.put(species, &payload) {
            tracing::warn!(species, error = %e, "Tropicos cache write failed");
        }

        self.parse_name(species, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_key_is_unconfigured() {
        let dir = TempDir::new().unwrap();
        let client =
            TropicosClient::with_base_url("http://127.0.0.1:9", Some("  ".into()), &HttpSettings::default(), dir.path())
                .unwrap();

        assert!(!client.is_configured());
        let err = client.fetch("Quercus robur").await.unwrap_err();
        assert!(err.is_unconfigured());
    }

    #[test]
    fn test_first_result_error_marker_is_not_found() {
        let err = TropicosClient::first_result("Xyzzy plugh", r#"[{"Error": "No names were found"}]"#)
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[test]
    fn test_first_result_empty_array_is_not_found() {
        let err = TropicosClient::first_result("Xyzzy plugh", "[]").unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[test]
    fn test_parse_name_fills_literal_latin() {
        let dir = TempDir::new().unwrap();
        let client = TropicosClient::new(Some("key".into()), &HttpSettings::default(), dir.path()).unwrap();
        let payload = TropicosClient::first_result(
            "Quercus robur",
            r#"[{"NameId": 13100265, "Etymology": "strong oak"}, {"NameId": 1}]"#,
        )
        .unwrap();

        let record = client.parse_name("Quercus robur", &payload).unwrap();
        assert_eq!(record.get(RecordField::LiteralLatin), Some("strong oak"));
        assert_eq!(record.provenance(RecordField::LiteralLatin), Some(SourceId::Tropicos));
        assert_eq!(record.provenance(RecordField::Species), Some(SourceId::Tropicos));
    }
}
