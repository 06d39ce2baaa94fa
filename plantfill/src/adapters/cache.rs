//! On-disk response cache
//!
//! One directory per source. Entries are keyed by the SHA-256 of
//! `"<source>:<query>"` and hold the fetch timestamp plus the raw response
//! text. Entries are never edited in place: a refresh writes a complete new
//! file to a temp path and renames it over the old one, so concurrent writers
//! of the same key leave whichever finished last.
//!
//! Entries older than [`CACHE_MAX_AGE_DAYS`] are ignored but left on disk.
//! Any read or write problem degrades to a cache miss.

use crate::models::SourceId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Freshness window for cache entries
pub const CACHE_MAX_AGE_DAYS: i64 = 7;

/// Stored cache entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the payload was fetched
    pub timestamp: DateTime<Utc>,
    /// Source key that produced the payload
    pub source: String,
    /// Query string the payload answers
    pub query: String,
    /// Raw response text
    pub payload: String,
}

impl CacheEntry {
    /// Fresh when fetched within the window and not in the future
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.timestamp);
        age >= Duration::zero() && age < Duration::days(CACHE_MAX_AGE_DAYS)
    }
}

/// Content-addressed response cache owned by one adapter
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    source: SourceId,
}

impl ResponseCache {
    /// Cache rooted at `<root>/<source key>`
    ///
    /// The directory is created on first write.
    pub fn new(root: &Path, source: SourceId) -> Self {
        Self {
            dir: root.join(source.key()),
            source,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic key for a query
    pub fn key(&self, query: &str) -> String {
        let digest = Sha256::digest(format!("{}:{}", self.source.key(), query).as_bytes());
        format!("{:x}", digest)
    }

    fn entry_path(&self, query: &str) -> PathBuf {
        self.dir.join(format!("{}.json", self.key(query)))
    }

    /// Fresh entry for a query, if any
    pub fn get(&self, query: &str) -> Option<CacheEntry> {
        self.get_at(query, Utc::now())
    }

    /// Fresh entry for a query as of `now`
    pub fn get_at(&self, query: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let path = self.entry_path(query);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(source = %self.source, path = %path.display(), error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(source = %self.source, path = %path.display(), error = %e, "Corrupt cache entry, treating as miss");
                return None;
            }
        };

        if !entry.is_fresh_at(now) {
            debug!(source = %self.source, query, fetched = %entry.timestamp, "Cache entry stale");
            return None;
        }

        Some(entry)
    }

    /// Store a freshly fetched payload
    pub fn put(&self, query: &str, payload: &str) -> std::io::Result<()> {
        self.put_at(query, payload, Utc::now())
    }

    /// Store a payload with an explicit fetch time
    ///
    /// Replaces any existing entry for the query.
    pub fn put_at(&self, query: &str, payload: &str, fetched_at: DateTime<Utc>) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let entry = CacheEntry {
            timestamp: fetched_at,
            source: self.source.key().to_string(),
            query: query.to_string(),
            payload: payload.to_string(),
        };
        let serialized = serde_json::to_vec(&entry)?;

        let mut temp = tempfile::NamedTempFile::new_in(&self.dir)?;
        temp.write_all(&serialized)?;
        temp.as_file().sync_all()?;
        temp.persist(self.entry_path(query)).map_err(|e| e.error)?;

        debug!(source = %self.source, query, "Cached response");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_is_deterministic_and_source_scoped() {
        let dir = TempDir::new().unwrap();
        let gbif = ResponseCache::new(dir.path(), SourceId::Gbif);
        let tropicos = ResponseCache::new(dir.path(), SourceId::Tropicos);

        assert_eq!(gbif.key("Quercus robur"), gbif.key("Quercus robur"));
        assert_ne!(gbif.key("Quercus robur"), gbif.key("Quercus petraea"));
        assert_ne!(gbif.key("Quercus robur"), tropicos.key("Quercus robur"));
        assert_eq!(gbif.key("Quercus robur").len(), 64);
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path(), SourceId::Gbif);
        let payload = "{\"vernacularName\": \"English oak\",\n \"key\": 2878688}";

        cache.put("Quercus robur", payload).unwrap();
        let entry = cache.get("Quercus robur").expect("fresh entry");

        assert_eq!(entry.payload, payload);
        assert_eq!(entry.query, "Quercus robur");
        assert_eq!(entry.source, "gbif");
        assert!(cache.dir().ends_with("gbif"));
    }

    #[test]
    fn test_stale_entry_ignored_but_kept() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path(), SourceId::Gbif);
        let old = Utc::now() - Duration::days(CACHE_MAX_AGE_DAYS) - Duration::minutes(1);

        cache.put_at("Quercus robur", "{}", old).unwrap();

        assert!(cache.get("Quercus robur").is_none());
        assert!(cache.entry_path("Quercus robur").exists(), "Stale entries are not deleted");
    }

    #[test]
    fn test_entry_just_inside_window_is_fresh() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path(), SourceId::Gbif);
        let fetched = Utc::now() - Duration::days(6);

        cache.put_at("Quercus robur", "{}", fetched).unwrap();
        assert!(cache.get("Quercus robur").is_some());
    }

    #[test]
    fn test_future_timestamp_is_stale() {
        let now = Utc::now();
        let entry = CacheEntry {
            timestamp: now + Duration::hours(1),
            source: "gbif".into(),
            query: "Quercus robur".into(),
            payload: "{}".into(),
        };
        assert!(!entry.is_fresh_at(now));
    }

    #[test]
    fn test_replacement_overwrites() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path(), SourceId::Gbif);

        cache.put("Quercus robur", "first").unwrap();
        cache.put("Quercus robur", "second").unwrap();

        assert_eq!(cache.get("Quercus robur").unwrap().payload, "second");
    }

    #[test]
    fn test_corrupt_entry_is_miss() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path(), SourceId::Gbif);
        std::fs::create_dir_all(cache.dir()).unwrap();
        std::fs::write(cache.entry_path("Quercus robur"), "not json").unwrap();

        assert!(cache.get("Quercus robur").is_none());
    }

    #[test]
    fn test_missing_directory_is_miss() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(&dir.path().join("never-created"), SourceId::Tropicos);
        assert!(cache.get("Quercus robur").is_none());
    }
}
