//! TTL cache for preload routes.
//!
//! Entries live at `{root}/{source}/{namespace}/{route}[/{paramHash}].json`.
//! Expiry is checked on read only; stale files are ignored, never deleted, and
//! nothing is evicted for capacity.

use std::path::{Path, PathBuf};
use std::{error::Error, fmt, io};

use chrono::{DateTime, TimeDelta, Utc};
use flowmcp_store::{CacheEntry, CacheMeta};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

const PARAM_HASH_LEN: usize = 16;
const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

#[derive(Debug)]
pub enum CacheError {
    Io { path: PathBuf, source: io::Error },
    Serialize(serde_json::Error),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cache write failed for {}: {source}", path.display())
            }
            Self::Serialize(err) => write!(f, "cache entry could not be serialized: {err}"),
        }
    }
}

impl Error for CacheError {}

/// How a single call may use the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Read a fresh entry if present, otherwise call and store.
    Use,
    /// Skip the read but store the fresh result.
    Refresh,
    /// Neither read nor write.
    Bypass,
}

impl CacheMode {
    #[must_use]
    pub const fn from_flags(no_cache: bool, refresh: bool) -> Self {
        if no_cache {
            Self::Bypass
        } else if refresh {
            Self::Refresh
        } else {
            Self::Use
        }
    }

    #[must_use]
    pub const fn reads(self) -> bool {
        matches!(self, Self::Use)
    }

    #[must_use]
    pub const fn writes(self) -> bool {
        !matches!(self, Self::Bypass)
    }
}

/// Relative location of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    segments: Vec<String>,
}

impl CacheKey {
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        let last = self.segments.len().saturating_sub(1);
        for (index, segment) in self.segments.iter().enumerate() {
            if index == last {
                path.push(format!("{segment}.json"));
            } else {
                path.push(segment);
            }
        }
        path
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

#[derive(Debug, Clone)]
pub struct CacheEngine {
    root: PathBuf,
}

impl CacheEngine {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Builds the key for a call. The parameter hash segment is present only
    /// when at least one parameter was supplied.
    #[must_use]
    pub fn key_for(
        &self,
        source: &str,
        namespace: &str,
        route: &str,
        params: &Map<String, Value>,
    ) -> CacheKey {
        let mut segments = vec![
            sanitize_segment(source),
            sanitize_segment(namespace),
            sanitize_segment(route),
        ];
        if let Some(hash) = params_hash(params) {
            segments.push(hash);
        }
        CacheKey { segments }
    }

    #[must_use]
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Reads an entry regardless of freshness. Missing and unparseable files
    /// both read as `None`.
    pub async fn read(&self, key: &CacheKey) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        let raw = tokio::fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("ignoring corrupt cache entry {}: {err}", path.display());
                None
            }
        }
    }

    /// Returns the entry only if it is still fresh at `now`.
    pub async fn lookup(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<CacheEntry> {
        let entry = self.read(key).await?;
        if entry.is_fresh(now) {
            debug!("cache hit for {key}");
            Some(entry)
        } else {
            debug!("cache entry for {key} expired at {}", entry.meta.expires_at);
            None
        }
    }

    /// Writes (or overwrites) the entry for `key`.
    ///
    /// # Errors
    /// Returns `CacheError` if the entry cannot be serialized or written.
    pub async fn store(
        &self,
        key: &CacheKey,
        data: Value,
        ttl: u64,
        now: DateTime<Utc>,
    ) -> Result<CacheEntry, CacheError> {
        let size = serde_json::to_vec(&data).map_err(CacheError::Serialize)?.len();
        let ttl_secs = i64::try_from(ttl.min(MAX_TTL_SECS)).unwrap_or_default();
        let entry = CacheEntry {
            meta: CacheMeta {
                fetched_at: now,
                expires_at: now + TimeDelta::seconds(ttl_secs),
                ttl,
                size,
            },
            data,
        };

        let path = self.entry_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| CacheError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let body = serde_json::to_vec_pretty(&entry).map_err(CacheError::Serialize)?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| CacheError::Io {
                path: path.clone(),
                source,
            })?;
        debug!("stored cache entry {key} (ttl {ttl}s)");
        Ok(entry)
    }
}

/// Stable hash of the parameters, independent of key order.
#[must_use]
pub fn params_hash(params: &Map<String, Value>) -> Option<String> {
    if params.is_empty() {
        return None;
    }
    let canonical = canonicalize(&Value::Object(params.clone()));
    let digest = Sha256::digest(canonical.to_string().as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(PARAM_HASH_LEN);
    Some(hash)
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                if let Some(inner) = map.get(key) {
                    sorted.insert(key.clone(), canonicalize(inner));
                }
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|ch| if matches!(ch, '/' | '\\' | ':') { '_' } else { ch })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    #[test]
    fn key_omits_hash_without_parameters() {
        let engine = CacheEngine::new("/cache");
        let key = engine.key_for("demo", "demo", "ping", &Map::new());
        assert_eq!(key.to_string(), "demo/demo/ping");
        assert_eq!(engine.entry_path(&key), PathBuf::from("/cache/demo/demo/ping.json"));
    }

    #[test]
    fn key_ignores_parameter_order() {
        let engine = CacheEngine::new("/cache");
        let left = engine.key_for("s", "ns", "route", &params(json!({ "a": 1, "b": { "y": 2, "x": 1 } })));
        let right = engine.key_for("s", "ns", "route", &params(json!({ "b": { "x": 1, "y": 2 }, "a": 1 })));
        assert_eq!(left, right);
        assert_eq!(left.relative_path().components().count(), 4);
    }

    #[test]
    fn distinct_parameters_produce_distinct_keys() {
        let engine = CacheEngine::new("/cache");
        let one = engine.key_for("s", "ns", "route", &params(json!({ "id": "1" })));
        let two = engine.key_for("s", "ns", "route", &params(json!({ "id": "2" })));
        let typed = engine.key_for("s", "ns", "route", &params(json!({ "id": 1 })));
        assert_ne!(one, two);
        assert_ne!(one, typed);
    }

    #[test]
    fn segments_cannot_escape_the_root() {
        let engine = CacheEngine::new("/cache");
        let key = engine.key_for("..", "a/b", "c", &Map::new());
        assert_eq!(key.to_string(), "_/a_b/c");
    }

    #[test]
    fn mode_flags() {
        assert_eq!(CacheMode::from_flags(true, true), CacheMode::Bypass);
        assert_eq!(CacheMode::from_flags(false, true), CacheMode::Refresh);
        assert!(!CacheMode::Refresh.reads());
        assert!(CacheMode::Refresh.writes());
        assert!(!CacheMode::Bypass.writes());
    }

    #[tokio::test]
    async fn stored_entry_is_fresh_until_expiry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = CacheEngine::new(dir.path());
        let key = engine.key_for("demo", "demo", "price", &params(json!({ "id": "btc" })));
        let now = Utc::now();

        let stored = engine
            .store(&key, json!({ "price": 1 }), 60, now)
            .await
            .expect("store succeeds");
        assert_eq!(stored.meta.ttl, 60);
        assert_eq!(stored.meta.expires_at - stored.meta.fetched_at, TimeDelta::seconds(60));

        let hit = engine.lookup(&key, now + TimeDelta::seconds(59)).await;
        assert_eq!(hit.map(|entry| entry.data), Some(json!({ "price": 1 })));

        let expired = engine.lookup(&key, now + TimeDelta::seconds(60)).await;
        assert!(expired.is_none());
        assert!(engine.entry_path(&key).exists(), "expired entries stay on disk");
    }

    #[tokio::test]
    async fn corrupt_entry_reads_as_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = CacheEngine::new(dir.path());
        let key = engine.key_for("demo", "demo", "ping", &Map::new());
        let path = engine.entry_path(&key);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "{ not json").expect("write corrupt entry");

        assert!(engine.read(&key).await.is_none());
        assert!(engine.lookup(&key, Utc::now()).await.is_none());
    }
}
