use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::USER_PARAM;

/// Machine-wide settings written by setup and import.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flowmcp_core: Option<CoreVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialized: Option<String>,
    #[serde(default)]
    pub sources: IndexMap<String, SourceEntry>,
}

/// Version pins for the schema runtime the sources were imported against.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CoreVersion {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_spec: Option<String>,
}

/// A source as recorded in the global config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub schema_count: usize,
}

/// Per-project settings stored under `.flowmcp/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LocalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_group: Option<String>,
    #[serde(default)]
    pub groups: IndexMap<String, Group>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Named, ordered list of tool references.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

/// Manifest written by the import collaborator at the root of a source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_spec: Option<String>,
    #[serde(default)]
    pub schemas: Vec<RegistryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    #[serde(default)]
    pub namespace: String,
    pub file: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub required_server_params: Vec<String>,
}

/// Top-level shape of a schema module file; the definition lives under `main`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<SchemaDefinition>,
}

/// Declarative definition exported by a schema module.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default)]
    pub required_server_params: Vec<String>,
    #[serde(default)]
    pub required_libraries: Vec<String>,
    #[serde(default)]
    pub shared_lists: Vec<String>,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub routes: IndexMap<String, Route>,
}

/// One callable operation of a schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParamSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preload: Option<Preload>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<Map<String, Value>>,
}

impl Route {
    /// Returns the cache TTL in seconds when the route is eligible for caching.
    /// A zero TTL still caches, but every stored entry is already stale.
    #[must_use]
    pub fn preload_ttl(&self) -> Option<u64> {
        self.preload
            .filter(|preload| preload.enabled)
            .map(|preload| preload.ttl)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preload {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub ttl: u64,
}

/// Declarative parameter of a route.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamSpec {
    #[serde(default)]
    pub position: ParamPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<ParamType>,
}

impl ParamSpec {
    /// User parameters are supplied by the caller; everything else is a fixed value.
    #[must_use]
    pub fn is_user_param(&self) -> bool {
        self.position
            .value
            .as_deref()
            .is_none_or(|value| value == USER_PARAM)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamPosition {
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub location: ParamLocation,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    #[default]
    Query,
    Body,
    Insert,
}

/// Type annotation of a parameter, e.g. `number()` with `["default(5)"]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamType {
    #[serde(default)]
    pub primitive: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Stored response for a preload route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub meta: CacheMeta,
    pub data: Value,
}

impl CacheEntry {
    /// An entry is fresh strictly before its expiry instant.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.meta.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CacheMeta {
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ttl: u64,
    pub size: usize,
}
