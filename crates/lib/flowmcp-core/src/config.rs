//! Two-level configuration: the per-user global config and the per-project
//! local config.
//!
//! Both files are re-read on every operation; nothing is cached in process.
//! Structural problems are reported as [`ConfigWarning`]s instead of errors so
//! that one bad key never prevents the rest of the config from being used.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{error::Error, fmt, io};

use flowmcp_store::schema::SOURCE_KINDS;
use flowmcp_store::{CoreVersion, GlobalConfig, Group, LocalConfig, SourceEntry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::paths::FlowPaths;
use crate::reference::ToolRef;

const LOCAL_KNOWN_KEYS: [&str; 3] = ["root", "defaultGroup", "groups"];

#[derive(Debug)]
pub enum ConfigError {
    NotInitialized(PathBuf),
    Unreadable { path: PathBuf, message: String },
    Write { path: PathBuf, source: io::Error },
    Serialize(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized(path) => write!(
                f,
                "FlowMCP is not initialized: no global config at {}. Run setup first.",
                path.display()
            ),
            Self::Unreadable { path, message } => {
                write!(f, "config at {} could not be read: {message}", path.display())
            }
            Self::Write { path, source } => {
                write!(f, "failed to write {}: {source}", path.display())
            }
            Self::Serialize(err) => write!(f, "failed to serialize config: {err}"),
        }
    }
}

impl Error for ConfigError {}

/// A structural problem found while reading a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub key: String,
    pub message: String,
}

impl ConfigWarning {
    fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }

    fn missing(key: &str) -> Self {
        Self::new(key, format!("{key} is missing"))
    }

    fn wrong_type(key: &str, expected: &str) -> Self {
        Self::new(key, format!("{key} has the wrong type (expected {expected})"))
    }
}

/// Global config as read from disk, with the warnings found while reading it.
#[derive(Debug, Clone)]
pub struct GlobalSnapshot {
    pub path: PathBuf,
    pub config: GlobalConfig,
    pub warnings: Vec<ConfigWarning>,
}

/// Local config as read from disk.
///
/// `migrated_groups` lists groups that still use the legacy `schemas` key;
/// writing the snapshot back stores them under `tools`.
#[derive(Debug, Clone)]
pub struct LocalSnapshot {
    pub path: PathBuf,
    pub config: LocalConfig,
    pub warnings: Vec<ConfigWarning>,
    pub migrated_groups: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthScope {
    Global,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub scope: HealthScope,
    pub key: String,
    pub level: HealthLevel,
    pub message: String,
}

/// Health view over both config levels. `status` is false only when a check
/// failed outright; warnings do not flip it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: bool,
    pub checks: Vec<HealthCheck>,
}

impl HealthReport {
    #[must_use]
    pub fn warnings(&self) -> impl Iterator<Item = &HealthCheck> {
        self.checks
            .iter()
            .filter(|check| check.level == HealthLevel::Warn)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    paths: FlowPaths,
}

impl ConfigStore {
    #[must_use]
    pub const fn new(paths: FlowPaths) -> Self {
        Self { paths }
    }

    #[must_use]
    pub const fn paths(&self) -> &FlowPaths {
        &self.paths
    }

    /// Loads the global config.
    ///
    /// # Errors
    /// Returns `ConfigError::NotInitialized` if the file does not exist and
    /// `ConfigError::Unreadable` if it is not valid JSON.
    pub async fn load_global(&self) -> Result<GlobalSnapshot, ConfigError> {
        let path = self.paths.global_config();
        let Some(value) = read_json(&path).await? else {
            return Err(ConfigError::NotInitialized(path));
        };
        let (config, warnings) = global_from_value(&value);
        Ok(GlobalSnapshot {
            path,
            config,
            warnings,
        })
    }

    /// Loads the project config; `Ok(None)` means no project is initialized.
    ///
    /// # Errors
    /// Returns `ConfigError::Unreadable` if the file exists but is not valid JSON.
    pub async fn load_local(&self) -> Result<Option<LocalSnapshot>, ConfigError> {
        let path = self.paths.local_config();
        let Some(value) = read_json(&path).await? else {
            return Ok(None);
        };
        let (config, warnings, migrated_groups) = local_from_value(&value);
        Ok(Some(LocalSnapshot {
            path,
            config,
            warnings,
            migrated_groups,
        }))
    }

    /// Writes the project config, creating `.flowmcp/` when needed.
    ///
    /// # Errors
    /// Returns `ConfigError` if serialization or the write fails.
    pub async fn write_local(&self, config: &LocalConfig) -> Result<(), ConfigError> {
        write_json(&self.paths.local_config(), config).await
    }

    /// Writes the global config.
    ///
    /// # Errors
    /// Returns `ConfigError` if serialization or the write fails.
    pub async fn write_global(&self, config: &GlobalConfig) -> Result<(), ConfigError> {
        write_json(&self.paths.global_config(), config).await
    }

    /// Resolves `envPath` to an absolute path. `~/` expands to the user home;
    /// other relative paths are taken relative to the flowmcp home.
    #[must_use]
    pub fn env_file(&self, global: &GlobalConfig) -> Option<PathBuf> {
        let raw = global.env_path.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(rest) = raw.strip_prefix("~/") {
            return dirs::home_dir().map(|home| home.join(rest));
        }
        let path = Path::new(raw);
        if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            Some(self.paths.home().join(path))
        }
    }

    /// Reads the environment secrets named by `envPath`. A missing or
    /// unreadable file yields an empty environment.
    pub async fn load_env(&self, global: &GlobalConfig) -> BTreeMap<String, String> {
        let Some(path) = self.env_file(global) else {
            return BTreeMap::new();
        };
        let Ok(content) = tokio::fs::read_to_string(&path).await else {
            debug!("env file {} not readable", path.display());
            return BTreeMap::new();
        };
        dotenvy::from_read_iter(content.as_bytes())
            .filter_map(Result::ok)
            .collect()
    }

    /// Produces the health view over both config levels.
    pub async fn health(&self) -> HealthReport {
        let mut checks = Vec::new();
        let global = self.global_health(&mut checks).await;
        self.local_health(global.as_ref(), &mut checks).await;
        let status = checks.iter().all(|check| check.level != HealthLevel::Fail);
        HealthReport { status, checks }
    }

    async fn global_health(&self, checks: &mut Vec<HealthCheck>) -> Option<GlobalConfig> {
        let snapshot = match self.load_global().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                checks.push(check(HealthScope::Global, "config", HealthLevel::Fail, err.to_string()));
                return None;
            }
        };

        checks.push(check(
            HealthScope::Global,
            "config",
            HealthLevel::Pass,
            format!("global config found at {}", snapshot.path.display()),
        ));
        for warning in &snapshot.warnings {
            checks.push(check(HealthScope::Global, &warning.key, HealthLevel::Warn, &warning.message));
        }

        if let Some(env_file) = self.env_file(&snapshot.config) {
            let (level, message) = if tokio::fs::try_exists(&env_file).await.unwrap_or(false) {
                (HealthLevel::Pass, format!("env file found at {}", env_file.display()))
            } else {
                (HealthLevel::Warn, format!("env file {} not found", env_file.display()))
            };
            checks.push(check(HealthScope::Global, "envPath", level, message));
        }

        if snapshot.config.sources.is_empty() {
            checks.push(check(
                HealthScope::Global,
                "sources",
                HealthLevel::Warn,
                "no sources imported",
            ));
        }
        for (name, source) in &snapshot.config.sources {
            let dir = self.paths.source_dir(name);
            let (level, message) = if tokio::fs::try_exists(&dir).await.unwrap_or(false) {
                (
                    HealthLevel::Pass,
                    format!("{name}: {} source, {} schemas", source.kind, source.schema_count),
                )
            } else {
                (
                    HealthLevel::Warn,
                    format!("{name}: source directory {} is missing", dir.display()),
                )
            };
            checks.push(check(HealthScope::Global, &format!("sources.{name}"), level, message));
        }

        Some(snapshot.config)
    }

    async fn local_health(&self, global: Option<&GlobalConfig>, checks: &mut Vec<HealthCheck>) {
        let snapshot = match self.load_local().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                checks.push(check(
                    HealthScope::Local,
                    "config",
                    HealthLevel::Warn,
                    format!(
                        "no project config at {} (no project initialized)",
                        self.paths.local_config().display()
                    ),
                ));
                return;
            }
            Err(err) => {
                checks.push(check(HealthScope::Local, "config", HealthLevel::Warn, err.to_string()));
                return;
            }
        };

        checks.push(check(
            HealthScope::Local,
            "config",
            HealthLevel::Pass,
            format!("project config found at {}", snapshot.path.display()),
        ));
        for warning in &snapshot.warnings {
            checks.push(check(HealthScope::Local, &warning.key, HealthLevel::Warn, &warning.message));
        }

        let config = &snapshot.config;
        match config.default_group.as_deref() {
            None => checks.push(check(
                HealthScope::Local,
                "defaultGroup",
                HealthLevel::Warn,
                "no default group set",
            )),
            Some(name) if config.groups.contains_key(name) => checks.push(check(
                HealthScope::Local,
                "defaultGroup",
                HealthLevel::Pass,
                format!("default group \"{name}\""),
            )),
            // Dangling default groups are already reported as a warning.
            Some(_) => {}
        }

        for (name, group) in &config.groups {
            let key = format!("groups.{name}");
            if group.tools.is_empty() {
                checks.push(check(HealthScope::Local, &key, HealthLevel::Warn, "group has no tools"));
                continue;
            }
            let mut problems = 0usize;
            for raw in &group.tools {
                match ToolRef::parse(raw) {
                    Ok(reference) => {
                        if !self.source_known(global, &reference.source).await {
                            problems += 1;
                            checks.push(check(
                                HealthScope::Local,
                                &key,
                                HealthLevel::Warn,
                                format!("{raw}: unknown source \"{}\"", reference.source),
                            ));
                        }
                    }
                    Err(err) => {
                        problems += 1;
                        checks.push(check(HealthScope::Local, &key, HealthLevel::Warn, err.to_string()));
                    }
                }
            }
            if problems == 0 {
                checks.push(check(
                    HealthScope::Local,
                    &key,
                    HealthLevel::Pass,
                    format!("{} tool references", group.tools.len()),
                ));
            }
        }
    }

    async fn source_known(&self, global: Option<&GlobalConfig>, source: &str) -> bool {
        if global.is_some_and(|config| config.sources.contains_key(source)) {
            return true;
        }
        tokio::fs::try_exists(self.paths.source_dir(source))
            .await
            .unwrap_or(false)
    }
}

fn check(
    scope: HealthScope,
    key: &str,
    level: HealthLevel,
    message: impl Into<String>,
) -> HealthCheck {
    HealthCheck {
        scope,
        key: key.to_string(),
        level,
        message: message.into(),
    }
}

async fn read_json(path: &Path) -> Result<Option<Value>, ConfigError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(ConfigError::Unreadable {
                path: path.to_path_buf(),
                message: err.to_string(),
            });
        }
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| ConfigError::Unreadable {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    let mut body = serde_json::to_vec_pretty(value).map_err(ConfigError::Serialize)?;
    body.push(b'\n');
    tokio::fs::write(path, body)
        .await
        .map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads a global config leniently, collecting warnings for missing or
/// mistyped keys.
#[must_use]
pub fn global_from_value(value: &Value) -> (GlobalConfig, Vec<ConfigWarning>) {
    let mut warnings = Vec::new();
    let mut config = GlobalConfig::default();
    let Some(object) = value.as_object() else {
        warnings.push(ConfigWarning::wrong_type("global config", "a JSON object"));
        return (config, warnings);
    };

    config.env_path = string_field(object, "envPath", "envPath", true, &mut warnings);
    config.initialized = string_field(object, "initialized", "initialized", true, &mut warnings);

    match object.get("flowmcpCore") {
        None => warnings.push(ConfigWarning::missing("flowmcpCore")),
        Some(Value::Object(core)) => {
            let version =
                string_field(core, "version", "flowmcpCore.version", true, &mut warnings);
            let schema_spec =
                string_field(core, "schemaSpec", "flowmcpCore.schemaSpec", false, &mut warnings);
            config.flowmcp_core = Some(CoreVersion {
                version: version.unwrap_or_default(),
                schema_spec,
            });
        }
        Some(_) => warnings.push(ConfigWarning::wrong_type("flowmcpCore", "an object")),
    }

    match object.get("sources") {
        None => warnings.push(ConfigWarning::missing("sources")),
        Some(Value::Object(sources)) => {
            for (name, entry) in sources {
                if let Some(source) = source_from_value(name, entry, &mut warnings) {
                    config.sources.insert(name.clone(), source);
                }
            }
        }
        Some(_) => warnings.push(ConfigWarning::wrong_type("sources", "an object")),
    }

    (config, warnings)
}

fn source_from_value(
    name: &str,
    value: &Value,
    warnings: &mut Vec<ConfigWarning>,
) -> Option<SourceEntry> {
    let key = format!("sources.{name}");
    let Some(entry) = value.as_object() else {
        warnings.push(ConfigWarning::wrong_type(&key, "an object"));
        return None;
    };

    let kind = string_field(entry, "type", &format!("{key}.type"), true, warnings)
        .unwrap_or_default();
    if !kind.is_empty() && !SOURCE_KINDS.contains(&kind.as_str()) {
        warnings.push(ConfigWarning::new(
            format!("{key}.type"),
            format!("unknown source type \"{kind}\""),
        ));
    }

    let schema_count = match entry.get("schemaCount") {
        None => 0,
        Some(count) => count.as_u64().map_or_else(
            || {
                warnings.push(ConfigWarning::wrong_type(&format!("{key}.schemaCount"), "a number"));
                0
            },
            |count| usize::try_from(count).unwrap_or(usize::MAX),
        ),
    };

    Some(SourceEntry { kind, schema_count })
}

/// Reads a local config leniently.
///
/// Returns the config, its warnings, and the names of groups that used the
/// legacy `schemas` key (their order is preserved under `tools`).
#[must_use]
pub fn local_from_value(value: &Value) -> (LocalConfig, Vec<ConfigWarning>, Vec<String>) {
    let mut warnings = Vec::new();
    let mut migrated = Vec::new();
    let mut config = LocalConfig::default();
    let Some(object) = value.as_object() else {
        warnings.push(ConfigWarning::wrong_type("local config", "a JSON object"));
        return (config, warnings, migrated);
    };

    config.root = string_field(object, "root", "root", false, &mut warnings);
    config.default_group = string_field(object, "defaultGroup", "defaultGroup", false, &mut warnings);

    match object.get("groups") {
        None => {}
        Some(Value::Object(groups)) => {
            for (name, entry) in groups {
                let key = format!("groups.{name}");
                let Some(group) = entry.as_object() else {
                    warnings.push(ConfigWarning::wrong_type(&key, "an object"));
                    continue;
                };
                let description =
                    string_field(group, "description", &format!("{key}.description"), false, &mut warnings)
                        .unwrap_or_default();
                let tools = if group.contains_key("tools") {
                    string_list(group, "tools", &key, &mut warnings)
                } else if group.contains_key("schemas") {
                    migrated.push(name.clone());
                    string_list(group, "schemas", &key, &mut warnings)
                } else {
                    warnings.push(ConfigWarning::missing(&format!("{key}.tools")));
                    Vec::new()
                };
                config
                    .groups
                    .insert(name.clone(), Group { description, tools });
            }
        }
        Some(_) => warnings.push(ConfigWarning::wrong_type("groups", "an object")),
    }

    if let Some(default_group) = config.default_group.as_deref()
        && !config.groups.contains_key(default_group)
    {
        warnings.push(ConfigWarning::new(
            "defaultGroup",
            format!("Default group \"{default_group}\" not found in groups"),
        ));
    }

    config.extra = object
        .iter()
        .filter(|(key, _)| !LOCAL_KNOWN_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect::<Map<String, Value>>();

    (config, warnings, migrated)
}

fn string_field(
    object: &Map<String, Value>,
    field: &str,
    key: &str,
    required: bool,
    warnings: &mut Vec<ConfigWarning>,
) -> Option<String> {
    match object.get(field) {
        None | Some(Value::Null) => {
            if required {
                warnings.push(ConfigWarning::missing(key));
            }
            None
        }
        Some(Value::String(value)) => Some(value.clone()),
        Some(_) => {
            warnings.push(ConfigWarning::wrong_type(key, "a string"));
            None
        }
    }
}

fn string_list(
    object: &Map<String, Value>,
    field: &str,
    group_key: &str,
    warnings: &mut Vec<ConfigWarning>,
) -> Vec<String> {
    let key = format!("{group_key}.{field}");
    let Some(items) = object.get(field).and_then(Value::as_array) else {
        warnings.push(ConfigWarning::wrong_type(&key, "an array of strings"));
        return Vec::new();
    };
    let mut values = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(value) => values.push(value.to_string()),
            None => warnings.push(ConfigWarning::wrong_type(&format!("{key}[{index}]"), "a string")),
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(path: &Path, value: &Value) {
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, value.to_string()).expect("write config");
    }

    #[test]
    fn global_config_reports_missing_and_mistyped_keys() {
        let (config, warnings) = global_from_value(&json!({
            "envPath": 42,
            "flowmcpCore": { "version": "2.0.0" },
            "sources": { "demo": { "type": "local", "schemaCount": 3 }, "bad": "nope" }
        }));

        assert!(config.env_path.is_none());
        assert_eq!(config.flowmcp_core.map(|core| core.version), Some("2.0.0".to_string()));
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources["demo"].schema_count, 3);

        let keys: Vec<&str> = warnings.iter().map(|warning| warning.key.as_str()).collect();
        assert!(keys.contains(&"envPath"));
        assert!(keys.contains(&"initialized"));
        assert!(keys.contains(&"sources.bad"));
    }

    #[test]
    fn legacy_schemas_key_is_read_as_tools_in_order() {
        let (config, warnings, migrated) = local_from_value(&json!({
            "defaultGroup": "dev",
            "groups": { "dev": { "schemas": ["b/two.json::y", "a/one.json::x"] } }
        }));

        assert!(warnings.is_empty());
        assert_eq!(migrated, vec!["dev".to_string()]);
        assert_eq!(
            config.groups["dev"].tools,
            vec!["b/two.json::y".to_string(), "a/one.json::x".to_string()]
        );
    }

    #[test]
    fn dangling_default_group_is_a_warning() {
        let (config, warnings, _) = local_from_value(&json!({
            "defaultGroup": "x",
            "groups": {}
        }));

        assert_eq!(config.default_group.as_deref(), Some("x"));
        assert!(warnings
            .iter()
            .any(|warning| warning.message.contains("Default group \"x\" not found")));
    }

    #[test]
    fn non_string_tool_entries_are_skipped() {
        let (config, warnings, _) = local_from_value(&json!({
            "groups": { "dev": { "tools": ["demo/ping.json::ping", 7] } }
        }));

        assert_eq!(config.groups["dev"].tools.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].key, "groups.dev.tools[1]");
    }

    #[tokio::test]
    async fn missing_global_config_is_not_initialized() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConfigStore::new(FlowPaths::new(dir.path().join("home"), dir.path()));

        let err = store.load_global().await.unwrap_err();
        assert!(matches!(err, ConfigError::NotInitialized(_)));
        assert!(store.load_local().await.expect("local load").is_none());
    }

    #[tokio::test]
    async fn writing_migrates_legacy_groups() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = FlowPaths::new(dir.path().join("home"), dir.path());
        write(
            &paths.local_config(),
            &json!({ "groups": { "dev": { "schemas": ["demo/ping.json::ping"] } }, "custom": 1 }),
        );
        let store = ConfigStore::new(paths.clone());

        let snapshot = store.load_local().await.expect("load").expect("present");
        store.write_local(&snapshot.config).await.expect("write");

        let raw: Value = serde_json::from_str(
            &std::fs::read_to_string(paths.local_config()).expect("read back"),
        )
        .expect("valid json");
        assert_eq!(raw["groups"]["dev"]["tools"], json!(["demo/ping.json::ping"]));
        assert!(raw["groups"]["dev"].get("schemas").is_none());
        assert_eq!(raw["custom"], json!(1));
    }

    #[tokio::test]
    async fn env_file_is_parsed_with_dotenv_rules() {
        let dir = tempfile::tempdir().expect("tempdir");
        let home = dir.path().join("home");
        std::fs::create_dir_all(&home).expect("mkdir");
        std::fs::write(home.join(".env"), "API_KEY=secret\n# comment\nOTHER=\"quoted\"\n")
            .expect("write env");
        let store = ConfigStore::new(FlowPaths::new(&home, dir.path()));
        let global = GlobalConfig {
            env_path: Some(".env".to_string()),
            ..GlobalConfig::default()
        };

        let env = store.load_env(&global).await;
        assert_eq!(env.get("API_KEY").map(String::as_str), Some("secret"));
        assert_eq!(env.get("OTHER").map(String::as_str), Some("quoted"));
    }

    #[tokio::test]
    async fn health_fails_without_global_and_warns_without_project() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConfigStore::new(FlowPaths::new(dir.path().join("home"), dir.path()));

        let report = store.health().await;
        assert!(!report.status);
        assert!(report.checks.iter().any(|check| check.scope == HealthScope::Global
            && check.level == HealthLevel::Fail));
        assert!(report.warnings().any(|check| check.scope == HealthScope::Local));
    }

    #[tokio::test]
    async fn health_flags_unknown_sources_in_groups() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = FlowPaths::new(dir.path().join("home"), dir.path());
        write(
            &paths.global_config(),
            &json!({
                "envPath": ".env",
                "flowmcpCore": { "version": "2.0.0" },
                "initialized": "2026-01-01T00:00:00Z",
                "sources": {}
            }),
        );
        write(
            &paths.local_config(),
            &json!({ "defaultGroup": "dev", "groups": { "dev": { "tools": ["ghost/a.json::b"] } } }),
        );
        let store = ConfigStore::new(paths);

        let report = store.health().await;
        assert!(report.status);
        assert!(report
            .warnings()
            .any(|check| check.message.contains("unknown source \"ghost\"")));
    }
}
