use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use flowmcp_store::{CacheEntry, GlobalConfig, SchemaDefinition};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{CoreError, FlowControlPlane, ToolDescriptor};
use crate::cache::CacheMode;
use crate::runtime::PreparedCall;

/// Per-call options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub no_cache: bool,
    #[serde(default)]
    pub refresh: bool,
}

impl CallOptions {
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub const fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    #[must_use]
    pub const fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    const fn cache_mode(&self) -> CacheMode {
        CacheMode::from_flags(self.no_cache, self.refresh)
    }
}

/// Cache outcome reported alongside a preload route's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub hit: bool,
    pub stored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub ttl: u64,
}

impl CacheStatus {
    fn from_entry(entry: &CacheEntry, hit: bool) -> Self {
        Self {
            hit,
            stored: !hit,
            fetched_at: Some(entry.meta.fetched_at),
            expires_at: Some(entry.meta.expires_at),
            ttl: entry.meta.ttl,
        }
    }

    const fn not_stored(ttl: u64) -> Self {
        Self {
            hit: false,
            stored: false,
            fetched_at: None,
            expires_at: None,
            ttl,
        }
    }
}

/// Uniform result of a tool call. Failures never escape as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStatus>,
}

impl CallResult {
    #[must_use]
    pub fn success(content: Value, cache: Option<CacheStatus>) -> Self {
        Self {
            status: true,
            error: None,
            hint: None,
            content: Some(content),
            cache,
        }
    }

    #[must_use]
    pub fn failure(err: &CoreError) -> Self {
        Self {
            status: false,
            error: Some(err.to_string()),
            hint: err.hint().map(str::to_string),
            content: None,
            cache: None,
        }
    }
}

impl From<CoreError> for CallResult {
    fn from(err: CoreError) -> Self {
        Self::failure(&err)
    }
}

impl FlowControlPlane {
    /// Calls a tool by canonical name, or by explicit `source/file::route`
    /// reference, and reports the outcome as a `CallResult`.
    pub async fn call_tool(&self, name: &str, args: Map<String, Value>, options: &CallOptions) -> CallResult {
        match self.try_call_tool(name, args, options).await {
            Ok(result) => result,
            Err(err) => {
                debug!("call {name} failed: {err}");
                CallResult::failure(&err)
            }
        }
    }

    async fn try_call_tool(
        &self,
        name: &str,
        args: Map<String, Value>,
        options: &CallOptions,
    ) -> Result<CallResult, CoreError> {
        let global = self.config.load_global().await?;
        let tool = self.resolve_tool(name, options.group.as_deref()).await?;
        self.execute(&global.config, &tool, args, options).await
    }

    /// Runs a resolved tool through schema load, handlers, cache and runtime.
    pub(crate) async fn execute(
        &self,
        global: &GlobalConfig,
        tool: &ToolDescriptor,
        args: Map<String, Value>,
        options: &CallOptions,
    ) -> Result<CallResult, CoreError> {
        let module = self.catalog.load_schema(&tool.source, &tool.file).await?;
        let definition = &module.definition;
        let route = definition.routes.get(&tool.route).cloned().ok_or_else(|| {
            CoreError::NotFound(format!("Route \"{}\" not found in {}/{}", tool.route, tool.source, tool.file))
        })?;

        let environment = self.config.load_env(global).await;
        if let Some(err) = env_missing(definition, &environment) {
            return Err(err);
        }

        let handlers = self
            .handlers
            .resolve(&module, &self.paths.source_dir(&tool.source))
            .await;

        let ttl = route.preload_ttl();
        let mode = options.cache_mode();
        let key = ttl
            .filter(|_| mode != CacheMode::Bypass)
            .map(|_| self.cache.key_for(&tool.source, &definition.namespace, &tool.route, &args));

        if let Some(key) = key.as_ref().filter(|_| mode.reads())
            && let Some(entry) = self.cache.lookup(key, Utc::now()).await
        {
            let status = CacheStatus::from_entry(&entry, true);
            return Ok(CallResult::success(entry.data, Some(status)));
        }

        let mut parameters = args;
        for param in &tool.parameters {
            if let Some(default) = &param.default {
                parameters
                    .entry(param.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
        let mut call = PreparedCall {
            source: tool.source.clone(),
            namespace: definition.namespace.clone(),
            route_name: tool.route.clone(),
            route,
            root: definition.root.clone(),
            headers: definition.headers.clone(),
            parameters,
            environment,
        };
        handlers.apply_before(&tool.route, &mut call);

        let payload = self.runtime.invoke(&call).await.map_err(|error| {
            let hint = (!definition.required_server_params.is_empty()).then(|| {
                format!(
                    "Check the API keys for {} ({}) in the env file configured as envPath.",
                    definition.namespace,
                    definition.required_server_params.join(", ")
                )
            });
            CoreError::Runtime { error, hint }
        })?;
        let data = handlers.apply_after(&tool.route, payload);

        let cache = match (key, ttl) {
            (Some(key), Some(ttl)) => {
                let status = match self.cache.store(&key, data.clone(), ttl, Utc::now()).await {
                    Ok(entry) => CacheStatus::from_entry(&entry, false),
                    Err(err) => {
                        warn!("{err}");
                        CacheStatus::not_stored(ttl)
                    }
                };
                Some(status)
            }
            _ => None,
        };

        info!("called {} ({})", tool.name, tool.reference);
        Ok(CallResult::success(data, cache))
    }
}

/// `EnvMissing` naming every required server param that is absent or empty.
pub(crate) fn env_missing(
    definition: &SchemaDefinition,
    environment: &BTreeMap<String, String>,
) -> Option<CoreError> {
    let missing: Vec<String> = definition
        .required_server_params
        .iter()
        .filter(|param| environment.get(param.as_str()).is_none_or(|value| value.trim().is_empty()))
        .cloned()
        .collect();
    (!missing.is_empty()).then(|| CoreError::EnvMissing {
        namespace: definition.namespace.clone(),
        missing,
    })
}
