use std::collections::HashMap;

use flowmcp_store::{LocalConfig, Route, schema::make_tool_ref};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{CoreError, FlowControlPlane};
use crate::catalog::SchemaModule;
use crate::config::ConfigError;
use crate::params::{ParamDescriptor, extract_parameters, to_input_schema};
use crate::reference::{ToolRef, find_first_match, to_canonical_name};

/// A route resolved into a callable tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Canonical name, e.g. `get_status_callapi`.
    pub name: String,
    /// Reference naming exactly this route.
    pub reference: String,
    pub source: String,
    pub file: String,
    pub namespace: String,
    pub route: String,
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Vec<ParamDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_server_params: Vec<String>,
    /// Cache TTL in seconds for preload routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<u64>,
}

impl ToolDescriptor {
    #[must_use]
    pub fn from_route(source: &str, file: &str, module: &SchemaModule, route_name: &str, route: &Route) -> Self {
        let definition = &module.definition;
        Self {
            name: to_canonical_name(route_name, &definition.namespace),
            reference: make_tool_ref(source, file, Some(route_name)),
            source: source.to_string(),
            file: file.to_string(),
            namespace: definition.namespace.clone(),
            route: route_name.to_string(),
            method: route.method.clone(),
            path: route.path.clone(),
            description: route.description.clone(),
            parameters: extract_parameters(route),
            required_server_params: definition.required_server_params.clone(),
            cache_ttl: route.preload_ttl(),
        }
    }

    /// JSON Schema describing the tool's parameters.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        to_input_schema(&self.parameters)
    }

    #[must_use]
    pub fn tool_ref(&self) -> ToolRef {
        ToolRef::new(&self.source, &self.file, Some(self.route.clone()))
    }
}

/// The group a command operates on, with its resolved tools.
#[derive(Debug, Clone, Default)]
pub(crate) struct ActiveSelection {
    pub group: Option<String>,
    pub tools: Vec<ToolDescriptor>,
}

pub(crate) fn tool_key(tool: &ToolDescriptor) -> (&str, &str) {
    (tool.route.as_str(), tool.namespace.as_str())
}

impl FlowControlPlane {
    /// Resolves the tools of `group` (or of the default group) in group order.
    /// References that fail to parse or load are skipped with a warning.
    ///
    /// # Errors
    /// Returns `CoreError::NotInitialized` without a global config and
    /// `CoreError::NotFound` when the named or default group does not exist.
    pub async fn resolve_active_tools(&self, group: Option<&str>) -> Result<Vec<ToolDescriptor>, CoreError> {
        self.config.load_global().await?;
        Ok(self.active_selection(group).await?.tools)
    }

    /// Every route of every source on disk.
    pub async fn list_available_tools(&self) -> Vec<ToolDescriptor> {
        let mut tools = Vec::new();
        for source in self.catalog.list_sources().await {
            let files = match self.catalog.schema_files(&source).await {
                Ok(files) => files,
                Err(err) => {
                    warn!("skipping source {source}: {err}");
                    continue;
                }
            };
            for entry in files {
                match self.catalog.load_path(&entry.path).await {
                    Ok(module) => {
                        tools.extend(describe_module(&entry.source, &entry.file, &module));
                    }
                    Err(err) => debug!("skipping {}: {err}", entry.path.display()),
                }
            }
        }
        tools
    }

    pub(crate) async fn active_selection(&self, group: Option<&str>) -> Result<ActiveSelection, CoreError> {
        let local = match self.config.load_local().await {
            Ok(local) => local,
            Err(err @ ConfigError::Unreadable { .. }) => {
                warn!("ignoring project config: {err}");
                None
            }
            Err(err) => return Err(err.into()),
        };
        let Some(local) = local else {
            if let Some(name) = group {
                return Err(CoreError::NotFound(format!(
                    "Group \"{name}\" not found: no project config at {}",
                    self.paths.local_config().display()
                )));
            }
            return Ok(ActiveSelection::default());
        };

        let Some(name) = select_group(&local.config, group)? else {
            return Ok(ActiveSelection::default());
        };
        let references = local
            .config
            .groups
            .get(&name)
            .map(|group| group.tools.clone())
            .unwrap_or_default();

        let tools = self.resolve_references(&references).await;
        Ok(ActiveSelection {
            group: Some(name),
            tools,
        })
    }

    /// Expands references into tool descriptors, keeping list order.
    pub(crate) async fn resolve_references(&self, references: &[String]) -> Vec<ToolDescriptor> {
        let mut modules: HashMap<(String, String), Option<SchemaModule>> = HashMap::new();
        let mut tools = Vec::new();

        for raw in references {
            let reference = match ToolRef::parse(raw) {
                Ok(reference) => reference,
                Err(err) => {
                    warn!("skipping tool reference {raw:?}: {err}");
                    continue;
                }
            };

            let key = (reference.source.clone(), reference.file.clone());
            if !modules.contains_key(&key) {
                let loaded = match self.catalog.load_schema(&reference.source, &reference.file).await {
                    Ok(module) => Some(module),
                    Err(err) => {
                        warn!("skipping tool reference {raw}: {err}");
                        None
                    }
                };
                modules.insert(key.clone(), loaded);
            }
            let Some(Some(module)) = modules.get(&key) else {
                continue;
            };

            match reference.route.as_deref() {
                Some(route_name) => match module.definition.routes.get(route_name) {
                    Some(route) => tools.push(ToolDescriptor::from_route(
                        &reference.source,
                        &reference.file,
                        module,
                        route_name,
                        route,
                    )),
                    None => warn!("skipping tool reference {raw}: route \"{route_name}\" not found"),
                },
                None => tools.extend(describe_module(&reference.source, &reference.file, module)),
            }
        }

        tools
    }

    /// Resolves a tool name (or an explicit reference) for a call.
    pub(crate) async fn resolve_tool(&self, name: &str, group: Option<&str>) -> Result<ToolDescriptor, CoreError> {
        let name = name.trim();
        if name.contains('/') {
            return self.resolve_explicit(name).await;
        }

        let selection = self.active_selection(group).await?;
        if selection.tools.is_empty() {
            let scope = selection
                .group
                .map_or_else(|| "no group selected".to_string(), |group| format!("group \"{group}\" is empty"));
            return Err(CoreError::NotFound(format!(
                "No active tools ({scope}). Add tools to a group or pass --group."
            )));
        }

        if let Some(tool) = find_first_match(&selection.tools, name, tool_key) {
            return Ok(tool.clone());
        }

        let group = selection.group.unwrap_or_default();
        let available = self.list_available_tools().await;
        let message = match find_first_match(&available, name, tool_key) {
            Some(tool) => format!(
                "Tool \"{name}\" not recognized in group \"{group}\". It is available as \"{}\"; add it to the group to use it.",
                tool.reference
            ),
            None => format!("Tool \"{name}\" not recognized in group \"{group}\"."),
        };
        Err(CoreError::NotFound(message))
    }

    async fn resolve_explicit(&self, raw: &str) -> Result<ToolDescriptor, CoreError> {
        let reference = ToolRef::parse(raw)?;
        let module = self.catalog.load_schema(&reference.source, &reference.file).await?;
        let routes = &module.definition.routes;

        let route_name = match reference.route.as_deref() {
            Some(route) => route.to_string(),
            None if routes.len() == 1 => routes.keys().next().cloned().unwrap_or_default(),
            None => {
                return Err(CoreError::InvalidInput(format!(
                    "Reference \"{raw}\" names a schema with {} routes; append ::route to pick one",
                    routes.len()
                )));
            }
        };
        let route = routes.get(&route_name).ok_or_else(|| {
            CoreError::NotFound(format!("Route \"{route_name}\" not found in {}", reference.file_ref()))
        })?;
        Ok(ToolDescriptor::from_route(
            &reference.source,
            &reference.file,
            &module,
            &route_name,
            route,
        ))
    }
}

/// Picks the explicit group, falling back to the default group.
fn select_group(config: &LocalConfig, group: Option<&str>) -> Result<Option<String>, CoreError> {
    if let Some(name) = group {
        return if config.groups.contains_key(name) {
            Ok(Some(name.to_string()))
        } else {
            Err(CoreError::NotFound(format!("Group \"{name}\" not found")))
        };
    }
    match config.default_group.as_deref() {
        Some(name) if config.groups.contains_key(name) => Ok(Some(name.to_string())),
        Some(name) => Err(CoreError::NotFound(format!(
            "Default group \"{name}\" not found in groups"
        ))),
        None => Ok(None),
    }
}

fn describe_module(source: &str, file: &str, module: &SchemaModule) -> Vec<ToolDescriptor> {
    module
        .definition
        .routes
        .iter()
        .map(|(route_name, route)| ToolDescriptor::from_route(source, file, module, route_name, route))
        .collect()
}
