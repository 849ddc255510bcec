use std::collections::HashMap;

use flowmcp_store::schema::RESERVED_PREFIX;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::call::env_missing;
use super::{CallOptions, CallResult, CoreError, FlowControlPlane, ToolDescriptor};

/// Narrows a live test run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTestFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Route name or canonical tool name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
}

impl LiveTestFilters {
    fn matches(&self, tool: &ToolDescriptor) -> bool {
        let namespace_ok = self
            .namespace
            .as_deref()
            .is_none_or(|namespace| namespace == tool.namespace);
        let route_ok = self
            .route
            .as_deref()
            .is_none_or(|route| route == tool.route || route == tool.name);
        namespace_ok && route_ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTestCase {
    pub tool: String,
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTestReport {
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub cases: Vec<LiveTestCase>,
}

impl LiveTestReport {
    fn failure(err: &CoreError) -> Self {
        Self {
            status: false,
            error: Some(err.to_string()),
            ..Self::default()
        }
    }

    fn from_cases(cases: Vec<LiveTestCase>) -> Self {
        let passed = cases.iter().filter(|case| case.status).count();
        let failed = cases.len() - passed;
        Self {
            status: failed == 0,
            error: None,
            total: cases.len(),
            passed,
            failed,
            cases,
        }
    }
}

/// Splits a test case into its description and its call parameters. Keys
/// starting with `_` are metadata.
#[must_use]
pub fn split_test_case(case: &Map<String, Value>) -> (Option<String>, Map<String, Value>) {
    let description = case
        .get("_description")
        .and_then(Value::as_str)
        .map(str::to_string);
    let params = case
        .iter()
        .filter(|(key, _)| !key.starts_with(RESERVED_PREFIX))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    (description, params)
}

impl FlowControlPlane {
    /// Runs the test cases embedded in route definitions against the live
    /// runtime, bypassing the cache. `scope` is a group name or a tool
    /// reference; without it the default group is used.
    pub async fn run_live_tests(&self, scope: Option<&str>, filters: &LiveTestFilters) -> LiveTestReport {
        match self.try_run_live_tests(scope, filters).await {
            Ok(report) => report,
            Err(err) => {
                debug!("live tests failed: {err}");
                LiveTestReport::failure(&err)
            }
        }
    }

    async fn try_run_live_tests(
        &self,
        scope: Option<&str>,
        filters: &LiveTestFilters,
    ) -> Result<LiveTestReport, CoreError> {
        let global = self.config.load_global().await?;
        let tools = match scope.map(str::trim).filter(|scope| !scope.is_empty()) {
            Some(reference) if reference.contains('/') => {
                let tools = self.resolve_references(&[reference.to_string()]).await;
                if tools.is_empty() {
                    return Err(CoreError::NotFound(format!(
                        "Reference \"{reference}\" does not resolve to any route"
                    )));
                }
                tools
            }
            group => self.active_selection(group).await?.tools,
        };

        let scoped: Vec<&ToolDescriptor> = tools.iter().filter(|tool| filters.matches(tool)).collect();
        let environment = self.config.load_env(&global.config).await;
        let mut blocked: HashMap<(&str, &str), String> = HashMap::new();
        let mut env_errors = Vec::new();
        for tool in scoped.iter().copied() {
            let key = (tool.source.as_str(), tool.file.as_str());
            if blocked.contains_key(&key) {
                continue;
            }
            let Ok(module) = self.catalog.load_schema(&tool.source, &tool.file).await else {
                continue;
            };
            if let Some(err) = env_missing(&module.definition, &environment) {
                warn!("skipping live tests of {}/{}: {err}", tool.source, tool.file);
                env_errors.push(err.to_string());
                blocked.insert(key, err.to_string());
            }
        }

        let options = CallOptions::default().with_no_cache(true);
        let mut cases = Vec::new();
        for tool in scoped {
            if let Some(error) = blocked.get(&(tool.source.as_str(), tool.file.as_str())) {
                cases.push(LiveTestCase {
                    tool: tool.name.clone(),
                    reference: tool.reference.clone(),
                    description: None,
                    status: false,
                    error: Some(error.clone()),
                });
                continue;
            }
            let module = match self.catalog.load_schema(&tool.source, &tool.file).await {
                Ok(module) => module,
                Err(err) => {
                    cases.push(LiveTestCase {
                        tool: tool.name.clone(),
                        reference: tool.reference.clone(),
                        description: None,
                        status: false,
                        error: Some(err.to_string()),
                    });
                    continue;
                }
            };
            let Some(route) = module.definition.routes.get(&tool.route) else {
                continue;
            };

            for case in &route.tests {
                let (description, params) = split_test_case(case);
                let result = match self.execute(&global.config, tool, params, &options).await {
                    Ok(result) => result,
                    Err(err) => CallResult::failure(&err),
                };
                info!(
                    "test {} {}: {}",
                    tool.name,
                    description.as_deref().unwrap_or_default(),
                    if result.status { "passed" } else { "failed" }
                );
                cases.push(LiveTestCase {
                    tool: tool.name.clone(),
                    reference: tool.reference.clone(),
                    description,
                    status: result.status,
                    error: result.error,
                });
            }
        }

        let mut report = LiveTestReport::from_cases(cases);
        if !env_errors.is_empty() {
            report.status = false;
            report.error = Some(env_errors.join("; "));
        }
        Ok(report)
    }
}
