use flowmcp_core::{CallOptions, ToolDescriptor};
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::FlowMcp;
use crate::helpers;

/// Parameters for listing the active tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListToolsParams {
    /// Only list tools of this schema namespace.
    pub namespace: Option<String>,
}

/// Parameters for calling an active tool.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CallToolParams {
    /// Canonical tool name, or a `source/file::route` reference.
    pub name: String,
    /// Tool arguments as a JSON object.
    pub arguments: Option<Value>,
    pub no_cache: Option<bool>,
    pub refresh: Option<bool>,
}

/// What an agent needs to call a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTool {
    pub name: String,
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<u64>,
}

impl From<&ToolDescriptor> for ActiveTool {
    fn from(tool: &ToolDescriptor) -> Self {
        Self {
            name: tool.name.clone(),
            reference: tool.reference.clone(),
            description: tool.description.clone(),
            input_schema: tool.input_schema(),
            cache_ttl: tool.cache_ttl,
        }
    }
}

#[tool_router(router = tool_router_active, vis = "pub")]
impl FlowMcp {
    #[tool(
        name = "list_tools",
        description = "List the tools of the active group with their input schemas."
    )]
    async fn list_active_tools(
        &self,
        Parameters(params): Parameters<ListToolsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let namespace = params
            .namespace
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let tools = self
            .control
            .resolve_active_tools(self.group.as_deref())
            .await
            .map_err(helpers::map_err)?;
        let tools: Vec<ActiveTool> = tools
            .iter()
            .filter(|tool| namespace.is_none_or(|namespace| namespace == tool.namespace))
            .map(ActiveTool::from)
            .collect();
        Ok(CallToolResult::success(vec![Content::json(tools)?]))
    }

    #[tool(
        name = "call_tool",
        description = "Call an active tool by name with a JSON arguments object. Preload routes are served from the cache unless no_cache or refresh is set."
    )]
    async fn call_active_tool(
        &self,
        Parameters(params): Parameters<CallToolParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let args = helpers::arguments(params.arguments)?;
        let mut options = CallOptions::default()
            .with_no_cache(params.no_cache.unwrap_or(false))
            .with_refresh(params.refresh.unwrap_or(false));
        if let Some(group) = &self.group {
            options = options.with_group(group.clone());
        }

        let result = self.control.call_tool(params.name.trim(), args, &options).await;
        let content = vec![Content::json(&result)?];
        if result.status {
            Ok(CallToolResult::success(content))
        } else {
            Ok(CallToolResult::error(content))
        }
    }
}
