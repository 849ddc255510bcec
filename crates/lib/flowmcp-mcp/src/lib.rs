//! MCP server for flowmcp.
//!
//! Serves the tools of one group, fixed at startup, to an agent: listing them
//! with their input schemas and executing them through the core engine, with
//! the same caching and handler behaviour as the CLI.

mod helpers;
mod tools;
pub mod server;

use std::sync::Arc;

use flowmcp_core::FlowControlPlane;
use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};

pub use tools::active::{ActiveTool, CallToolParams, ListToolsParams};

const SERVER_INSTRUCTIONS: &str = r"flowmcp serves the API tools of one tool group.

Workflow:
1. Call `list_tools` to see the active tools. Each entry carries its canonical `name`
   (for example `get_price_coingecko`), its `reference` (`source/file::route`) and an
   `inputSchema` describing the arguments.
2. Call `call_tool` with `name` and an `arguments` object. A full reference may be
   passed as `name` to reach a route outside the group.
3. Preload routes are cached on disk. Pass `no_cache` to skip the cache or `refresh`
   to force a new fetch that replaces the stored entry.

Notes:
- Results are `{status, content}` on success and `{status: false, error, hint?}` on failure.
- A missing API key is reported as `Missing env vars for <namespace>: ...`; it must be
  added to the env file named in the global config.
- `status` returns configuration health, the schema sources on disk, and the active group.";

/// MCP server wrapper around the control plane and its tool routers.
#[derive(Clone)]
pub struct FlowMcp {
    tool_router: ToolRouter<Self>,
    control: Arc<FlowControlPlane>,
    group: Option<String>,
}

impl FlowMcp {
    /// Creates a server for the default group of the project.
    #[must_use]
    pub fn new(control: FlowControlPlane) -> Self {
        Self::with_control(Arc::new(control))
    }

    /// Creates a server using a shared control plane handle.
    #[must_use]
    pub fn with_control(control: Arc<FlowControlPlane>) -> Self {
        let tool_router = Self::tool_router_core() + Self::tool_router_active();
        Self {
            tool_router,
            control,
            group: None,
        }
    }

    /// Serves `group` instead of the project's default group.
    #[must_use]
    pub fn with_group(mut self, group: Option<String>) -> Self {
        self.group = group;
        self
    }

    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    #[must_use]
    pub fn control(&self) -> &FlowControlPlane {
        &self.control
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl FlowMcp {
    #[tool(description = "Configuration health, schema sources on disk, and the active group.")]
    async fn status(&self) -> Result<CallToolResult, ErrorData> {
        let report = self.control.status().await;
        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }
}

#[tool_handler]
impl ServerHandler for FlowMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
