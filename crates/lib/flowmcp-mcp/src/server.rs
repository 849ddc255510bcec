//! MCP server runners for flowmcp.

use std::sync::Arc;

use flowmcp_core::FlowControlPlane;
use rmcp::serve_server;
use rmcp::transport::io::stdio;
use tracing::info;

use crate::FlowMcp;

/// Serves the tools of `group` (or the default group) over stdio.
///
/// # Errors
/// Returns any transport or server error.
pub async fn serve_stdio(
    control: Arc<FlowControlPlane>,
    group: Option<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!(
        "serving group {} over stdio",
        group.as_deref().unwrap_or("(default)")
    );
    let service = FlowMcp::with_control(control).with_group(group);
    let (stdin, stdout) = stdio();
    let running = serve_server(service, (stdin, stdout)).await?;
    let _ = running.waiting().await?;
    Ok(())
}
