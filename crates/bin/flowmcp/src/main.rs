//! Command line entry point for flowmcp.
//!
//! Loads configuration from arguments and the environment, builds the control
//! plane over the HTTP schema runtime, and prints each command's result as JSON
//! on stdout. Logs go to stderr so `run` can use stdout for the MCP transport.

mod commands;
mod config;
mod http;

use std::process::ExitCode;
use std::sync::Arc;

use flowmcp_core::FlowControlPlane;
use tracing_subscriber::EnvFilter;

use crate::commands::Outcome;
use crate::config::FlowConfig;
use crate::http::HttpRuntime;

const DEFAULT_LOG_FILTER: &str = "flowmcp=info,flowmcp_core=info,flowmcp_mcp=info";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();
    let config = FlowConfig::from_args()?;
    let runtime = HttpRuntime::new(config.http_timeout)?;
    let control = FlowControlPlane::new(config.paths, Arc::new(runtime)).with_debug(config.debug);

    match commands::execute(control, config.command).await? {
        Outcome::Report { ok, body } => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Outcome::Served => Ok(ExitCode::SUCCESS),
    }
}
