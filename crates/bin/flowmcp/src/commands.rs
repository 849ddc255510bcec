//! Dispatches a parsed command to the control plane and shapes its JSON output.

use std::sync::Arc;

use flowmcp_core::{CallOptions, CoreError, FlowControlPlane, LiveTestFilters};
use serde::Serialize;
use serde_json::{Value, json};

use crate::config::{Command, GroupCommand, parse_call_args};

/// What a finished command prints, and whether it succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Report { ok: bool, body: Value },
    Served,
}

impl Outcome {
    fn report<T: Serialize>(ok: bool, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::Report {
            ok,
            body: serde_json::to_value(body)?,
        })
    }

    fn failure(err: &CoreError) -> Self {
        Self::Report {
            ok: false,
            body: json!({ "status": false, "error": err.to_string() }),
        }
    }

    fn from_result<T: Serialize>(result: Result<T, CoreError>) -> Result<Self, serde_json::Error> {
        match result {
            Ok(value) => Self::report(true, &value),
            Err(err) => Ok(Self::failure(&err)),
        }
    }
}

/// # Errors
/// Returns serialization failures, invalid `call` arguments, and errors of the
/// MCP transport for `run`.
pub async fn execute(
    control: FlowControlPlane,
    command: Command,
) -> Result<Outcome, Box<dyn std::error::Error + Send + Sync>> {
    let outcome = match command {
        Command::Status => {
            let report = control.status().await;
            Outcome::report(report.status, &report)?
        }
        Command::List { all: true, .. } => {
            let tools = control.list_available_tools().await;
            Outcome::report(true, &json!({ "status": true, "tools": tools }))?
        }
        Command::List { group, all: false } => {
            match control.resolve_active_tools(group.as_deref()).await {
                Ok(tools) => Outcome::report(true, &json!({ "status": true, "tools": tools }))?,
                Err(err) => Outcome::failure(&err),
            }
        }
        Command::Call {
            name,
            args,
            group,
            no_cache,
            refresh,
        } => {
            let args = parse_call_args(&args)?;
            let mut options = CallOptions::default()
                .with_no_cache(no_cache)
                .with_refresh(refresh);
            if let Some(group) = group {
                options = options.with_group(group);
            }
            let result = control.call_tool(&name, args, &options).await;
            Outcome::report(result.status, &result)?
        }
        Command::Validate { target } => {
            let report = control.validate_schemas(target.as_deref()).await;
            Outcome::report(report.status, &report)?
        }
        Command::Test {
            scope,
            namespace,
            route,
        } => {
            let filters = LiveTestFilters { namespace, route };
            let report = control.run_live_tests(scope.as_deref(), &filters).await;
            Outcome::report(report.status, &report)?
        }
        Command::Group(command) => execute_group(&control, command).await?,
        Command::Run { group } => {
            flowmcp_mcp::server::serve_stdio(Arc::new(control), group).await?;
            Outcome::Served
        }
    };
    Ok(outcome)
}

async fn execute_group(
    control: &FlowControlPlane,
    command: GroupCommand,
) -> Result<Outcome, serde_json::Error> {
    match command {
        GroupCommand::List => Outcome::from_result(control.list_groups().await),
        GroupCommand::Create {
            name,
            description,
            tools,
        } => Outcome::from_result(control.create_group(&name, &description, &tools).await),
        GroupCommand::Add { name, tools } => Outcome::from_result(control.add_tools(&name, &tools).await),
        GroupCommand::Remove { name, tools } => {
            Outcome::from_result(control.remove_tools(&name, &tools).await)
        }
        GroupCommand::Delete { name } => Outcome::from_result(
            control
                .delete_group(&name)
                .await
                .map(|()| json!({ "status": true, "deleted": name })),
        ),
        GroupCommand::SetDefault { name } => {
            Outcome::from_result(control.set_default_group(&name).await)
        }
    }
}
