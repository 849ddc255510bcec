use clap::{Parser, Subcommand, builder::BoolishValueParser};
use flowmcp_core::FlowPaths;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug)]
#[command(name = "flowmcp", version, about = "Resolve, call, cache and serve FlowMCP schema tools.")]
pub struct CliArgs {
    /// Per-user root holding config.json, schemas/ and cache/.
    #[arg(long, env = "FLOWMCP_HOME", global = true)]
    home: Option<PathBuf>,

    /// Project directory whose .flowmcp/config.json defines the groups.
    #[arg(long, env = "FLOWMCP_CWD", global = true)]
    cwd: Option<PathBuf>,

    /// Log handler diagnostics.
    #[arg(
        long,
        env = "FLOWMCP_DEBUG",
        global = true,
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    debug: bool,

    #[arg(
        long,
        env = "FLOWMCP_HTTP_TIMEOUT_SECS",
        global = true,
        default_value_t = DEFAULT_HTTP_TIMEOUT_SECS
    )]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Configuration health, schema sources and the active group.
    Status,
    /// List the tools of a group, or every route on disk.
    List {
        #[arg(long)]
        group: Option<String>,
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// Call a tool by canonical name or by `source/file::route` reference.
    Call {
        name: String,
        /// Arguments as a JSON object.
        #[arg(default_value = "{}")]
        args: String,
        #[arg(long)]
        group: Option<String>,
        #[arg(long, default_value_t = false)]
        no_cache: bool,
        #[arg(long, default_value_t = false)]
        refresh: bool,
    },
    /// Validate a schema file, directory, source or group.
    Validate { target: Option<String> },
    /// Run the test cases embedded in route definitions against the live API.
    Test {
        /// Group name or tool reference.
        scope: Option<String>,
        #[arg(long)]
        namespace: Option<String>,
        #[arg(long)]
        route: Option<String>,
    },
    /// Manage tool groups of the project.
    #[command(subcommand)]
    Group(GroupCommand),
    /// Serve the group's tools as an MCP server over stdio.
    Run {
        #[arg(long)]
        group: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum GroupCommand {
    List,
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        tools: Vec<String>,
    },
    Add {
        name: String,
        #[arg(required = true)]
        tools: Vec<String>,
    },
    Remove {
        name: String,
        #[arg(required = true)]
        tools: Vec<String>,
    },
    Delete {
        name: String,
    },
    SetDefault {
        name: String,
    },
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub paths: FlowPaths,
    pub debug: bool,
    pub http_timeout: Duration,
    pub command: Command,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl FlowConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }
}

impl TryFrom<CliArgs> for FlowConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let cwd = match args.cwd.filter(|path| !path.as_os_str().is_empty()) {
            Some(cwd) => cwd,
            None => std::env::current_dir().map_err(|err| ConfigError::InvalidSetting {
                name: "FLOWMCP_CWD",
                value: err.to_string(),
            })?,
        };

        let paths = match args.home.filter(|path| !path.as_os_str().is_empty()) {
            Some(home) => FlowPaths::new(home, cwd),
            None => FlowPaths::from_user_home(cwd).ok_or(ConfigError::MissingSetting("FLOWMCP_HOME"))?,
        };

        if args.timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "FLOWMCP_HTTP_TIMEOUT_SECS",
                value: args.timeout_secs.to_string(),
            });
        }

        if let Command::Call { args: raw, .. } = &args.command {
            parse_call_args(raw)?;
        }

        Ok(Self {
            paths,
            debug: args.debug,
            http_timeout: Duration::from_secs(args.timeout_secs),
            command: args.command,
        })
    }
}

/// Parses the JSON arguments of `call`. An empty string means no arguments.
pub fn parse_call_args(raw: &str) -> Result<Map<String, Value>, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ConfigError::InvalidSetting {
            name: "args",
            value: format!("{raw} (expected a JSON object)"),
        }),
    }
}
