//! The seam between the core and whatever performs the outbound request.

use std::collections::BTreeMap;
use std::{error::Error, fmt};

use async_trait::async_trait;
use flowmcp_store::Route;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Fully resolved call handed to the schema runtime.
///
/// `before` hooks receive this value mutably and may rewrite parameters or
/// headers before the runtime sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    pub source: String,
    pub namespace: String,
    pub route_name: String,
    pub route: Route,
    pub root: Option<String>,
    pub headers: IndexMap<String, String>,
    pub parameters: Map<String, Value>,
    pub environment: BTreeMap<String, String>,
}

/// Structured failure reported by the schema runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub http_status: Option<u16>,
    pub message: String,
}

impl RuntimeError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            http_status: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_status(http_status: u16, message: impl Into<String>) -> Self {
        Self {
            http_status: Some(http_status),
            message: message.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.http_status {
            Some(status) => write!(f, "HTTP {status}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for RuntimeError {}

/// Executes a prepared call against the API a schema describes.
#[async_trait]
pub trait SchemaRuntime: Send + Sync {
    /// Performs the request and returns its payload.
    ///
    /// # Errors
    /// Returns `RuntimeError` when the request fails or the API answers with an
    /// error status.
    async fn invoke(&self, call: &PreparedCall) -> Result<Value, RuntimeError>;
}
