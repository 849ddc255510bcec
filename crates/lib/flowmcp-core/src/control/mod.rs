use std::{error::Error, fmt, sync::Arc};

use crate::cache::CacheEngine;
use crate::catalog::{CatalogError, JsonSchemaLoader, SchemaCatalog, SchemaLoader};
use crate::config::{ConfigError, ConfigStore};
use crate::handlers::{HandlerRegistry, HandlerResolver, LibraryRegistry};
use crate::paths::FlowPaths;
use crate::reference::ReferenceError;
use crate::runtime::{RuntimeError, SchemaRuntime};

pub mod call;
pub mod groups;
pub mod live;
pub mod status;
pub mod tools;
pub mod validate;

pub use call::{CacheStatus, CallOptions, CallResult};
pub use groups::GroupSummary;
pub use live::{LiveTestCase, LiveTestFilters, LiveTestReport};
pub use status::{SourceStatus, StatusReport};
pub use tools::ToolDescriptor;
pub use validate::{SchemaValidation, ValidationReport};

#[derive(Debug)]
pub enum CoreError {
    NotInitialized(ConfigError),
    NotFound(String),
    EnvMissing {
        namespace: String,
        missing: Vec<String>,
    },
    Runtime {
        error: RuntimeError,
        hint: Option<String>,
    },
    Config(ConfigError),
    Catalog(CatalogError),
    InvalidInput(String),
}

impl CoreError {
    /// Remediation hint attached to runtime failures, if any.
    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Runtime { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized(err) | Self::Config(err) => write!(f, "{err}"),
            Self::NotFound(message) | Self::InvalidInput(message) => f.write_str(message),
            Self::EnvMissing { namespace, missing } => {
                write!(f, "Missing env vars for {namespace}: {}", missing.join(", "))
            }
            Self::Runtime { error, .. } => write!(f, "{error}"),
            Self::Catalog(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotInitialized(err) | Self::Config(err) => Some(err),
            Self::Runtime { error, .. } => Some(error),
            Self::Catalog(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotInitialized(_) => Self::NotInitialized(err),
            other => Self::Config(other),
        }
    }
}

impl From<CatalogError> for CoreError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::SourceNotFound(_) | CatalogError::SchemaNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            other => Self::Catalog(other),
        }
    }
}

impl From<ReferenceError> for CoreError {
    fn from(err: ReferenceError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Entry point for every operation the CLI and the MCP adapter expose.
///
/// The control plane holds no state beyond its collaborators: configuration,
/// schemas and cache entries are re-read from disk by every operation.
#[derive(Clone)]
pub struct FlowControlPlane {
    paths: FlowPaths,
    config: ConfigStore,
    catalog: SchemaCatalog,
    handlers: HandlerResolver,
    cache: CacheEngine,
    runtime: Arc<dyn SchemaRuntime>,
}

impl fmt::Debug for FlowControlPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowControlPlane")
            .field("paths", &self.paths)
            .field("catalog", &self.catalog)
            .field("handlers", &self.handlers)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl FlowControlPlane {
    #[must_use]
    pub fn new(paths: FlowPaths, runtime: Arc<dyn SchemaRuntime>) -> Self {
        let loader: Arc<dyn SchemaLoader> = Arc::new(JsonSchemaLoader::default());
        Self {
            config: ConfigStore::new(paths.clone()),
            catalog: SchemaCatalog::new(paths.clone(), loader),
            handlers: HandlerResolver::default(),
            cache: CacheEngine::new(paths.cache_root()),
            runtime,
            paths,
        }
    }

    /// Replaces the schema loader.
    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn SchemaLoader>) -> Self {
        self.catalog = SchemaCatalog::new(self.paths.clone(), loader);
        self
    }

    /// Uses the JSON loader with the given handler factories attached.
    #[must_use]
    pub fn with_handlers(self, handlers: HandlerRegistry) -> Self {
        self.with_loader(Arc::new(JsonSchemaLoader::new(handlers)))
    }

    #[must_use]
    pub fn with_libraries(mut self, libraries: LibraryRegistry) -> Self {
        self.handlers = self.handlers.with_libraries(libraries);
        self
    }

    /// Enables handler diagnostics.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.handlers = self.handlers.with_debug(debug);
        self
    }

    #[must_use]
    pub const fn paths(&self) -> &FlowPaths {
        &self.paths
    }

    #[must_use]
    pub const fn config(&self) -> &ConfigStore {
        &self.config
    }

    #[must_use]
    pub const fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn cache(&self) -> &CacheEngine {
        &self.cache
    }
}
