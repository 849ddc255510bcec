//! Enumeration and loading of schema modules.
//!
//! Nothing is cached: every call re-reads the source directory so that an
//! import or a hand edit is visible to the next command.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::{error::Error, fmt, io};

use async_trait::async_trait;
use flowmcp_store::schema::{REGISTRY_MANIFESTS, SCHEMA_EXTENSION_JSON, is_reserved_name};
use flowmcp_store::{RegistryManifest, SchemaDefinition, SchemaDocument};
use tracing::{debug, warn};

use crate::handlers::{HandlerFactory, HandlerRegistry};
use crate::paths::FlowPaths;

#[derive(Debug)]
pub enum CatalogError {
    SourceNotFound(String),
    SchemaNotFound(PathBuf),
    Io { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, message: String },
    MissingMain(PathBuf),
    InvalidPath(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceNotFound(name) => write!(f, "Source \"{name}\" not found"),
            Self::SchemaNotFound(path) => write!(f, "Schema file not found: {}", path.display()),
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::Parse { path, message } => {
                write!(f, "failed to parse {}: {message}", path.display())
            }
            Self::MissingMain(path) => {
                write!(f, "{} does not export a \"main\" definition", path.display())
            }
            Self::InvalidPath(path) => write!(f, "invalid schema path \"{path}\""),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A loaded schema file: its definition plus the optional handler factory
/// registered for its namespace.
#[derive(Clone)]
pub struct SchemaModule {
    pub path: PathBuf,
    pub definition: SchemaDefinition,
    pub handlers: Option<Arc<dyn HandlerFactory>>,
}

impl fmt::Debug for SchemaModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaModule")
            .field("path", &self.path)
            .field("namespace", &self.definition.namespace)
            .field("handlers", &self.handlers.is_some())
            .finish_non_exhaustive()
    }
}

/// Turns a schema file on disk into a [`SchemaModule`].
#[async_trait]
pub trait SchemaLoader: Send + Sync {
    /// File extension (without the dot) this loader understands.
    fn extension(&self) -> &str;

    /// # Errors
    /// Returns `CatalogError` when the file is missing, unreadable, malformed
    /// or lacks a `main` definition.
    async fn load(&self, path: &Path) -> Result<SchemaModule, CatalogError>;
}

/// Loads JSON schema modules and attaches registered handler factories.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaLoader {
    handlers: HandlerRegistry,
}

impl JsonSchemaLoader {
    #[must_use]
    pub const fn new(handlers: HandlerRegistry) -> Self {
        Self { handlers }
    }
}

#[async_trait]
impl SchemaLoader for JsonSchemaLoader {
    fn extension(&self) -> &str {
        SCHEMA_EXTENSION_JSON
    }

    async fn load(&self, path: &Path) -> Result<SchemaModule, CatalogError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                CatalogError::SchemaNotFound(path.to_path_buf())
            } else {
                CatalogError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let document: SchemaDocument =
            serde_json::from_str(&raw).map_err(|err| CatalogError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        let definition = document
            .main
            .ok_or_else(|| CatalogError::MissingMain(path.to_path_buf()))?;
        let handlers = self.handlers.get(&definition.namespace);

        Ok(SchemaModule {
            path: path.to_path_buf(),
            definition,
            handlers,
        })
    }
}

/// A schema file belonging to a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFileEntry {
    pub source: String,
    /// Path relative to the source directory, `/`-separated.
    pub file: String,
    pub path: PathBuf,
}

#[derive(Clone)]
pub struct SchemaCatalog {
    paths: FlowPaths,
    loader: Arc<dyn SchemaLoader>,
}

impl fmt::Debug for SchemaCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCatalog")
            .field("sources_dir", &self.paths.sources_dir())
            .field("extension", &self.loader.extension())
            .finish()
    }
}

impl SchemaCatalog {
    #[must_use]
    pub fn new(paths: FlowPaths, loader: Arc<dyn SchemaLoader>) -> Self {
        Self { paths, loader }
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        self.loader.extension()
    }

    /// Source directories present on disk, sorted by name.
    pub async fn list_sources(&self) -> Vec<String> {
        let dir = self.paths.sources_dir();
        let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
            return Vec::new();
        };
        let mut sources = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().await.is_ok_and(|kind| kind.is_dir());
            if is_dir && !is_reserved_name(&name) {
                sources.push(name);
            }
        }
        sources.sort();
        sources
    }

    /// Schema files of a source. A registry manifest, when present and
    /// readable, is authoritative; otherwise the directory is scanned.
    ///
    /// # Errors
    /// Returns `CatalogError::SourceNotFound` if the source directory does not
    /// exist, or an I/O error if it cannot be scanned.
    pub async fn schema_files(&self, source: &str) -> Result<Vec<SchemaFileEntry>, CatalogError> {
        let dir = self.source_dir(source).await?;

        if let Some(manifest) = read_manifest(&dir).await {
            let mut files = Vec::with_capacity(manifest.schemas.len());
            for entry in manifest.schemas {
                match normalize_relative(&entry.file) {
                    Ok(file) => files.push(SchemaFileEntry {
                        source: source.to_string(),
                        path: dir.join(&file),
                        file,
                    }),
                    Err(err) => warn!("skipping manifest entry in {source}: {err}"),
                }
            }
            return Ok(files);
        }

        let files = scan_directory(&dir, self.loader.extension()).await?;
        Ok(files
            .into_iter()
            .map(|file| SchemaFileEntry {
                source: source.to_string(),
                path: dir.join(&file),
                file,
            })
            .collect())
    }

    /// Loads `file` (relative to the source directory) from `source`.
    ///
    /// # Errors
    /// Returns `CatalogError` if the source or file does not exist, or the
    /// file fails to load.
    pub async fn load_schema(&self, source: &str, file: &str) -> Result<SchemaModule, CatalogError> {
        let dir = self.source_dir(source).await?;
        let file = normalize_relative(file)?;
        self.load_path(&dir.join(file)).await
    }

    /// Loads a schema module from an arbitrary path.
    ///
    /// # Errors
    /// Returns `CatalogError` if the file fails to load.
    pub async fn load_path(&self, path: &Path) -> Result<SchemaModule, CatalogError> {
        debug!("loading schema {}", path.display());
        self.loader.load(path).await
    }

    async fn source_dir(&self, source: &str) -> Result<PathBuf, CatalogError> {
        if source.is_empty() || source.contains(['/', '\\']) || source == ".." || source == "." {
            return Err(CatalogError::SourceNotFound(source.to_string()));
        }
        let dir = self.paths.source_dir(source);
        if tokio::fs::metadata(&dir)
            .await
            .is_ok_and(|metadata| metadata.is_dir())
        {
            Ok(dir)
        } else {
            Err(CatalogError::SourceNotFound(source.to_string()))
        }
    }
}

async fn read_manifest(dir: &Path) -> Option<RegistryManifest> {
    for name in REGISTRY_MANIFESTS {
        let path = dir.join(name);
        let Ok(raw) = tokio::fs::read_to_string(&path).await else {
            continue;
        };
        match serde_json::from_str::<RegistryManifest>(&raw) {
            Ok(manifest) => return Some(manifest),
            Err(err) => warn!("ignoring malformed manifest {}: {err}", path.display()),
        }
    }
    None
}

/// Recursively collects files with `extension` under `root`, skipping any
/// file or directory whose name starts with `_`. Results are `/`-separated
/// relative paths in sorted order.
///
/// # Errors
/// Returns `CatalogError::Io` if a directory cannot be read.
pub async fn scan_directory(root: &Path, extension: &str) -> Result<Vec<String>, CatalogError> {
    let mut pending = vec![PathBuf::new()];
    let mut files = Vec::new();

    while let Some(relative) = pending.pop() {
        let dir = root.join(&relative);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|source| CatalogError::Io {
                path: dir.clone(),
                source,
            })?;
        loop {
            let entry = entries
                .next_entry()
                .await
                .map_err(|source| CatalogError::Io {
                    path: dir.clone(),
                    source,
                })?;
            let Some(entry) = entry else {
                break;
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_reserved_name(&name) {
                continue;
            }
            let is_dir = entry.file_type().await.is_ok_and(|kind| kind.is_dir());
            let child = relative.join(&name);
            if is_dir {
                pending.push(child);
            } else if Path::new(&name)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            {
                files.push(to_slash(&child));
            }
        }
    }

    files.sort();
    Ok(files)
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize_relative(file: &str) -> Result<String, CatalogError> {
    let path = Path::new(file);
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return Err(CatalogError::InvalidPath(file.to_string())),
        }
    }
    if parts.is_empty() {
        return Err(CatalogError::InvalidPath(file.to_string()));
    }
    Ok(parts.join("/"))
}
