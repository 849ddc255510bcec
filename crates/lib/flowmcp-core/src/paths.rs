use std::path::{Path, PathBuf};

use flowmcp_store::schema::{CACHE_DIR, CONFIG_FILE, FLOWMCP_DIR, SCHEMAS_DIR};

/// Filesystem layout used by every component.
///
/// `home` is the per-user root (normally `~/.flowmcp`) and `cwd` the project
/// directory whose `.flowmcp/config.json` holds the local config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowPaths {
    home: PathBuf,
    cwd: PathBuf,
    cache_root: PathBuf,
}

impl FlowPaths {
    #[must_use]
    pub fn new(home: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let cache_root = home.join(CACHE_DIR);
        Self {
            home,
            cwd: cwd.into(),
            cache_root,
        }
    }

    /// Uses `~/.flowmcp` as the per-user root, if a home directory is known.
    #[must_use]
    pub fn from_user_home(cwd: impl Into<PathBuf>) -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(FLOWMCP_DIR), cwd))
    }

    #[must_use]
    pub fn with_cache_root(mut self, cache_root: impl Into<PathBuf>) -> Self {
        self.cache_root = cache_root.into();
        self
    }

    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    #[must_use]
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    #[must_use]
    pub fn global_config(&self) -> PathBuf {
        self.home.join(CONFIG_FILE)
    }

    #[must_use]
    pub fn local_config(&self) -> PathBuf {
        self.cwd.join(FLOWMCP_DIR).join(CONFIG_FILE)
    }

    #[must_use]
    pub fn sources_dir(&self) -> PathBuf {
        self.home.join(SCHEMAS_DIR)
    }

    #[must_use]
    pub fn source_dir(&self, source: &str) -> PathBuf {
        self.sources_dir().join(source)
    }

    /// Resolves a user-supplied path against the project directory.
    #[must_use]
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.cwd.join(candidate)
        }
    }
}
