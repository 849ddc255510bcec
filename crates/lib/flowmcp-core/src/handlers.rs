//! Optional per-route hooks supplied by a schema's handler factory.
//!
//! Handler code is third-party code. Every call into it (the factory, each
//! `before` and `after` hook) runs behind a catch boundary: an error or panic
//! turns the affected feature off for that call and the call proceeds as if
//! the hook had not been declared. Diagnostics are only logged in debug mode.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;
use std::{error::Error, fmt};

use flowmcp_store::schema::{LISTS_DIR, SCHEMA_EXTENSION_JSON};
use serde_json::Value;
use tracing::warn;

use crate::catalog::SchemaModule;
use crate::runtime::PreparedCall;

/// A host-provided library handed to handler factories.
pub type Library = Arc<dyn Any + Send + Sync>;

/// Hooks keyed by route name.
pub type RouteHooks = HashMap<String, Arc<dyn RouteHook>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for HandlerError {}

/// Inputs supplied to a handler factory.
#[derive(Clone, Default)]
pub struct HandlerInputs {
    pub shared_lists: BTreeMap<String, Vec<Value>>,
    pub libraries: BTreeMap<String, Option<Library>>,
}

impl HandlerInputs {
    /// Entries of a shared list; lists that failed to load are empty.
    #[must_use]
    pub fn shared_list(&self, name: &str) -> &[Value] {
        self.shared_lists.get(name).map_or(&[], Vec::as_slice)
    }

    /// A resolved library downcast to its concrete type.
    #[must_use]
    pub fn library<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        let library = self.libraries.get(name)?.as_ref()?;
        (**library).downcast_ref::<T>()
    }
}

impl fmt::Debug for HandlerInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let libraries: BTreeMap<&str, bool> = self
            .libraries
            .iter()
            .map(|(name, library)| (name.as_str(), library.is_some()))
            .collect();
        f.debug_struct("HandlerInputs")
            .field("shared_lists", &self.shared_lists)
            .field("libraries", &libraries)
            .finish()
    }
}

/// Pre/post processing for one route.
pub trait RouteHook: Send + Sync {
    /// Runs before the schema runtime; may rewrite the prepared call.
    ///
    /// # Errors
    /// An error discards the hook's changes for this call.
    fn before(&self, _call: &mut PreparedCall) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Runs on the runtime payload.
    ///
    /// # Errors
    /// An error keeps the unmodified payload.
    fn after(&self, data: Value) -> Result<Value, HandlerError> {
        Ok(data)
    }
}

/// Builds a schema's route hooks from its shared lists and libraries.
pub trait HandlerFactory: Send + Sync {
    /// # Errors
    /// An error disables every hook of the schema for this call.
    fn build(&self, inputs: &HandlerInputs) -> Result<RouteHooks, HandlerError>;
}

impl<F> HandlerFactory for F
where
    F: Fn(&HandlerInputs) -> Result<RouteHooks, HandlerError> + Send + Sync,
{
    fn build(&self, inputs: &HandlerInputs) -> Result<RouteHooks, HandlerError> {
        self(inputs)
    }
}

/// Handler factories registered by the host, keyed by schema namespace.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    factories: HashMap<String, Arc<dyn HandlerFactory>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_factory(
        mut self,
        namespace: impl Into<String>,
        factory: impl HandlerFactory + 'static,
    ) -> Self {
        self.factories.insert(namespace.into(), Arc::new(factory));
        self
    }

    #[must_use]
    pub fn get(&self, namespace: &str) -> Option<Arc<dyn HandlerFactory>> {
        self.factories.get(namespace).cloned()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut namespaces: Vec<&String> = self.factories.keys().collect();
        namespaces.sort();
        f.debug_struct("HandlerRegistry")
            .field("namespaces", &namespaces)
            .finish()
    }
}

/// Libraries the host makes available to handler factories.
#[derive(Clone, Default)]
pub struct LibraryRegistry {
    libraries: HashMap<String, Library>,
}

impl LibraryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_library<T: Any + Send + Sync>(mut self, name: impl Into<String>, library: T) -> Self {
        self.libraries.insert(name.into(), Arc::new(library));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Library> {
        self.libraries.get(name).cloned()
    }
}

impl fmt::Debug for LibraryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.libraries.keys().collect();
        names.sort();
        f.debug_struct("LibraryRegistry").field("names", &names).finish()
    }
}

/// Hooks resolved for one call.
#[derive(Clone, Default)]
pub struct ResolvedHandlers {
    hooks: RouteHooks,
    debug: bool,
}

impl ResolvedHandlers {
    #[must_use]
    pub fn none(debug: bool) -> Self {
        Self {
            hooks: HashMap::new(),
            debug,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    #[must_use]
    pub fn has_route(&self, route: &str) -> bool {
        self.hooks.contains_key(route)
    }

    /// Applies the route's `before` hook. Changes are committed only if the
    /// hook returns normally.
    pub fn apply_before(&self, route: &str, call: &mut PreparedCall) {
        let Some(hook) = self.hooks.get(route) else {
            return;
        };
        let mut candidate = call.clone();
        match catch_unwind(AssertUnwindSafe(|| hook.before(&mut candidate))) {
            Ok(Ok(())) => *call = candidate,
            Ok(Err(err)) => diagnose(self.debug, route, &format!("before hook failed: {err}")),
            Err(_) => diagnose(self.debug, route, "before hook panicked"),
        }
    }

    /// Applies the route's `after` hook, falling back to the original payload.
    #[must_use]
    pub fn apply_after(&self, route: &str, data: Value) -> Value {
        let Some(hook) = self.hooks.get(route) else {
            return data;
        };
        let input = data.clone();
        match catch_unwind(AssertUnwindSafe(|| hook.after(input))) {
            Ok(Ok(transformed)) => transformed,
            Ok(Err(err)) => {
                diagnose(self.debug, route, &format!("after hook failed: {err}"));
                data
            }
            Err(_) => {
                diagnose(self.debug, route, "after hook panicked");
                data
            }
        }
    }
}

impl fmt::Debug for ResolvedHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<&String> = self.hooks.keys().collect();
        routes.sort();
        f.debug_struct("ResolvedHandlers")
            .field("routes", &routes)
            .field("debug", &self.debug)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct HandlerResolver {
    libraries: LibraryRegistry,
    debug: bool,
}

impl HandlerResolver {
    #[must_use]
    pub const fn new(libraries: LibraryRegistry, debug: bool) -> Self {
        Self { libraries, debug }
    }

    #[must_use]
    pub fn with_libraries(mut self, libraries: LibraryRegistry) -> Self {
        self.libraries = libraries;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// Resolves the schema's hooks. Never fails: any problem yields fewer
    /// hooks (or none).
    pub async fn resolve(&self, module: &SchemaModule, source_dir: &Path) -> ResolvedHandlers {
        let Some(factory) = module.handlers.clone() else {
            return ResolvedHandlers::none(self.debug);
        };

        let definition = &module.definition;
        let shared_lists = self
            .load_shared_lists(&definition.shared_lists, &source_dir.join(LISTS_DIR))
            .await;
        let libraries = self.resolve_libraries(&definition.required_libraries);
        let inputs = HandlerInputs {
            shared_lists,
            libraries,
        };

        let scope = definition.namespace.as_str();
        match catch_unwind(AssertUnwindSafe(|| factory.build(&inputs))) {
            Ok(Ok(hooks)) => ResolvedHandlers {
                hooks,
                debug: self.debug,
            },
            Ok(Err(err)) => {
                diagnose(self.debug, scope, &format!("handler factory failed: {err}"));
                ResolvedHandlers::none(self.debug)
            }
            Err(_) => {
                diagnose(self.debug, scope, "handler factory panicked");
                ResolvedHandlers::none(self.debug)
            }
        }
    }

    /// Loads each declared list from `lists_dir`; failures yield empty lists.
    pub async fn load_shared_lists(
        &self,
        names: &[String],
        lists_dir: &Path,
    ) -> BTreeMap<String, Vec<Value>> {
        let mut lists = BTreeMap::new();
        for name in names {
            let entries = match load_list(lists_dir, name).await {
                Ok(entries) => entries,
                Err(err) => {
                    diagnose(self.debug, name, &format!("shared list unavailable: {err}"));
                    Vec::new()
                }
            };
            lists.insert(name.clone(), entries);
        }
        lists
    }

    /// Looks up each required library; unavailable ones resolve to `None`.
    #[must_use]
    pub fn resolve_libraries(&self, names: &[String]) -> BTreeMap<String, Option<Library>> {
        names
            .iter()
            .map(|name| {
                let library = self.libraries.get(name);
                if library.is_none() {
                    diagnose(self.debug, name, "required library is not available");
                }
                (name.clone(), library)
            })
            .collect()
    }
}

async fn load_list(lists_dir: &Path, name: &str) -> Result<Vec<Value>, HandlerError> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(HandlerError::new(format!("invalid list name \"{name}\"")));
    }
    let path = lists_dir.join(format!("{name}.{SCHEMA_EXTENSION_JSON}"));
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|err| HandlerError::new(format!("{}: {err}", path.display())))?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|err| HandlerError::new(format!("{}: {err}", path.display())))?;
    match value {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut object) => match object.remove("entries") {
            Some(Value::Array(entries)) => Ok(entries),
            _ => Err(HandlerError::new(format!(
                "{}: expected an array or an object with an entries array",
                path.display()
            ))),
        },
        _ => Err(HandlerError::new(format!("{}: expected an array", path.display()))),
    }
}

fn diagnose(debug: bool, scope: &str, message: &str) {
    if debug {
        warn!("handler diagnostics [{scope}]: {message}");
    }
}
