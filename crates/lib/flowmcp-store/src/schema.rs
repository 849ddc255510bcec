pub const FLOWMCP_DIR: &str = ".flowmcp";
pub const CONFIG_FILE: &str = "config.json";
pub const ENV_FILE: &str = ".env";
pub const SCHEMAS_DIR: &str = "schemas";
pub const CACHE_DIR: &str = "cache";
pub const LISTS_DIR: &str = "_lists";

pub const REGISTRY_MANIFESTS: [&str; 2] = ["_registry.json", "flowmcp-registry.json"];
pub const SCHEMA_EXTENSION_JSON: &str = "json";
pub const RESERVED_PREFIX: char = '_';

pub const USER_PARAM: &str = "{{USER_PARAM}}";
pub const ROUTE_SEPARATOR: &str = "::";

pub const SOURCE_KIND_BUILTIN: &str = "builtin";
pub const SOURCE_KIND_LOCAL: &str = "local";
pub const SOURCE_KIND_GITHUB: &str = "github";
pub const SOURCE_KIND_REGISTRY: &str = "registry";

pub const SOURCE_KINDS: [&str; 4] = [
    SOURCE_KIND_BUILTIN,
    SOURCE_KIND_LOCAL,
    SOURCE_KIND_GITHUB,
    SOURCE_KIND_REGISTRY,
];

pub const HTTP_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

#[must_use]
pub fn make_tool_ref(source: &str, file: &str, route: Option<&str>) -> String {
    match route {
        Some(route) => format!("{source}/{file}{ROUTE_SEPARATOR}{route}"),
        None => format!("{source}/{file}"),
    }
}

#[must_use]
pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}
