use std::collections::HashMap;
use std::path::Path;

use flowmcp_store::SchemaDefinition;
use flowmcp_store::schema::HTTP_METHODS;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CoreError, FlowControlPlane};
use crate::catalog::{SchemaModule, scan_directory};
use crate::params::parse_primitive;
use crate::reference::{ToolRef, to_canonical_name};

/// Validation outcome for one schema file (or one unresolvable reference).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaValidation {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub status: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl SchemaValidation {
    fn failed(file: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            namespace: None,
            status: false,
            errors: vec![error.into()],
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub schemas: Vec<SchemaValidation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn failure(target: Option<&str>, err: &CoreError) -> Self {
        Self {
            status: false,
            error: Some(err.to_string()),
            target: target.map(str::to_string),
            ..Self::default()
        }
    }

    fn from_schemas(target: String, schemas: Vec<SchemaValidation>, warnings: Vec<String>) -> Self {
        let passed = schemas.iter().filter(|schema| schema.status).count();
        let failed = schemas.len() - passed;
        Self {
            status: failed == 0,
            error: None,
            target: Some(target),
            total: schemas.len(),
            passed,
            failed,
            schemas,
            warnings,
        }
    }
}

impl FlowControlPlane {
    /// Validates a schema file, a directory, a source, or a group. Without a
    /// target the project's default group is validated.
    pub async fn validate_schemas(&self, target: Option<&str>) -> ValidationReport {
        match self.try_validate(target).await {
            Ok(report) => report,
            Err(err) => {
                debug!("validation failed: {err}");
                ValidationReport::failure(target, &err)
            }
        }
    }

    async fn try_validate(&self, target: Option<&str>) -> Result<ValidationReport, CoreError> {
        let Some(target) = target.map(str::trim).filter(|target| !target.is_empty()) else {
            let selection = self.active_selection(None).await?;
            let Some(group) = selection.group else {
                return Err(CoreError::InvalidInput(
                    "Nothing to validate: pass a schema path or group, or set defaultGroup".to_string(),
                ));
            };
            return self.validate_group(&group).await;
        };

        let path = self.paths.resolve(target);
        if let Ok(metadata) = tokio::fs::metadata(&path).await {
            return if metadata.is_dir() {
                self.validate_directory(target, &path).await
            } else {
                let schema = self.validate_path(target, &path).await;
                Ok(ValidationReport::from_schemas(target.to_string(), vec![schema], Vec::new()))
            };
        }

        if let Some(local) = self.config.load_local().await?
            && local.config.groups.contains_key(target)
        {
            return self.validate_group(target).await;
        }

        if self.catalog.list_sources().await.iter().any(|source| source == target) {
            let files = self.catalog.schema_files(target).await?;
            let mut schemas = Vec::with_capacity(files.len());
            for entry in files {
                let label = format!("{}/{}", entry.source, entry.file);
                schemas.push(self.validate_path(&label, &entry.path).await);
            }
            return Ok(ValidationReport::from_schemas(target.to_string(), schemas, Vec::new()));
        }

        if target.contains('/') {
            let reference = ToolRef::parse(target)?;
            let schema = self.validate_reference(&reference).await;
            return Ok(ValidationReport::from_schemas(target.to_string(), vec![schema], Vec::new()));
        }

        Err(CoreError::NotFound(format!(
            "\"{target}\" is not a schema path, group or source"
        )))
    }

    async fn validate_group(&self, group: &str) -> Result<ValidationReport, CoreError> {
        let local = self.config.load_local().await?;
        let references = local
            .and_then(|local| local.config.groups.get(group).map(|entry| entry.tools.clone()))
            .ok_or_else(|| CoreError::NotFound(format!("Group \"{group}\" not found")))?;

        let mut schemas = Vec::with_capacity(references.len());
        for raw in &references {
            match ToolRef::parse(raw) {
                Ok(reference) => schemas.push(self.validate_reference(&reference).await),
                Err(err) => schemas.push(SchemaValidation::failed(raw, err.to_string())),
            }
        }

        let tools = self.resolve_references(&references).await;
        let mut seen: HashMap<&str, &str> = HashMap::new();
        let mut warnings = Vec::new();
        for tool in &tools {
            if let Some(first) = seen.get(tool.name.as_str()) {
                if *first != tool.reference {
                    warnings.push(format!(
                        "Duplicate tool name \"{}\": {} shadows {}",
                        tool.name, first, tool.reference
                    ));
                }
            } else {
                seen.insert(&tool.name, &tool.reference);
            }
        }

        Ok(ValidationReport::from_schemas(group.to_string(), schemas, warnings))
    }

    async fn validate_directory(&self, target: &str, dir: &Path) -> Result<ValidationReport, CoreError> {
        let files = scan_directory(dir, self.catalog.extension()).await?;
        let mut schemas = Vec::with_capacity(files.len());
        for file in files {
            schemas.push(self.validate_path(&file, &dir.join(&file)).await);
        }
        Ok(ValidationReport::from_schemas(target.to_string(), schemas, Vec::new()))
    }

    async fn validate_reference(&self, reference: &ToolRef) -> SchemaValidation {
        let label = reference.to_string();
        let module = match self.catalog.load_schema(&reference.source, &reference.file).await {
            Ok(module) => module,
            Err(err) => return SchemaValidation::failed(label, err.to_string()),
        };
        let mut validation = validate_module(&label, &module);
        if let Some(route) = &reference.route
            && !module.definition.routes.contains_key(route)
        {
            validation.status = false;
            validation.errors.push(format!("route \"{route}\" not found"));
        }
        validation
    }

    async fn validate_path(&self, label: &str, path: &Path) -> SchemaValidation {
        match self.catalog.load_path(path).await {
            Ok(module) => validate_module(label, &module),
            Err(err) => SchemaValidation::failed(label, err.to_string()),
        }
    }
}

fn validate_module(label: &str, module: &SchemaModule) -> SchemaValidation {
    let definition = &module.definition;
    let (errors, warnings) = validate_definition(definition);
    SchemaValidation {
        file: label.to_string(),
        namespace: Some(definition.namespace.clone()),
        status: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Structural rules every schema definition must satisfy. Returns
/// `(errors, warnings)`.
#[must_use]
pub fn validate_definition(definition: &SchemaDefinition) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let namespace = definition.namespace.as_str();
    if namespace.is_empty() {
        errors.push("namespace is missing".to_string());
    } else if !namespace.chars().all(|ch| ch.is_ascii_lowercase()) {
        errors.push(format!("namespace \"{namespace}\" must contain only lowercase letters"));
    }
    if definition.routes.is_empty() {
        errors.push("schema declares no routes".to_string());
    }

    let mut names: HashMap<String, &str> = HashMap::new();
    for (route_name, route) in &definition.routes {
        let method = route.method.to_ascii_uppercase();
        if !HTTP_METHODS.contains(&method.as_str()) {
            errors.push(format!("{route_name}: unsupported method \"{}\"", route.method));
        }
        if !route.path.starts_with('/') {
            errors.push(format!("{route_name}: path \"{}\" must start with /", route.path));
        }
        for param in &route.parameters {
            let key = param.position.key.trim();
            if key.is_empty() {
                errors.push(format!("{route_name}: parameter without a key"));
                continue;
            }
            if let Some(annotation) = &param.z
                && parse_primitive(&annotation.primitive).is_none()
            {
                errors.push(format!(
                    "{route_name}.{key}: unrecognized type \"{}\"",
                    annotation.primitive
                ));
            }
        }
        if let Some(preload) = route.preload
            && preload.enabled
            && preload.ttl == 0
        {
            errors.push(format!("{route_name}: preload is enabled without a ttl"));
        }

        let canonical = to_canonical_name(route_name, namespace);
        if let Some(previous) = names.insert(canonical.clone(), route_name) {
            warnings.push(format!(
                "routes \"{previous}\" and \"{route_name}\" share the tool name \"{canonical}\""
            ));
        }
    }

    (errors, warnings)
}
