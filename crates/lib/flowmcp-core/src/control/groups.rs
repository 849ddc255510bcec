use flowmcp_store::{Group, LocalConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{CoreError, FlowControlPlane};
use crate::reference::ToolRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub tools: Vec<String>,
    pub is_default: bool,
}

impl GroupSummary {
    fn new(config: &LocalConfig, name: &str, group: &Group) -> Self {
        Self {
            name: name.to_string(),
            description: group.description.clone(),
            tools: group.tools.clone(),
            is_default: config.default_group.as_deref() == Some(name),
        }
    }
}

impl FlowControlPlane {
    /// Groups of the project config in stored order.
    ///
    /// # Errors
    /// Returns `CoreError::Config` if the project config cannot be read.
    pub async fn list_groups(&self) -> Result<Vec<GroupSummary>, CoreError> {
        let Some(local) = self.config.load_local().await? else {
            return Ok(Vec::new());
        };
        let config = &local.config;
        Ok(config
            .groups
            .iter()
            .map(|(name, group)| GroupSummary::new(config, name, group))
            .collect())
    }

    /// Creates a group. The first group of a project becomes its default and
    /// creates the project config if there is none.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidInput` for an empty or existing name or a
    /// malformed tool reference.
    pub async fn create_group(
        &self,
        name: &str,
        description: &str,
        tools: &[String],
    ) -> Result<GroupSummary, CoreError> {
        let name = validate_group_name(name)?;
        let tools = normalize_references(tools)?;
        let mut config = self.load_local_or_default().await?;
        if config.groups.contains_key(name) {
            return Err(CoreError::InvalidInput(format!("Group \"{name}\" already exists")));
        }

        let mut group = Group {
            description: description.trim().to_string(),
            tools: Vec::new(),
        };
        push_unique(&mut group.tools, tools);
        config.groups.insert(name.to_string(), group);
        if config.default_group.is_none() {
            config.default_group = Some(name.to_string());
        }

        self.config.write_local(&config).await?;
        info!("created group {name}");
        summarize(&config, name)
    }

    /// Appends references to a group, skipping ones already present.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` for an unknown group and
    /// `CoreError::InvalidInput` for malformed references.
    pub async fn add_tools(&self, name: &str, tools: &[String]) -> Result<GroupSummary, CoreError> {
        let tools = normalize_references(tools)?;
        let mut config = self.load_existing_local().await?;
        let group = config
            .groups
            .get_mut(name)
            .ok_or_else(|| group_not_found(name))?;
        push_unique(&mut group.tools, tools);

        self.config.write_local(&config).await?;
        summarize(&config, name)
    }

    /// Removes references from a group. Matching is on the parsed reference,
    /// so surrounding whitespace does not matter.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` for an unknown group.
    pub async fn remove_tools(&self, name: &str, tools: &[String]) -> Result<GroupSummary, CoreError> {
        let remove: Vec<String> = tools.iter().map(|tool| canonical_reference(tool)).collect();
        let mut config = self.load_existing_local().await?;
        let group = config
            .groups
            .get_mut(name)
            .ok_or_else(|| group_not_found(name))?;
        group
            .tools
            .retain(|tool| !remove.contains(&canonical_reference(tool)));

        self.config.write_local(&config).await?;
        summarize(&config, name)
    }

    /// Deletes a group; deleting the default group clears `defaultGroup`.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` for an unknown group.
    pub async fn delete_group(&self, name: &str) -> Result<(), CoreError> {
        let mut config = self.load_existing_local().await?;
        if config.groups.shift_remove(name).is_none() {
            return Err(group_not_found(name));
        }
        if config.default_group.as_deref() == Some(name) {
            config.default_group = None;
        }
        self.config.write_local(&config).await?;
        info!("deleted group {name}");
        Ok(())
    }

    /// # Errors
    /// Returns `CoreError::NotFound` for an unknown group.
    pub async fn set_default_group(&self, name: &str) -> Result<GroupSummary, CoreError> {
        let mut config = self.load_existing_local().await?;
        if !config.groups.contains_key(name) {
            return Err(group_not_found(name));
        }
        config.default_group = Some(name.to_string());
        self.config.write_local(&config).await?;
        summarize(&config, name)
    }

    async fn load_local_or_default(&self) -> Result<LocalConfig, CoreError> {
        Ok(self
            .config
            .load_local()
            .await?
            .map(|local| local.config)
            .unwrap_or_default())
    }

    async fn load_existing_local(&self) -> Result<LocalConfig, CoreError> {
        let local = self.config.load_local().await?.ok_or_else(|| {
            CoreError::NotFound(format!(
                "No project config at {}",
                self.paths.local_config().display()
            ))
        })?;
        if !local.migrated_groups.is_empty() {
            info!(
                "migrating legacy schemas key to tools for groups: {}",
                local.migrated_groups.join(", ")
            );
        }
        Ok(local.config)
    }
}

fn summarize(config: &LocalConfig, name: &str) -> Result<GroupSummary, CoreError> {
    config
        .groups
        .get(name)
        .map(|group| GroupSummary::new(config, name, group))
        .ok_or_else(|| group_not_found(name))
}

fn validate_group_name(name: &str) -> Result<&str, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidInput("Group name is required".to_string()));
    }
    if name.chars().any(|ch| ch.is_whitespace() || ch == '/') {
        return Err(CoreError::InvalidInput(format!(
            "Group name \"{name}\" must not contain whitespace or /"
        )));
    }
    Ok(name)
}

fn normalize_references(tools: &[String]) -> Result<Vec<String>, CoreError> {
    tools
        .iter()
        .map(|raw| {
            ToolRef::parse(raw)
                .map(|reference| reference.to_string())
                .map_err(|err| CoreError::InvalidInput(format!("{raw}: {err}")))
        })
        .collect()
}

fn canonical_reference(raw: &str) -> String {
    ToolRef::parse(raw).map_or_else(|_| raw.trim().to_string(), |reference| reference.to_string())
}

fn push_unique(target: &mut Vec<String>, tools: Vec<String>) {
    for tool in tools {
        if !target.contains(&tool) {
            target.push(tool);
        }
    }
}

fn group_not_found(name: &str) -> CoreError {
    CoreError::NotFound(format!("Group \"{name}\" not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_are_normalized_and_validated() {
        let tools = vec![" demo/ping.json::ping ".to_string(), "demo/all.json".to_string()];
        assert_eq!(
            normalize_references(&tools).expect("valid references"),
            vec!["demo/ping.json::ping", "demo/all.json"]
        );
        assert!(normalize_references(&["nofile".to_string()]).is_err());
        assert!(normalize_references(&["a/b.json::x::y".to_string()]).is_err());
    }

    #[test]
    fn duplicates_are_skipped() {
        let mut tools = vec!["a/b.json::x".to_string()];
        push_unique(&mut tools, vec!["a/b.json::x".to_string(), "a/b.json::y".to_string()]);
        assert_eq!(tools, vec!["a/b.json::x", "a/b.json::y"]);
    }

    #[test]
    fn group_names_are_checked() {
        assert!(validate_group_name("  ").is_err());
        assert!(validate_group_name("my group").is_err());
        assert_eq!(validate_group_name(" dev ").ok(), Some("dev"));
    }
}
