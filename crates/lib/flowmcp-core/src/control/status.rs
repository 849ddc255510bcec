use serde::{Deserialize, Serialize};

use super::FlowControlPlane;
use crate::config::HealthCheck;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatus {
    pub name: String,
    pub schema_files: usize,
}

/// Health view plus what the catalog and the active group currently resolve to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: bool,
    pub checks: Vec<HealthCheck>,
    pub sources: Vec<SourceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_group: Option<String>,
    pub active_tools: usize,
}

impl FlowControlPlane {
    pub async fn status(&self) -> StatusReport {
        let health = self.config.health().await;

        let mut sources = Vec::new();
        for name in self.catalog.list_sources().await {
            let schema_files = self
                .catalog
                .schema_files(&name)
                .await
                .map_or(0, |files| files.len());
            sources.push(SourceStatus { name, schema_files });
        }

        let selection = self.active_selection(None).await.unwrap_or_default();

        StatusReport {
            status: health.status,
            checks: health.checks,
            sources,
            active_group: selection.group,
            active_tools: selection.tools.len(),
        }
    }
}
