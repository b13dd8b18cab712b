//! Aiven Projects
//!
//! Functions for listing projects visible to the token.

use super::client::AivenClient;
use super::http::ApiError;
use serde_json::Value;

/// Project information
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub default_cloud: String,
    pub account_id: Option<String>,
}

impl From<&Value> for Project {
    fn from(value: &Value) -> Self {
        Self {
            name: value
                .get("project_name")
                .and_then(|v| v.as_str())
                .unwrap_or("-")
                .to_string(),
            default_cloud: value
                .get("default_cloud")
                .and_then(|v| v.as_str())
                .unwrap_or("-")
                .to_string(),
            account_id: value
                .get("account_id")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        }
    }
}

pub struct ProjectsHandler<'a> {
    client: &'a AivenClient,
}

impl<'a> ProjectsHandler<'a> {
    pub(crate) fn new(client: &'a AivenClient) -> Self {
        Self { client }
    }

    /// List all accessible projects
    pub async fn list(&self) -> Result<Vec<Project>, ApiError> {
        let response = self.client.get(&self.client.url("project")).await?;

        let projects = response
            .get("projects")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().map(Project::from).collect())
            .unwrap_or_default();

        Ok(projects)
    }

    /// Get project names as a simple list
    pub async fn list_names(&self) -> Result<Vec<String>, ApiError> {
        let projects = self.list().await?;
        Ok(projects.into_iter().map(|p| p.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_from_value_defaults_missing_fields() {
        let project = Project::from(&json!({"project_name": "acme-prod"}));
        assert_eq!(project.name, "acme-prod");
        assert_eq!(project.default_cloud, "-");
        assert!(project.account_id.is_none());
    }
}
