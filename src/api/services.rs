//! Services
//!
//! Typed access to `/project/{project}/service`.

use super::client::AivenClient;
use super::http::ApiError;
use super::unwrap_envelope;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Weekly maintenance slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub dow: String,
    pub time: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateServiceRequest {
    pub service_name: String,
    pub service_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_vpc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<MaintenanceWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_config: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_protection: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateServiceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_vpc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<MaintenanceWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_config: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_protection: Option<bool>,
    pub powered: bool,
}

/// One externally reachable component of a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceComponent {
    pub component: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub usage: Option<String>,
}

/// Service as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    pub service_name: String,
    pub service_type: String,
    pub plan: String,
    pub cloud_name: String,
    pub state: String,
    #[serde(default)]
    pub service_uri: Option<String>,
    #[serde(default)]
    pub service_uri_params: BTreeMap<String, Value>,
    #[serde(default)]
    pub user_config: Map<String, Value>,
    #[serde(default)]
    pub maintenance: Option<MaintenanceWindow>,
    #[serde(default)]
    pub project_vpc_id: Option<String>,
    #[serde(default)]
    pub termination_protection: bool,
    #[serde(default)]
    pub components: Vec<ServiceComponent>,
    #[serde(default)]
    pub connection_info: Map<String, Value>,
}

impl Service {
    /// Look up a `service_uri_params` entry as a string
    pub fn uri_param(&self, key: &str) -> Option<String> {
        match self.service_uri_params.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceList {
    #[serde(default)]
    services: Vec<Service>,
}

pub struct ServicesHandler<'a> {
    client: &'a AivenClient,
}

impl<'a> ServicesHandler<'a> {
    pub(crate) fn new(client: &'a AivenClient) -> Self {
        Self { client }
    }

    pub async fn create(
        &self,
        project: &str,
        request: &CreateServiceRequest,
    ) -> Result<Service, ApiError> {
        let body = serde_json::to_value(request)?;
        let url = self.client.service_url(project, None);
        let response = self.client.post(&url, Some(&body)).await?;
        unwrap_envelope(response, "service")
    }

    pub async fn get(&self, project: &str, service: &str) -> Result<Service, ApiError> {
        let url = self.client.service_url(project, Some(service));
        let response = self.client.get(&url).await?;
        unwrap_envelope(response, "service")
    }

    pub async fn update(
        &self,
        project: &str,
        service: &str,
        request: &UpdateServiceRequest,
    ) -> Result<Service, ApiError> {
        let body = serde_json::to_value(request)?;
        let url = self.client.service_url(project, Some(service));
        let response = self.client.put(&url, &body).await?;
        unwrap_envelope(response, "service")
    }

    pub async fn delete(&self, project: &str, service: &str) -> Result<(), ApiError> {
        let url = self.client.service_url(project, Some(service));
        self.client.delete(&url).await?;
        Ok(())
    }

    pub async fn list(&self, project: &str) -> Result<Vec<Service>, ApiError> {
        let url = self.client.service_url(project, None);
        let response = self.client.get(&url).await?;
        let list: ServiceList = serde_json::from_value(response)?;
        Ok(list.services)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uri_param_accepts_numeric_port() {
        let service: Service = serde_json::from_value(json!({
            "service_name": "es-1",
            "service_type": "elasticsearch",
            "plan": "startup-4",
            "cloud_name": "google-europe-west1",
            "state": "RUNNING",
            "service_uri_params": {"host": "es-1.aivencloud.com", "port": 12691}
        }))
        .unwrap();

        assert_eq!(service.uri_param("host").as_deref(), Some("es-1.aivencloud.com"));
        assert_eq!(service.uri_param("port").as_deref(), Some("12691"));
        assert!(service.uri_param("password").is_none());
    }

    #[test]
    fn test_update_request_always_powers_on() {
        let body = serde_json::to_value(UpdateServiceRequest {
            powered: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, json!({"powered": true}));
    }
}
