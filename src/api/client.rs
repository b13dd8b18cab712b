//! Aiven Client
//!
//! Main client for interacting with the Aiven API, combining the token
//! and HTTP functionality. Domain handlers borrow the client.

use super::billing::BillingGroupHandler;
use super::cards::CardsHandler;
use super::http::{ApiError, AivenHttpClient};
use super::kafka_topics::KafkaTopicsHandler;
use super::projects::ProjectsHandler;
use super::services::ServicesHandler;
use serde_json::Value;

/// Default Aiven API endpoint
pub const DEFAULT_API_URL: &str = "https://api.aiven.io/v1";

/// Main Aiven client
#[derive(Clone)]
pub struct AivenClient {
    pub http: AivenHttpClient,
    token: String,
    base_url: String,
}

impl AivenClient {
    /// Create a new client for the given API endpoint
    pub fn new(token: &str, base_url: &str) -> Result<Self, ApiError> {
        let http = AivenHttpClient::new(&format!("aiven-provider/{}", crate::VERSION))?;

        Ok(Self {
            http,
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Make a GET request to the Aiven API
    pub async fn get(&self, url: &str) -> Result<Value, ApiError> {
        self.http.get(url, &self.token).await
    }

    /// Make a POST request to the Aiven API
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.http.post(url, &self.token, body).await
    }

    /// Make a PUT request to the Aiven API
    pub async fn put(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        self.http.put(url, &self.token, body).await
    }

    /// Make a DELETE request to the Aiven API
    pub async fn delete(&self, url: &str) -> Result<Value, ApiError> {
        self.http.delete(url, &self.token).await
    }

    // =========================================================================
    // Domain handlers
    // =========================================================================

    pub fn billing_groups(&self) -> BillingGroupHandler<'_> {
        BillingGroupHandler::new(self)
    }

    pub fn cards(&self) -> CardsHandler<'_> {
        CardsHandler::new(self)
    }

    pub fn projects(&self) -> ProjectsHandler<'_> {
        ProjectsHandler::new(self)
    }

    pub fn services(&self) -> ServicesHandler<'_> {
        ServicesHandler::new(self)
    }

    pub fn kafka_topics(&self) -> KafkaTopicsHandler<'_> {
        KafkaTopicsHandler::new(self)
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build an API URL from a path relative to the endpoint
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build a billing group URL (collection when `id` is `None`)
    pub fn billing_group_url(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => self.url(&format!("billing-group/{}", encode(id))),
            None => self.url("billing-group"),
        }
    }

    /// Build a project-scoped URL
    pub fn project_url(&self, project: &str, rest: &str) -> String {
        if rest.is_empty() {
            self.url(&format!("project/{}", encode(project)))
        } else {
            self.url(&format!("project/{}/{}", encode(project), rest))
        }
    }

    /// Build a service URL (collection when `service` is `None`)
    pub fn service_url(&self, project: &str, service: Option<&str>) -> String {
        match service {
            Some(service) => self.project_url(project, &format!("service/{}", encode(service))),
            None => self.project_url(project, "service"),
        }
    }

    /// Build a Kafka topic URL (collection when `topic` is `None`)
    pub fn topic_url(&self, project: &str, service: &str, topic: Option<&str>) -> String {
        let base = format!("service/{}/topic", encode(service));
        match topic {
            Some(topic) => self.project_url(project, &format!("{}/{}", base, encode(topic))),
            None => self.project_url(project, &base),
        }
    }
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
