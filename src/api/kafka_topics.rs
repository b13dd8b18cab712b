//! Kafka Topics
//!
//! Typed access to `/project/{project}/service/{service}/topic`.

use super::client::AivenClient;
use super::http::ApiError;
use super::unwrap_envelope;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Topic-level Kafka configuration overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KafkaTopicConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_retention_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_delete_delay_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_messages: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_interval_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_compaction_lag_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_message_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_downconversion_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_format_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_timestamp_difference_max_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_timestamp_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_cleanable_dirty_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_compaction_lag_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_insync_replicas: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preallocate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_index_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_jitter_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unclean_leader_election_enable: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateKafkaTopicRequest {
    pub topic_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitions: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_insync_replicas: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_hours: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_policy: Option<String>,
    pub config: KafkaTopicConfig,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateKafkaTopicRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitions: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_insync_replicas: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_hours: Option<i64>,
    pub config: KafkaTopicConfig,
}

/// Per-partition details of a topic
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Partition {
    #[serde(default)]
    pub partition: i64,
    #[serde(default)]
    pub isr: i64,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub earliest_offset: i64,
    #[serde(default)]
    pub latest_offset: i64,
}

/// A topic config value and where Kafka took it from
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopicConfigEntry {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub source: Option<String>,
}

impl TopicConfigEntry {
    /// Whether the value was set explicitly rather than inherited
    pub fn is_override(&self) -> bool {
        !matches!(self.source.as_deref(), Some("default_config")) && !self.value.is_null()
    }
}

/// Topic as returned by a single-topic GET
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaTopic {
    pub topic_name: String,
    #[serde(default)]
    pub partitions: Vec<Partition>,
    pub replication: i64,
    #[serde(default)]
    pub min_insync_replicas: Option<i64>,
    #[serde(default)]
    pub retention_bytes: Option<i64>,
    #[serde(default)]
    pub retention_hours: Option<i64>,
    #[serde(default)]
    pub cleanup_policy: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub config: BTreeMap<String, TopicConfigEntry>,
}

/// Topic summary as returned by the list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaListTopic {
    pub topic_name: String,
    #[serde(default)]
    pub partitions: i64,
    #[serde(default)]
    pub replication: i64,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TopicList {
    #[serde(default)]
    topics: Vec<KafkaListTopic>,
}

pub struct KafkaTopicsHandler<'a> {
    client: &'a AivenClient,
}

impl<'a> KafkaTopicsHandler<'a> {
    pub(crate) fn new(client: &'a AivenClient) -> Self {
        Self { client }
    }

    pub async fn create(
        &self,
        project: &str,
        service: &str,
        request: &CreateKafkaTopicRequest,
    ) -> Result<(), ApiError> {
        let body = serde_json::to_value(request)?;
        let url = self.client.topic_url(project, service, None);
        self.client.post(&url, Some(&body)).await?;
        Ok(())
    }

    pub async fn get(&self, project: &str, service: &str, topic: &str) -> Result<KafkaTopic, ApiError> {
        let url = self.client.topic_url(project, service, Some(topic));
        let response = self.client.get(&url).await?;
        unwrap_envelope(response, "topic")
    }

    pub async fn update(
        &self,
        project: &str,
        service: &str,
        topic: &str,
        request: &UpdateKafkaTopicRequest,
    ) -> Result<(), ApiError> {
        let body = serde_json::to_value(request)?;
        let url = self.client.topic_url(project, service, Some(topic));
        self.client.put(&url, &body).await?;
        Ok(())
    }

    pub async fn delete(&self, project: &str, service: &str, topic: &str) -> Result<(), ApiError> {
        let url = self.client.topic_url(project, service, Some(topic));
        self.client.delete(&url).await?;
        Ok(())
    }

    pub async fn list(&self, project: &str, service: &str) -> Result<Vec<KafkaListTopic>, ApiError> {
        let url = self.client.topic_url(project, service, None);
        let response = self.client.get(&url).await?;
        let list: TopicList = serde_json::from_value(response)?;
        Ok(list.topics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_entries_distinguish_defaults() {
        let topic: KafkaTopic = serde_json::from_value(json!({
            "topic_name": "events",
            "replication": 2,
            "partitions": [{}, {}, {}],
            "config": {
                "cleanup_policy": {"value": "compact", "source": "topic_config"},
                "flush_ms": {"value": 9223372036854775807i64, "source": "default_config"}
            }
        }))
        .unwrap();

        assert_eq!(topic.partitions.len(), 3);
        assert!(topic.config["cleanup_policy"].is_override());
        assert!(!topic.config["flush_ms"].is_override());
    }

    #[test]
    fn test_empty_config_serializes_to_empty_object() {
        let body = serde_json::to_value(UpdateKafkaTopicRequest::default()).unwrap();
        assert_eq!(body, json!({"config": {}}));
    }
}
