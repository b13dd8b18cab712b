//! `aiven_kafka_topic`
//!
//! Topics are children of a Kafka service and are identified by
//! `project/service_name/topic_name`. The `config` block is a map of strings
//! in the configuration; values are parsed into their Kafka types before
//! they are sent.

use crate::api::kafka_topics::{CreateKafkaTopicRequest, KafkaTopic, KafkaTopicConfig, UpdateKafkaTopicRequest};
use crate::api::AivenClient;
use crate::provider::id::{build_resource_id, split_resource_id3};
use crate::provider::{OpContext, ProviderError, RemoteContext, ResourceData, ResourceDefinition, ResourceHandler};
use crate::schema::mapping::{
    empty_string_as_none, parse_optional_string_to_bool, parse_optional_string_to_f64,
    parse_optional_string_to_i64, scalar_to_string,
};
use crate::schema::{Attribute, AttributeType, DiffSuppress, Schema};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const TYPE_NAME: &str = "aiven_kafka_topic";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigKind {
    String,
    Int,
    Float,
    Bool,
}

/// Topic config keys the provider manages, with their Kafka types
const CONFIG_KEYS: &[(&str, ConfigKind)] = &[
    ("cleanup_policy", ConfigKind::String),
    ("compression_type", ConfigKind::String),
    ("delete_retention_ms", ConfigKind::Int),
    ("file_delete_delay_ms", ConfigKind::Int),
    ("flush_messages", ConfigKind::Int),
    ("flush_ms", ConfigKind::Int),
    ("index_interval_bytes", ConfigKind::Int),
    ("max_compaction_lag_ms", ConfigKind::Int),
    ("max_message_bytes", ConfigKind::Int),
    ("message_downconversion_enable", ConfigKind::Bool),
    ("message_format_version", ConfigKind::String),
    ("message_timestamp_difference_max_ms", ConfigKind::Int),
    ("message_timestamp_type", ConfigKind::String),
    ("min_cleanable_dirty_ratio", ConfigKind::Float),
    ("min_compaction_lag_ms", ConfigKind::Int),
    ("min_insync_replicas", ConfigKind::Int),
    ("preallocate", ConfigKind::Bool),
    ("retention_bytes", ConfigKind::Int),
    ("retention_ms", ConfigKind::Int),
    ("segment_bytes", ConfigKind::Int),
    ("segment_index_bytes", ConfigKind::Int),
    ("segment_jitter_ms", ConfigKind::Int),
    ("segment_ms", ConfigKind::Int),
    ("unclean_leader_election_enable", ConfigKind::Bool),
];

fn config_kind(key: &str) -> Option<ConfigKind> {
    CONFIG_KEYS.iter().find(|(k, _)| *k == key).map(|(_, kind)| *kind)
}

pub fn schema() -> Schema {
    Schema::new()
        .with(
            "project",
            Attribute::required(AttributeType::String)
                .description("Target project")
                .force_new(),
        )
        .with(
            "service_name",
            Attribute::required(AttributeType::String)
                .description("Service to link the kafka topic to")
                .force_new(),
        )
        .with(
            "topic_name",
            Attribute::required(AttributeType::String)
                .description("Topic name")
                .force_new(),
        )
        .with(
            "partitions",
            Attribute::required(AttributeType::Int).description("Number of partitions to create in the topic"),
        )
        .with(
            "replication",
            Attribute::required(AttributeType::Int).description("Replication factor for the topic"),
        )
        .with(
            "retention_bytes",
            Attribute::optional(AttributeType::Int)
                .description("Retention bytes")
                .suppress(DiffSuppress::WhenUnset),
        )
        .with(
            "retention_hours",
            Attribute::optional(AttributeType::Int)
                .description("Retention period (hours)")
                .suppress(DiffSuppress::WhenUnset),
        )
        .with(
            "minimum_in_sync_replicas",
            Attribute::optional(AttributeType::Int)
                .description("Minimum required nodes in-sync replicas (ISR) to produce to a partition")
                .suppress(DiffSuppress::WhenUnset),
        )
        .with(
            "cleanup_policy",
            Attribute::optional(AttributeType::String)
                .description("Topic cleanup policy. Allowed values: delete, compact")
                .force_new()
                .suppress(DiffSuppress::WhenUnset),
        )
        .with(
            "termination_protection",
            Attribute::optional(AttributeType::Bool)
                .description("It is a Terraform-only flag that prevents the topic from being deleted")
                .local_only()
                .default_value(false),
        )
        .with(
            "config",
            Attribute::optional(AttributeType::map_of(AttributeType::String))
                .description("Kafka topic configuration")
                .suppress(DiffSuppress::WhenUnset),
        )
}

pub fn definition() -> ResourceDefinition {
    ResourceDefinition::new(TYPE_NAME, "Kafka topic", schema(), KafkaTopicResource)
}

/// User-supplied attributes of a topic
#[derive(Debug, Deserialize)]
struct KafkaTopicModel {
    project: String,
    service_name: String,
    topic_name: String,
    #[serde(default)]
    partitions: Option<i64>,
    #[serde(default)]
    replication: Option<i64>,
    #[serde(default)]
    retention_bytes: Option<i64>,
    #[serde(default)]
    retention_hours: Option<i64>,
    #[serde(default)]
    minimum_in_sync_replicas: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    cleanup_policy: Option<String>,
    #[serde(default)]
    config: BTreeMap<String, String>,
}

/// Parse the string map of the configuration into typed topic config
fn config_for_api(raw: &BTreeMap<String, String>) -> Result<KafkaTopicConfig, ProviderError> {
    let mut typed = Map::new();

    for (key, value) in raw {
        let Some(kind) = config_kind(key) else {
            return Err(ProviderError::precondition(format!(
                "unsupported kafka topic config `{}`",
                key
            )));
        };

        let parsed = match kind {
            ConfigKind::String => Ok(Some(value.clone()).filter(|v| !v.is_empty()).map(Value::String)),
            ConfigKind::Int => parse_optional_string_to_i64(value).map(|v| v.map(Value::from)),
            ConfigKind::Float => parse_optional_string_to_f64(value).map(|v| v.map(Value::from)),
            ConfigKind::Bool => parse_optional_string_to_bool(value).map(|v| v.map(Value::from)),
        };

        match parsed {
            Ok(Some(value)) => {
                typed.insert(key.clone(), value);
            },
            Ok(None) => {},
            Err(reason) => {
                return Err(ProviderError::precondition(format!(
                    "invalid kafka topic config `{}`: {}",
                    key, reason
                )))
            },
        }
    }

    serde_json::from_value(Value::Object(typed))
        .map_err(|e| ProviderError::precondition(format!("invalid kafka topic config: {}", e)))
}

/// Config entries set explicitly on the topic, rendered as strings
fn config_for_state(topic: &KafkaTopic) -> BTreeMap<String, String> {
    topic
        .config
        .iter()
        .filter(|(key, entry)| entry.is_override() && config_kind(key).is_some())
        .filter_map(|(key, entry)| scalar_to_string(&entry.value).map(|v| (key.clone(), v)))
        .collect()
}

fn write_state(
    d: &mut ResourceData,
    project: &str,
    service_name: &str,
    topic: &KafkaTopic,
) -> Result<(), ProviderError> {
    d.set("project", project)?;
    d.set("service_name", service_name)?;
    d.set("topic_name", &topic.topic_name)?;
    d.set("partitions", topic.partitions.len())?;
    d.set("replication", topic.replication)?;
    d.set("retention_bytes", topic.retention_bytes)?;
    d.set("retention_hours", topic.retention_hours)?;
    d.set("minimum_in_sync_replicas", topic.min_insync_replicas)?;
    d.set("cleanup_policy", &topic.cleanup_policy)?;

    let config = config_for_state(topic);
    d.set("config", Some(config).filter(|c| !c.is_empty()))
}

pub struct KafkaTopicResource;

#[async_trait]
impl ResourceHandler for KafkaTopicResource {
    async fn create(&self, _ctx: &OpContext, d: &mut ResourceData, client: &AivenClient) -> Result<(), ProviderError> {
        let model = d.decode::<KafkaTopicModel>()?;
        let id = build_resource_id(&[&model.project, &model.service_name, &model.topic_name])?;

        let request = CreateKafkaTopicRequest {
            topic_name: model.topic_name.clone(),
            partitions: model.partitions,
            replication: model.replication,
            min_insync_replicas: model.minimum_in_sync_replicas,
            retention_bytes: model.retention_bytes,
            retention_hours: model.retention_hours,
            cleanup_policy: model.cleanup_policy.clone(),
            config: config_for_api(&model.config)?,
        };

        client
            .kafka_topics()
            .create(&model.project, &model.service_name, &request)
            .await
            .remote_context("cannot create kafka topic")?;

        d.set_id(id);
        Ok(())
    }

    async fn read(&self, _ctx: &OpContext, d: &mut ResourceData, client: &AivenClient) -> Result<(), ProviderError> {
        let (project, service_name, topic_name) = split_resource_id3(d.require_id()?)?;

        let topic = client
            .kafka_topics()
            .get(&project, &service_name, &topic_name)
            .await
            .remote_context("cannot get kafka topic")?;

        write_state(d, &project, &service_name, &topic)
    }

    async fn update(&self, _ctx: &OpContext, d: &mut ResourceData, client: &AivenClient) -> Result<(), ProviderError> {
        let (project, service_name, topic_name) = split_resource_id3(d.require_id()?)?;
        let model = d.decode::<KafkaTopicModel>()?;

        let request = UpdateKafkaTopicRequest {
            partitions: model.partitions,
            replication: model.replication,
            min_insync_replicas: model.minimum_in_sync_replicas,
            retention_bytes: model.retention_bytes,
            retention_hours: model.retention_hours,
            config: config_for_api(&model.config)?,
        };

        client
            .kafka_topics()
            .update(&project, &service_name, &topic_name, &request)
            .await
            .remote_context("cannot update kafka topic")
    }

    async fn delete(&self, _ctx: &OpContext, d: &mut ResourceData, client: &AivenClient) -> Result<(), ProviderError> {
        let (project, service_name, topic_name) = split_resource_id3(d.require_id()?)?;

        if d.get_bool("termination_protection").unwrap_or(false) {
            return Err(ProviderError::precondition(format!(
                "cannot delete kafka topic `{}` when termination_protection is enabled",
                topic_name
            )));
        }

        client
            .kafka_topics()
            .delete(&project, &service_name, &topic_name)
            .await
            .remote_context("cannot delete kafka topic")
    }

    fn validate_import_id(&self, id: &str) -> Result<(), ProviderError> {
        split_resource_id3(id).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::plan::Action;
    use crate::provider::ErrorKind;
    use serde_json::json;

    fn topic() -> KafkaTopic {
        serde_json::from_value(json!({
            "topic_name": "events",
            "partitions": [{"partition": 0}, {"partition": 1}, {"partition": 2}],
            "replication": 2,
            "retention_hours": 1,
            "retention_bytes": -1,
            "min_insync_replicas": 2,
            "cleanup_policy": "compact",
            "config": {
                "flush_ms": {"value": 10, "source": "topic_config"},
                "cleanup_policy": {"value": "compact", "source": "topic_config"},
                "min_cleanable_dirty_ratio": {"value": 0.01, "source": "topic_config"},
                "unclean_leader_election_enable": {"value": true, "source": "topic_config"},
                "segment_ms": {"value": 604800000, "source": "default_config"},
                "follower_replication_throttled_replicas": {"value": "", "source": "topic_config"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_config_is_parsed_into_kafka_types() {
        let raw: BTreeMap<String, String> = [
            ("flush_ms", "10"),
            ("unclean_leader_election_enable", "true"),
            ("cleanup_policy", "compact"),
            ("min_cleanable_dirty_ratio", "0.01"),
            ("delete_retention_ms", "50000"),
            ("segment_ms", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = config_for_api(&raw).unwrap();

        assert_eq!(config.flush_ms, Some(10));
        assert_eq!(config.unclean_leader_election_enable, Some(true));
        assert_eq!(config.cleanup_policy.as_deref(), Some("compact"));
        assert_eq!(config.min_cleanable_dirty_ratio, Some(0.01));
        assert_eq!(config.delete_retention_ms, Some(50000));
        assert_eq!(config.segment_ms, None);
    }

    #[test]
    fn test_invalid_config_values_are_rejected() {
        let raw = BTreeMap::from([("flush_ms".to_string(), "soon".to_string())]);
        assert_eq!(config_for_api(&raw).unwrap_err().kind(), ErrorKind::Precondition);

        let raw = BTreeMap::from([("not_a_kafka_setting".to_string(), "1".to_string())]);
        assert!(config_for_api(&raw).is_err());
    }

    #[test]
    fn test_read_keeps_only_overridden_config() {
        let config = config_for_state(&topic());

        assert_eq!(config.get("flush_ms").map(String::as_str), Some("10"));
        assert_eq!(config.get("min_cleanable_dirty_ratio").map(String::as_str), Some("0.01"));
        assert_eq!(
            config.get("unclean_leader_election_enable").map(String::as_str),
            Some("true")
        );
        assert!(!config.contains_key("segment_ms"));
        assert!(!config.contains_key("follower_replication_throttled_replicas"));
    }

    #[test]
    fn test_partitions_count_from_partition_list() {
        let def = definition();
        let mut d = def.new_data();

        write_state(&mut d, "acme-prod", "kafka-1", &topic()).unwrap();

        assert_eq!(d.get("partitions"), Some(&json!(3)));
        assert_eq!(d.get("replication"), Some(&json!(2)));
        assert_eq!(d.get("retention_bytes"), Some(&json!(-1)));
        assert_eq!(d.get("minimum_in_sync_replicas"), Some(&json!(2)));
    }

    #[test]
    fn test_read_keeps_local_termination_protection() {
        let def = definition();
        let mut d = def.new_data();
        d.set("termination_protection", true).unwrap();

        write_state(&mut d, "acme-prod", "kafka-1", &topic()).unwrap();

        assert_eq!(d.get_bool("termination_protection"), Some(true));
    }

    #[tokio::test]
    async fn test_termination_protection_blocks_delete() {
        let client = AivenClient::new("token", "http://127.0.0.1:9").unwrap();
        let def = definition();
        let mut d = def.new_data();
        d.set_id("acme-prod/kafka-1/events");
        d.set("termination_protection", true).unwrap();

        let err = KafkaTopicResource
            .delete(&def.context(crate::provider::resource::Operation::Delete), &mut d, &client)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    fn planned(prior: &ResourceData, desired: Value) -> crate::provider::plan::ResourcePlan {
        let def = definition();
        let config = def.schema.validate_config(desired.as_object().unwrap()).unwrap();
        crate::provider::plan::plan_resource(&def.schema, Some(prior), Some(&config))
    }

    fn read_back() -> ResourceData {
        let def = definition();
        let mut d = def.new_data();
        d.set_id("acme-prod/kafka-1/events");
        d.set("termination_protection", false).unwrap();
        write_state(&mut d, "acme-prod", "kafka-1", &topic()).unwrap();
        d
    }

    #[test]
    fn test_remote_overrides_without_local_config_plan_nothing() {
        let d = read_back();
        assert!(d.get_object("config").is_some());

        let plan = planned(
            &d,
            json!({
                "project": "acme-prod",
                "service_name": "kafka-1",
                "topic_name": "events",
                "partitions": 3,
                "replication": 2,
                "cleanup_policy": "compact"
            }),
        );

        assert_eq!(plan.action, Action::NoOp, "{:?}", plan.changes);
    }

    #[test]
    fn test_cleanup_policy_change_replaces_topic() {
        let d = read_back();

        let plan = planned(
            &d,
            json!({
                "project": "acme-prod",
                "service_name": "kafka-1",
                "topic_name": "events",
                "partitions": 3,
                "replication": 2,
                "cleanup_policy": "delete"
            }),
        );

        assert_eq!(plan.action, Action::Replace);
        assert!(plan
            .changes
            .iter()
            .any(|c| c.name == "cleanup_policy" && c.forces_replacement));
    }

    #[tokio::test]
    async fn test_create_rejects_separator_in_topic_name() {
        let client = AivenClient::new("token", "http://127.0.0.1:9").unwrap();
        let def = definition();
        let mut d = def.new_data();
        let config = json!({
            "project": "acme-prod",
            "service_name": "kafka-1",
            "topic_name": "events/raw",
            "partitions": 3,
            "replication": 2
        });
        d.apply_config(config.as_object().unwrap());

        let err = KafkaTopicResource
            .create(&def.context(crate::provider::resource::Operation::Create), &mut d, &client)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(d.id().is_none());
    }

    #[test]
    fn test_import_id_needs_three_components() {
        assert!(KafkaTopicResource.validate_import_id("acme-prod/kafka-1/events").is_ok());
        assert!(KafkaTopicResource.validate_import_id("acme-prod/kafka-1").is_err());
    }
}
