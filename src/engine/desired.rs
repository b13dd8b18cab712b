//! Desired configuration and dependency ordering

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// One resource block of the desired configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DesiredResource {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Addresses that must be applied before this one
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// The desired configuration file (YAML or JSON)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DesiredConfig {
    #[serde(default)]
    pub resources: BTreeMap<String, DesiredResource>,
}

impl DesiredConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("cannot parse configuration {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: DesiredConfig = serde_yaml::from_str(content)?;
        for (address, resource) in &config.resources {
            for dependency in &resource.depends_on {
                if !config.resources.contains_key(dependency) {
                    bail!("{} depends on unknown resource `{}`", address, dependency);
                }
            }
        }
        Ok(config)
    }

    /// Addresses grouped into waves that can run concurrently
    pub fn waves(&self) -> Result<Vec<Vec<String>>> {
        let graph = self
            .resources
            .iter()
            .map(|(address, r)| (address.clone(), r.depends_on.clone()))
            .collect();
        dependency_waves(&graph)
    }
}

/// Order nodes so every node comes in a later wave than its dependencies.
///
/// Dependencies on addresses outside the graph are ignored.
pub fn dependency_waves(graph: &BTreeMap<String, Vec<String>>) -> Result<Vec<Vec<String>>> {
    let mut done: BTreeSet<&str> = BTreeSet::new();
    let mut waves = Vec::new();

    while done.len() < graph.len() {
        let wave: Vec<String> = graph
            .iter()
            .filter(|(address, _)| !done.contains(address.as_str()))
            .filter(|(_, deps)| {
                deps.iter()
                    .all(|d| done.contains(d.as_str()) || !graph.contains_key(d))
            })
            .map(|(address, _)| address.clone())
            .collect();

        if wave.is_empty() {
            let pending: Vec<&str> = graph
                .keys()
                .map(String::as_str)
                .filter(|a| !done.contains(a))
                .collect();
            bail!("dependency cycle between {}", pending.join(", "));
        }

        for address in &wave {
            if let Some((key, _)) = graph.get_key_value(address) {
                done.insert(key.as_str());
            }
        }
        waves.push(wave);
    }

    Ok(waves)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
resources:
  aiven_service.bar:
    type: aiven_service
    attributes:
      project: acme-prod
      service_name: kafka-1
      service_type: kafka
      plan: business-4
  aiven_kafka_topic.foo:
    type: aiven_kafka_topic
    depends_on: [aiven_service.bar]
    attributes:
      project: acme-prod
      service_name: kafka-1
      topic_name: events
      partitions: 3
      replication: 2
      config:
        flush_ms: 10
        cleanup_policy: compact
"#;

    #[test]
    fn test_parse_yaml() {
        let config = DesiredConfig::parse(CONFIG).unwrap();
        let topic = &config.resources["aiven_kafka_topic.foo"];
        assert_eq!(topic.type_name, "aiven_kafka_topic");
        assert_eq!(topic.attributes["partitions"], 3);
        assert_eq!(topic.depends_on, vec!["aiven_service.bar".to_string()]);
    }

    #[test]
    fn test_json_is_accepted() {
        let config = DesiredConfig::parse(
            r#"{"resources": {"aiven_billing_group.acme": {"type": "aiven_billing_group", "attributes": {"name": "acme"}}}}"#,
        )
        .unwrap();
        assert_eq!(config.resources.len(), 1);
    }

    #[test]
    fn test_unknown_dependency_is_rejected() {
        let err = DesiredConfig::parse(
            "resources:\n  a.b:\n    type: aiven_flink\n    depends_on: [c.d]\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown resource `c.d`"));
    }

    #[test]
    fn test_waves_follow_dependencies() {
        let waves = DesiredConfig::parse(CONFIG).unwrap().waves().unwrap();
        assert_eq!(
            waves,
            vec![
                vec!["aiven_service.bar".to_string()],
                vec!["aiven_kafka_topic.foo".to_string()],
            ]
        );
    }

    #[test]
    fn test_cycle_is_reported() {
        let graph = BTreeMap::from([
            ("a".to_string(), vec!["b".to_string()]),
            ("b".to_string(), vec!["a".to_string()]),
        ]);
        assert!(dependency_waves(&graph).is_err());
    }
}
