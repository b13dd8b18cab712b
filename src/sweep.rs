//! Sweeper for leftover Kafka topics
//!
//! Deletes every topic of every Kafka service in a project. Used to clean
//! up after acceptance runs.

use crate::api::AivenClient;
use crate::resources::service::SERVICE_TYPE_KAFKA;
use anyhow::{Context, Result};

/// Delete all Kafka topics in `project`, returning how many were deleted.
///
/// A service whose topics cannot be listed is skipped; a failed delete
/// aborts the sweep.
pub async fn sweep_kafka_topics(client: &AivenClient, project: &str) -> Result<usize> {
    let projects = client
        .projects()
        .list_names()
        .await
        .context("error retrieving a list of projects")?;

    if !projects.iter().any(|p| p == project) {
        tracing::warn!("Project {} is not accessible, nothing to sweep", project);
        return Ok(0);
    }

    let services = client
        .services()
        .list(project)
        .await
        .with_context(|| format!("error retrieving a list of services for a project `{}`", project))?;

    let mut deleted = 0;
    for service in services.iter().filter(|s| s.service_type == SERVICE_TYPE_KAFKA) {
        let topics = match client.kafka_topics().list(project, &service.service_name).await {
            Ok(topics) => topics,
            Err(e) => {
                tracing::error!(
                    "error retrieving a list of kafka topics for a service `{}`: {}",
                    service.service_name,
                    e
                );
                continue;
            },
        };

        for topic in topics {
            client
                .kafka_topics()
                .delete(project, &service.service_name, &topic.topic_name)
                .await
                .with_context(|| format!("error destroying kafka topic {} during sweep", topic.topic_name))?;
            tracing::info!("Swept kafka topic {}/{}", service.service_name, topic.topic_name);
            deleted += 1;
        }
    }

    Ok(deleted)
}
