//! Aiven API interaction module
//!
//! This module provides typed access to the Aiven REST API. Every remote
//! domain gets its own handler borrowed from [`client::AivenClient`].
//!
//! # Module Structure
//!
//! - [`client`] - Main client holding the token and endpoint
//! - [`http`] - HTTP utilities and the [`http::ApiError`] type
//! - [`billing`] - Billing groups
//! - [`cards`] - Payment cards and short card id resolution
//! - [`projects`] - Project listing
//! - [`services`] - Managed services (Kafka, Flink, Redis, Elasticsearch, ...)
//! - [`kafka_topics`] - Kafka topics of a service
//!
//! # Example
//!
//! ```ignore
//! use aiven_provider::api::client::AivenClient;
//!
//! async fn example() -> Result<(), aiven_provider::api::http::ApiError> {
//!     let client = AivenClient::new("token", "https://api.aiven.io/v1")?;
//!     let topics = client.kafka_topics().list("my-project", "kafka-1").await?;
//!     Ok(())
//! }
//! ```

pub mod billing;
pub mod cards;
pub mod client;
pub mod http;
pub mod kafka_topics;
pub mod projects;
pub mod services;

pub use client::AivenClient;
pub use http::ApiError;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Unwrap `{"<key>": {...}}` responses, accepting a bare object as well
pub(crate) fn unwrap_envelope<T: DeserializeOwned>(response: Value, key: &str) -> Result<T, ApiError> {
    let inner = match response {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or(Value::Null),
        other => other,
    };
    Ok(serde_json::from_value(inner)?)
}
