//! Built-in resource types
//!
//! Each module declares a schema, a typed model of the user-supplied
//! attributes and a [`ResourceHandler`](crate::provider::ResourceHandler)
//! translating between the model and the API.

pub mod billing_group;
pub mod elasticsearch;
pub mod flink;
pub mod kafka_topic;
pub mod redis;
pub mod service;

use crate::provider::ResourceDefinition;

/// Every resource type the provider registers at startup
pub fn all() -> Vec<ResourceDefinition> {
    vec![
        billing_group::definition(),
        service::definition(),
        flink::definition(),
        redis::definition(),
        elasticsearch::definition(),
        kafka_topic::definition(),
    ]
}
