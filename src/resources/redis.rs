//! `aiven_redis`

use super::service::{typed_definition, SERVICE_TYPE_REDIS};
use crate::api::services::Service;
use crate::provider::ResourceDefinition;
use serde_json::{Map, Value};

pub const TYPE_NAME: &str = "aiven_redis";

pub fn definition() -> ResourceDefinition {
    typed_definition(TYPE_NAME, "Redis service", SERVICE_TYPE_REDIS, Some(provided_values))
}

/// Redis exposes no server provided values yet, the block is always empty
fn provided_values(_service: &Service) -> Map<String, Value> {
    Map::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Mode;

    #[test]
    fn test_redis_schema() {
        let def = definition();
        assert!(def.schema.contains("redis_user_config"));
        assert_eq!(def.schema.get("redis").unwrap().mode, Mode::Computed);
    }
}
