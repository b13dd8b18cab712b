//! `aiven_flink`

use super::service::{typed_definition, SERVICE_TYPE_FLINK};
use crate::provider::ResourceDefinition;

pub const TYPE_NAME: &str = "aiven_flink";

pub fn definition() -> ResourceDefinition {
    typed_definition(TYPE_NAME, "Flink service", SERVICE_TYPE_FLINK, None)
}
