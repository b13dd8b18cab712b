//! Local state record of one resource instance

use super::error::ProviderError;
use crate::schema::{Mode, Schema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// The attribute record the orchestrator persists for one instance.
///
/// Handlers decode it into their typed model and write remote values back
/// field by field through [`ResourceData::set`], which checks every write
/// against the schema.
#[derive(Debug, Clone)]
pub struct ResourceData {
    type_name: String,
    schema: Arc<Schema>,
    id: Option<String>,
    attributes: Map<String, Value>,
}

impl ResourceData {
    pub fn new(type_name: &str, schema: Arc<Schema>) -> Self {
        Self {
            type_name: type_name.to_string(),
            schema,
            id: None,
            attributes: Map::new(),
        }
    }

    /// Rebuild a record from persisted state
    pub fn from_parts(
        type_name: &str,
        schema: Arc<Schema>,
        id: Option<String>,
        attributes: Map<String, Value>,
    ) -> Self {
        Self {
            type_name: type_name.to_string(),
            schema,
            id: id.filter(|id| !id.is_empty()),
            attributes,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The id, or a precondition failure when the record has none
    pub fn require_id(&self) -> Result<&str, ProviderError> {
        self.id.as_deref().ok_or_else(|| {
            ProviderError::precondition(format!("{} has no id", self.type_name))
        })
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into()).filter(|id| !id.is_empty());
    }

    /// Mark the instance as gone from the remote side
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    /// A non-empty object attribute
    pub fn get_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key)
            .and_then(|v| v.as_object())
            .filter(|o| !o.is_empty())
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn into_parts(self) -> (Option<String>, Map<String, Value>) {
        (self.id, self.attributes)
    }

    /// Decode the attributes into a typed model
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ProviderError> {
        serde_json::from_value(Value::Object(self.attributes.clone())).map_err(|e| {
            ProviderError::precondition(format!("invalid {} attributes: {}", self.type_name, e))
        })
    }

    /// Write one attribute. `None`/`null` unsets it.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), ProviderError> {
        let Some(attribute) = self.schema.get(key) else {
            return Err(ProviderError::LocalWriteFailure {
                key: key.to_string(),
                reason: format!("not an attribute of {}", self.type_name),
            });
        };

        let raw = serde_json::to_value(value).map_err(|e| ProviderError::LocalWriteFailure {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let value = attribute
            .ty
            .coerce(&raw)
            .map_err(|reason| ProviderError::LocalWriteFailure {
                key: key.to_string(),
                reason,
            })?;

        if value.is_null() {
            self.attributes.remove(key);
        } else {
            self.attributes.insert(key.to_string(), value);
        }
        Ok(())
    }

    /// Current values of the local-only attributes
    pub fn local_values(&self) -> Map<String, Value> {
        self.schema
            .iter()
            .filter(|(_, attribute)| attribute.local_only)
            .filter_map(|(name, _)| self.get(name).map(|v| (name.to_string(), v.clone())))
            .collect()
    }

    /// Put local-only attributes back after a remote read. Attributes missing
    /// from `saved` get their default.
    pub fn restore_local_values(&mut self, mut saved: Map<String, Value>) {
        let schema = Arc::clone(&self.schema);
        for (name, attribute) in schema.iter().filter(|(_, a)| a.local_only) {
            match saved.remove(name).or_else(|| attribute.default.clone()) {
                Some(value) => {
                    self.attributes.insert(name.to_string(), value);
                },
                None => {
                    self.attributes.remove(name);
                },
            }
        }
    }

    /// Overlay a validated configuration onto the record.
    ///
    /// Configured values win. Unset configurable attributes fall back to
    /// their default, or are dropped unless the remote side may compute them.
    /// Computed attributes are left untouched.
    pub fn apply_config(&mut self, config: &Map<String, Value>) {
        let schema = Arc::clone(&self.schema);
        for (name, attribute) in schema.iter() {
            if !attribute.is_configurable() {
                continue;
            }

            match config.get(name).filter(|v| !v.is_null()) {
                Some(value) => {
                    self.attributes.insert(name.to_string(), value.clone());
                },
                None => match &attribute.default {
                    Some(default) => {
                        self.attributes.insert(name.to_string(), default.clone());
                    },
                    None if attribute.mode != Mode::OptionalComputed => {
                        self.attributes.remove(name);
                    },
                    None => {},
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::error::ErrorKind;
    use crate::schema::{Attribute, AttributeType};
    use serde_json::json;

    fn data() -> ResourceData {
        let schema = Schema::new()
            .with("name", Attribute::required(AttributeType::String))
            .with("emails", Attribute::optional(AttributeType::set_of(AttributeType::String)))
            .with("plan", Attribute::optional_computed(AttributeType::String))
            .with(
                "termination_protection",
                Attribute::optional(AttributeType::Bool).default_value(false),
            )
            .with("state", Attribute::computed(AttributeType::String));
        ResourceData::new("test_resource", Arc::new(schema))
    }

    #[test]
    fn test_set_rejects_unknown_attribute() {
        let mut d = data();
        let err = d.set("bogus", "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocalWriteFailure);
    }

    #[test]
    fn test_set_rejects_type_mismatch() {
        let mut d = data();
        let err = d.set("emails", json!({"a": 1})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocalWriteFailure);
    }

    #[test]
    fn test_set_none_unsets() {
        let mut d = data();
        d.set("name", "acme").unwrap();
        d.set("name", Option::<String>::None).unwrap();
        assert!(d.get("name").is_none());
    }

    #[test]
    fn test_set_normalizes_sets() {
        let mut d = data();
        d.set("emails", vec!["b@x.io", "a@x.io"]).unwrap();
        assert_eq!(d.get("emails"), Some(&json!(["a@x.io", "b@x.io"])));
    }

    #[test]
    fn test_local_values_survive_remote_writes() {
        let schema = Schema::new()
            .with("state", Attribute::computed(AttributeType::String))
            .with(
                "guard",
                Attribute::optional(AttributeType::Bool).local_only().default_value(false),
            );
        let mut d = ResourceData::new("test_resource", Arc::new(schema));
        d.set("guard", true).unwrap();

        let saved = d.local_values();
        d.set("guard", false).unwrap();
        d.set("state", "RUNNING").unwrap();
        d.restore_local_values(saved);

        assert_eq!(d.get_bool("guard"), Some(true));
        assert_eq!(d.get_str("state"), Some("RUNNING"));

        d.restore_local_values(Map::new());
        assert_eq!(d.get_bool("guard"), Some(false));
    }

    #[test]
    fn test_empty_id_is_no_id() {
        let mut d = data();
        d.set_id("");
        assert!(d.id().is_none());
        assert!(d.require_id().is_err());
    }

    #[test]
    fn test_apply_config_keeps_computed_values() {
        let mut d = data();
        d.set("name", "old").unwrap();
        d.set("plan", "business-4").unwrap();
        d.set("state", "RUNNING").unwrap();
        d.set("emails", vec!["a@x.io"]).unwrap();

        let config = json!({"name": "new"});
        d.apply_config(config.as_object().unwrap());

        assert_eq!(d.get_str("name"), Some("new"));
        assert_eq!(d.get_str("plan"), Some("business-4"));
        assert_eq!(d.get_str("state"), Some("RUNNING"));
        assert_eq!(d.get_bool("termination_protection"), Some(false));
        assert!(d.get("emails").is_none());
    }
}
