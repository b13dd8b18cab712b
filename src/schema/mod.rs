//! Resource schemas
//!
//! A schema is a declarative table of attributes built once per resource type
//! when the provider starts. It drives three things:
//!
//! - validation and normalization of user configuration
//! - type checking of every value a handler writes into a record
//! - the diff rules used when planning (force-new, diff suppression)
//!
//! # Example
//!
//! ```ignore
//! use aiven_provider::schema::{Attribute, AttributeType, Schema};
//!
//! let schema = Schema::new()
//!     .with("name", Attribute::required(AttributeType::String).description("Name"))
//!     .with("state", Attribute::computed(AttributeType::String));
//! ```

pub mod mapping;

use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Value type of an attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int,
    Float,
    Bool,
    /// Ordered list
    List(Box<AttributeType>),
    /// Unordered collection, stored sorted and de-duplicated
    Set(Box<AttributeType>),
    /// String-keyed map with uniform value type
    Map(Box<AttributeType>),
    /// Free-form JSON object
    Object,
}

impl AttributeType {
    pub fn list_of(elem: AttributeType) -> Self {
        AttributeType::List(Box::new(elem))
    }

    pub fn set_of(elem: AttributeType) -> Self {
        AttributeType::Set(Box::new(elem))
    }

    pub fn map_of(elem: AttributeType) -> Self {
        AttributeType::Map(Box::new(elem))
    }

    /// Coerce a value into this type, the way the configuration language does.
    ///
    /// `null` is accepted by every type and means "unset".
    pub fn coerce(&self, value: &Value) -> Result<Value, String> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(value.clone()),
            (AttributeType::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (AttributeType::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),

            (AttributeType::Int, Value::Number(n)) => match n.as_i64() {
                Some(i) => Ok(Value::from(i)),
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Ok(Value::from(f as i64))
                    },
                    _ => Err(format!("expected an integer, got {}", n)),
                },
            },
            (AttributeType::Int, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("expected an integer, got \"{}\"", s)),

            (AttributeType::Float, Value::Number(n)) => n
                .as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("expected a number, got {}", n)),
            (AttributeType::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("expected a number, got \"{}\"", s)),

            (AttributeType::Bool, Value::Bool(_)) => Ok(value.clone()),
            (AttributeType::Bool, Value::String(s)) => match s.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(format!("expected a bool, got \"{}\"", s)),
            },

            (AttributeType::List(elem), Value::Array(items)) => items
                .iter()
                .map(|item| elem.coerce(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),

            (AttributeType::Set(elem), Value::Array(items)) => {
                let mut items = items
                    .iter()
                    .map(|item| elem.coerce(item))
                    .collect::<Result<Vec<_>, _>>()?;
                items.sort_by_key(canonical_key);
                items.dedup();
                Ok(Value::Array(items))
            },

            (AttributeType::Map(elem), Value::Object(map)) => map
                .iter()
                .map(|(k, v)| elem.coerce(v).map(|v| (k.clone(), v)))
                .collect::<Result<Map<_, _>, _>>()
                .map(Value::Object),

            (AttributeType::Object, Value::Object(_)) => Ok(value.clone()),

            (ty, other) => Err(format!("expected {}, got {}", ty.name(), type_name(other))),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AttributeType::String => "a string",
            AttributeType::Int => "an integer",
            AttributeType::Float => "a number",
            AttributeType::Bool => "a bool",
            AttributeType::List(_) => "a list",
            AttributeType::Set(_) => "a set",
            AttributeType::Map(_) => "a map",
            AttributeType::Object => "an object",
        }
    }
}

fn canonical_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Whether a value counts as "not set": null, "", [] or {}
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Who supplies the value of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Required,
    Optional,
    /// Only the remote side sets it
    Computed,
    /// The user may set it, otherwise the remote side does
    OptionalComputed,
}

/// Rules for ignoring a difference between desired and current values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffSuppress {
    /// No diff while the attribute is unset or empty in the configuration
    WhenUnset,
    /// No diff while the configured object is empty
    EmptyObject,
}

impl DiffSuppress {
    pub fn suppresses(&self, desired: &Value) -> bool {
        match self {
            DiffSuppress::WhenUnset => is_empty_value(desired),
            DiffSuppress::EmptyObject => {
                desired.is_null() || desired.as_object().is_some_and(|o| o.is_empty())
            },
        }
    }
}

/// One attribute of a resource schema
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub ty: AttributeType,
    pub mode: Mode,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force_new: bool,
    /// Never sent to or read from the remote API
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub local_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_suppress: Option<DiffSuppress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Attribute {
    fn with_mode(ty: AttributeType, mode: Mode) -> Self {
        Self {
            ty,
            mode,
            description: String::new(),
            sensitive: false,
            force_new: false,
            local_only: false,
            diff_suppress: None,
            default: None,
        }
    }

    pub fn required(ty: AttributeType) -> Self {
        Self::with_mode(ty, Mode::Required)
    }

    pub fn optional(ty: AttributeType) -> Self {
        Self::with_mode(ty, Mode::Optional)
    }

    pub fn computed(ty: AttributeType) -> Self {
        Self::with_mode(ty, Mode::Computed)
    }

    pub fn optional_computed(ty: AttributeType) -> Self {
        Self::with_mode(ty, Mode::OptionalComputed)
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Changing the attribute replaces the remote resource
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn local_only(mut self) -> Self {
        self.local_only = true;
        self
    }

    pub fn suppress(mut self, rule: DiffSuppress) -> Self {
        self.diff_suppress = Some(rule);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// The user may write this attribute
    pub fn is_configurable(&self) -> bool {
        self.mode != Mode::Computed
    }
}

/// Problem found while validating a configuration against a schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("unsupported attribute `{0}`")]
    Unknown(String),
    #[error("missing required attribute `{0}`")]
    MissingRequired(String),
    #[error("attribute `{0}` is computed and cannot be set")]
    ComputedOnly(String),
    #[error("invalid value for `{name}`: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Attribute table of one resource type
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schema {
    attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, attribute: Attribute) -> Self {
        self.insert(name, attribute);
        self
    }

    pub fn insert(&mut self, name: &str, attribute: Attribute) {
        self.attributes.insert(name.to_string(), attribute);
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Validate a user configuration and return it normalized.
    ///
    /// All problems are collected rather than stopping at the first one.
    pub fn validate_config(&self, config: &Map<String, Value>) -> Result<Map<String, Value>, Vec<SchemaError>> {
        let mut errors = Vec::new();
        let mut normalized = Map::new();

        for (name, value) in config {
            let Some(attribute) = self.attributes.get(name) else {
                errors.push(SchemaError::Unknown(name.clone()));
                continue;
            };

            if !attribute.is_configurable() {
                errors.push(SchemaError::ComputedOnly(name.clone()));
                continue;
            }

            match attribute.ty.coerce(value) {
                Ok(Value::Null) => {},
                Ok(v) => {
                    normalized.insert(name.clone(), v);
                },
                Err(reason) => errors.push(SchemaError::InvalidValue {
                    name: name.clone(),
                    reason,
                }),
            }
        }

        for (name, attribute) in &self.attributes {
            if attribute.mode == Mode::Required && !normalized.contains_key(name) {
                errors.push(SchemaError::MissingRequired(name.clone()));
            }
        }

        if errors.is_empty() {
            Ok(normalized)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new()
            .with("name", Attribute::required(AttributeType::String))
            .with("partitions", Attribute::optional(AttributeType::Int))
            .with("emails", Attribute::optional(AttributeType::set_of(AttributeType::String)))
            .with("state", Attribute::computed(AttributeType::String))
    }

    #[test]
    fn test_set_values_are_sorted_and_deduplicated() {
        let value = AttributeType::set_of(AttributeType::String)
            .coerce(&json!(["b@x.io", "a@x.io", "b@x.io"]))
            .unwrap();
        assert_eq!(value, json!(["a@x.io", "b@x.io"]));
    }

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(AttributeType::Int.coerce(&json!("3")).unwrap(), json!(3));
        assert_eq!(AttributeType::Int.coerce(&json!(3.0)).unwrap(), json!(3));
        assert_eq!(AttributeType::String.coerce(&json!(10)).unwrap(), json!("10"));
        assert_eq!(AttributeType::Bool.coerce(&json!("true")).unwrap(), json!(true));
        assert!(AttributeType::Int.coerce(&json!(1.5)).is_err());
        assert!(AttributeType::Object.coerce(&json!("x")).is_err());
    }

    #[test]
    fn test_map_of_strings_stringifies_values() {
        let value = AttributeType::map_of(AttributeType::String)
            .coerce(&json!({"flush_ms": 10, "unclean_leader_election_enable": true}))
            .unwrap();
        assert_eq!(
            value,
            json!({"flush_ms": "10", "unclean_leader_election_enable": "true"})
        );
    }

    #[test]
    fn test_validate_config_collects_every_error() {
        let config = json!({
            "partitions": "many",
            "state": "RUNNING",
            "bogus": 1
        });

        let errors = schema()
            .validate_config(config.as_object().unwrap())
            .unwrap_err();

        assert!(errors.contains(&SchemaError::Unknown("bogus".to_string())));
        assert!(errors.contains(&SchemaError::ComputedOnly("state".to_string())));
        assert!(errors.contains(&SchemaError::MissingRequired("name".to_string())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, SchemaError::InvalidValue { name, .. } if name == "partitions")));
    }

    #[test]
    fn test_validate_config_drops_nulls() {
        let config = json!({"name": "acme", "partitions": null});
        let normalized = schema().validate_config(config.as_object().unwrap()).unwrap();
        assert_eq!(Value::Object(normalized), json!({"name": "acme"}));
    }

    #[test]
    fn test_diff_suppress_rules() {
        assert!(DiffSuppress::WhenUnset.suppresses(&json!("")));
        assert!(DiffSuppress::WhenUnset.suppresses(&json!([])));
        assert!(!DiffSuppress::WhenUnset.suppresses(&json!("EUR")));
        assert!(DiffSuppress::EmptyObject.suppresses(&json!({})));
        assert!(!DiffSuppress::EmptyObject.suppresses(&json!({"a": 1})));
    }
}
