//! Planning: compare a desired configuration with the current record

use super::data::ResourceData;
use crate::schema::{is_empty_value, Mode, Schema};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    NoOp,
    Create,
    Update,
    /// Delete then create, because a force-new attribute changed
    Replace,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Action::NoOp => " ",
            Action::Create => "+",
            Action::Update => "~",
            Action::Replace => "-/+",
            Action::Delete => "-",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeChange {
    pub name: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub forces_replacement: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourcePlan {
    pub action: Action,
    pub changes: Vec<AttributeChange>,
}

impl ResourcePlan {
    fn no_op() -> Self {
        Self {
            action: Action::NoOp,
            changes: Vec::new(),
        }
    }
}

/// Plan one instance.
///
/// `desired` must already be normalized by [`Schema::validate_config`], so
/// sets compare independent of the order the user wrote them in.
pub fn plan_resource(
    schema: &Schema,
    prior: Option<&ResourceData>,
    desired: Option<&Map<String, Value>>,
) -> ResourcePlan {
    let prior = prior.filter(|d| d.id().is_some());

    match (prior, desired) {
        (None, None) => ResourcePlan::no_op(),
        (Some(_), None) => ResourcePlan {
            action: Action::Delete,
            changes: Vec::new(),
        },
        (None, Some(desired)) => ResourcePlan {
            action: Action::Create,
            changes: desired
                .iter()
                .map(|(name, value)| AttributeChange {
                    name: name.clone(),
                    old: None,
                    new: Some(value.clone()),
                    forces_replacement: false,
                })
                .collect(),
        },
        (Some(prior), Some(desired)) => plan_existing(schema, prior, desired),
    }
}

fn plan_existing(schema: &Schema, prior: &ResourceData, desired: &Map<String, Value>) -> ResourcePlan {
    let mut changes = Vec::new();

    for (name, attribute) in schema.iter() {
        if !attribute.is_configurable() {
            continue;
        }

        let wanted = desired
            .get(name)
            .filter(|v| !v.is_null())
            .or(attribute.default.as_ref());

        if wanted.is_none() && attribute.mode == Mode::OptionalComputed {
            continue;
        }

        if let Some(rule) = attribute.diff_suppress {
            if rule.suppresses(wanted.unwrap_or(&Value::Null)) {
                continue;
            }
        }

        let current = prior.get(name);
        if same_value(current, wanted) {
            continue;
        }

        changes.push(AttributeChange {
            name: name.to_string(),
            old: current.cloned(),
            new: wanted.cloned(),
            forces_replacement: attribute.force_new,
        });
    }

    let action = if changes.iter().any(|c| c.forces_replacement) {
        Action::Replace
    } else if changes.is_empty() {
        Action::NoOp
    } else {
        Action::Update
    };

    ResourcePlan { action, changes }
}

fn same_value(current: Option<&Value>, wanted: Option<&Value>) -> bool {
    match (current, wanted) {
        (Some(a), Some(b)) => a == b || (is_empty_value(a) && is_empty_value(b)),
        (Some(v), None) | (None, Some(v)) => is_empty_value(v),
        (None, None) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeType, DiffSuppress};
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> Schema {
        Schema::new()
            .with("project", Attribute::required(AttributeType::String).force_new())
            .with("emails", Attribute::optional(AttributeType::set_of(AttributeType::String)))
            .with("plan", Attribute::optional_computed(AttributeType::String))
            .with(
                "vat_id",
                Attribute::optional(AttributeType::String).suppress(DiffSuppress::WhenUnset),
            )
            .with(
                "redis_user_config",
                Attribute::optional(AttributeType::Object).suppress(DiffSuppress::EmptyObject),
            )
            .with("state", Attribute::computed(AttributeType::String))
    }

    fn prior(attributes: Value) -> ResourceData {
        let mut d = ResourceData::from_parts(
            "test_resource",
            Arc::new(schema()),
            Some("acme".to_string()),
            Map::new(),
        );
        for (k, v) in attributes.as_object().unwrap() {
            d.set(k, v).unwrap();
        }
        d
    }

    fn desired(config: Value) -> Map<String, Value> {
        schema().validate_config(config.as_object().unwrap()).unwrap()
    }

    #[test]
    fn test_new_instance_is_created() {
        let config = desired(json!({"project": "acme"}));
        let plan = plan_resource(&schema(), None, Some(&config));
        assert_eq!(plan.action, Action::Create);
        assert_eq!(plan.changes.len(), 1);
    }

    #[test]
    fn test_removed_instance_is_deleted() {
        let current = prior(json!({"project": "acme"}));
        let plan = plan_resource(&schema(), Some(&current), None);
        assert_eq!(plan.action, Action::Delete);
    }

    #[test]
    fn test_set_order_does_not_produce_a_diff() {
        let current = prior(json!({"project": "acme", "emails": ["a@acme.test", "b@acme.test"]}));
        let config = desired(json!({"project": "acme", "emails": ["b@acme.test", "a@acme.test"]}));
        let plan = plan_resource(&schema(), Some(&current), Some(&config));
        assert_eq!(plan.action, Action::NoOp);
    }

    #[test]
    fn test_computed_and_optional_computed_keep_current_value() {
        let current = prior(json!({"project": "acme", "plan": "business-4", "state": "RUNNING"}));
        let config = desired(json!({"project": "acme"}));
        let plan = plan_resource(&schema(), Some(&current), Some(&config));
        assert_eq!(plan.action, Action::NoOp);
    }

    #[test]
    fn test_suppressed_attributes_do_not_diff_when_unset() {
        let current = prior(json!({
            "project": "acme",
            "vat_id": "FI123",
            "redis_user_config": {"maxmemory_policy": "allkeys-lru"}
        }));
        let config = desired(json!({"project": "acme", "vat_id": "", "redis_user_config": {}}));
        let plan = plan_resource(&schema(), Some(&current), Some(&config));
        assert_eq!(plan.action, Action::NoOp);
    }

    #[test]
    fn test_removed_optional_value_is_an_update() {
        let current = prior(json!({"project": "acme", "emails": ["a@acme.test"]}));
        let config = desired(json!({"project": "acme"}));
        let plan = plan_resource(&schema(), Some(&current), Some(&config));
        assert_eq!(plan.action, Action::Update);
        assert_eq!(plan.changes[0].name, "emails");
        assert_eq!(plan.changes[0].new, None);
    }

    #[test]
    fn test_force_new_change_replaces() {
        let current = prior(json!({"project": "acme", "emails": ["a@acme.test"]}));
        let config = desired(json!({"project": "acme-prod", "emails": ["x@acme.test"]}));
        let plan = plan_resource(&schema(), Some(&current), Some(&config));
        assert_eq!(plan.action, Action::Replace);
        assert!(plan
            .changes
            .iter()
            .any(|c| c.name == "project" && c.forces_replacement));
    }

    #[test]
    fn test_record_without_id_is_recreated() {
        let mut current = prior(json!({"project": "acme"}));
        current.clear_id();
        let config = desired(json!({"project": "acme"}));
        let plan = plan_resource(&schema(), Some(&current), Some(&config));
        assert_eq!(plan.action, Action::Create);
    }
}
