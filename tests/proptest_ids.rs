//! Property-based tests using proptest
//!
//! These tests verify composite ids, set normalization and planning
//! stability using randomized inputs.

use aiven_provider::provider::id::{build_resource_id, split_resource_id2, split_resource_id3};
use aiven_provider::provider::plan::{plan_resource, Action};
use aiven_provider::resources::billing_group;
use aiven_provider::schema::mapping::{contact_emails_for_api, contact_emails_for_state, string_set};
use aiven_provider::schema::AttributeType;
use proptest::prelude::*;
use serde_json::{json, Value};

/// Generate a valid id component (project, service or topic name)
fn arb_component() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.-]{0,40}"
}

/// Generate an email-like string
fn arb_email() -> impl Strategy<Value = String> {
    ("[a-z]{1,8}", "[a-z]{1,8}").prop_map(|(user, domain)| format!("{}@{}.test", user, domain))
}

/// Generate a list of emails together with a shuffled copy of it
fn arb_emails_and_shuffle() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    prop::collection::vec(arb_email(), 0..8).prop_flat_map(|emails| {
        let shuffled = Just(emails.clone()).prop_shuffle();
        (Just(emails), shuffled)
    })
}

proptest! {
    /// Building then splitting a three part id gives back the parts
    #[test]
    fn id3_round_trip(project in arb_component(), service in arb_component(), topic in arb_component()) {
        let id = build_resource_id(&[&project, &service, &topic]).unwrap();
        let (p, s, t) = split_resource_id3(&id).unwrap();
        prop_assert_eq!(p, project);
        prop_assert_eq!(s, service);
        prop_assert_eq!(t, topic);
    }

    /// A two part id never splits as three parts and vice versa
    #[test]
    fn id_arity_is_enforced(project in arb_component(), service in arb_component()) {
        let id = build_resource_id(&[&project, &service]).unwrap();
        prop_assert!(split_resource_id2(&id).is_ok());
        prop_assert!(split_resource_id3(&id).is_err());

        let with_topic = format!("{}/", id);
        prop_assert!(split_resource_id3(&with_topic).is_err());
    }

    /// A component containing the separator is rejected instead of
    /// producing an id that splits differently
    #[test]
    fn separator_in_component_is_rejected(project in arb_component(), left in arb_component(), right in arb_component()) {
        let service = format!("{}/{}", left, right);
        prop_assert!(build_resource_id(&[&project, &service]).is_err());
    }

    /// Normalized sets do not depend on input order
    #[test]
    fn string_set_ignores_order((emails, shuffled) in arb_emails_and_shuffle()) {
        prop_assert_eq!(string_set(emails.clone()), string_set(shuffled));
    }

    /// Normalizing twice changes nothing
    #[test]
    fn string_set_is_idempotent(values in prop::collection::vec("[a-z]{0,4}", 0..16)) {
        let once = string_set(values);
        prop_assert_eq!(string_set(once.clone()), once.clone());
        prop_assert!(once.iter().all(|v| !v.is_empty()));
    }

    /// Emails sent to the API come back as the same normalized set
    #[test]
    fn contact_emails_survive_the_api(emails in prop::collection::vec(arb_email(), 0..8), new_resource in any::<bool>()) {
        let sent = contact_emails_for_api(Some(emails.clone()), new_resource).unwrap();
        prop_assert_eq!(contact_emails_for_state(&sent), string_set(emails));
    }

    /// Set-typed attributes coerce to the same value regardless of order
    #[test]
    fn set_coercion_ignores_order((emails, shuffled) in arb_emails_and_shuffle()) {
        let ty = AttributeType::set_of(AttributeType::String);
        let a = ty.coerce(&json!(emails)).unwrap();
        let b = ty.coerce(&json!(shuffled)).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Reordering billing emails in the configuration never plans a change
    #[test]
    fn reordered_billing_emails_plan_nothing((emails, shuffled) in arb_emails_and_shuffle()) {
        let def = billing_group::definition();

        let mut attributes = serde_json::Map::new();
        attributes.insert("name".to_string(), json!("acme"));
        attributes.insert("billing_emails".to_string(), json!(string_set(emails)));
        let prior = def.data_from(Some("bg-1".to_string()), attributes);

        let desired = json!({"name": "acme", "billing_emails": shuffled});
        let config = def
            .schema
            .validate_config(desired.as_object().unwrap())
            .unwrap();

        let plan = plan_resource(&def.schema, Some(&prior), Some(&config));
        prop_assert_eq!(plan.action, Action::NoOp);
    }

    /// Integers in string form coerce to the same integer
    #[test]
    fn int_coercion_accepts_strings(n in any::<i64>()) {
        let coerced = AttributeType::Int.coerce(&Value::String(n.to_string())).unwrap();
        prop_assert_eq!(coerced, json!(n));
    }
}
