//! Conversion helpers between local records and API payloads

use crate::api::billing::ContactEmail;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize an optional string, treating `""` like an absent value.
///
/// Optional fields that the user left empty must not reach the API.
pub fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Normalize a string set: sorted, de-duplicated, empty entries removed
pub fn string_set<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = values
        .into_iter()
        .map(Into::into)
        .filter(|s| !s.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Contact emails as the API wants them.
///
/// For a new resource an absent set is not sent at all, so the API does not
/// create redundant empty contacts. On update an absent set clears the list.
pub fn contact_emails_for_api(
    emails: Option<Vec<String>>,
    new_resource: bool,
) -> Option<Vec<ContactEmail>> {
    match emails {
        None if new_resource => None,
        None => Some(Vec::new()),
        Some(emails) => Some(
            string_set(emails)
                .into_iter()
                .map(|email| ContactEmail { email })
                .collect(),
        ),
    }
}

/// Contact emails as stored locally
pub fn contact_emails_for_state(emails: &[ContactEmail]) -> Vec<String> {
    string_set(emails.iter().map(|e| e.email.as_str()))
}

/// Render a remote scalar the way string-typed attributes store it
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn parse_optional_string_to_i64(raw: &str) -> Result<Option<i64>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|_| format!("`{}` is not an integer", raw))
}

pub fn parse_optional_string_to_f64(raw: &str) -> Result<Option<f64>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|_| format!("`{}` is not a number", raw))
}

pub fn parse_optional_string_to_bool(raw: &str) -> Result<Option<bool>, String> {
    match raw.trim() {
        "" => Ok(None),
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        other => Err(format!("`{}` is not a bool", other)),
    }
}
