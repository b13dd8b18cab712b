//! Composite resource identifiers
//!
//! Child resources are identified by their parents' names and their own,
//! joined with [`ID_SEPARATOR`]: `project/service` or
//! `project/service/topic`.

use super::error::ProviderError;

pub const ID_SEPARATOR: char = '/';

/// Join id components. A component containing the separator could not be
/// split back and is rejected.
pub fn build_resource_id(parts: &[&str]) -> Result<String, ProviderError> {
    if let Some(part) = parts.iter().find(|p| p.is_empty() || p.contains(ID_SEPARATOR)) {
        return Err(ProviderError::precondition(format!(
            "invalid id component `{}`: must be non-empty and must not contain `{}`",
            part, ID_SEPARATOR
        )));
    }
    Ok(parts.join(&ID_SEPARATOR.to_string()))
}

/// Split an id into exactly `N` non-empty components
pub fn split_resource_id<const N: usize>(id: &str) -> Result<[String; N], ProviderError> {
    let parts: Vec<&str> = id.split(ID_SEPARATOR).collect();

    if parts.len() != N || parts.iter().any(|p| p.is_empty()) {
        return Err(ProviderError::precondition(format!(
            "invalid resource id `{}`: expected {} components separated by `{}`",
            id, N, ID_SEPARATOR
        )));
    }

    Ok(std::array::from_fn(|i| parts[i].to_string()))
}

pub fn split_resource_id2(id: &str) -> Result<(String, String), ProviderError> {
    let [a, b] = split_resource_id::<2>(id)?;
    Ok((a, b))
}

pub fn split_resource_id3(id: &str) -> Result<(String, String, String), ProviderError> {
    let [a, b, c] = split_resource_id::<3>(id)?;
    Ok((a, b, c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_split_three() {
        let id = build_resource_id(&["acme-prod", "kafka-1", "events"]).unwrap();
        assert_eq!(id, "acme-prod/kafka-1/events");

        let (project, service, topic) = split_resource_id3(&id).unwrap();
        assert_eq!(project, "acme-prod");
        assert_eq!(service, "kafka-1");
        assert_eq!(topic, "events");
    }

    #[test]
    fn test_wrong_component_count_is_rejected() {
        assert!(split_resource_id2("acme-prod/kafka-1/events").is_err());
        assert!(split_resource_id3("acme-prod/kafka-1").is_err());
    }

    #[test]
    fn test_separator_in_component_is_rejected() {
        let err = build_resource_id(&["acme-prod", "kafka/1"]).unwrap_err();
        assert_eq!(err.kind(), crate::provider::ErrorKind::Precondition);
        assert!(err.to_string().contains("kafka/1"));

        assert!(build_resource_id(&["acme-prod", ""]).is_err());
    }

    #[test]
    fn test_empty_components_are_rejected() {
        assert!(split_resource_id2("acme-prod/").is_err());
        assert!(split_resource_id2("/kafka-1").is_err());
        assert!(split_resource_id2("").is_err());
    }
}
