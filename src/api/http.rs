//! HTTP utilities for Aiven REST API calls

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Errors returned by the Aiven API layer
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The API answered with a non-success status
    #[error("{status}: {message}")]
    Status {
        status: u16,
        message: String,
        more_info: Option<String>,
    },
    /// The request never produced a response
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The response body was not the JSON we expected
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status of the failure, if the API answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the remote object does not exist
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Error envelope used by the Aiven API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    more_info: Option<String>,
}

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for Aiven API calls
#[derive(Clone)]
pub struct AivenHttpClient {
    client: Client,
}

impl AivenHttpClient {
    /// Create a new HTTP client
    pub fn new(user_agent: &str) -> Result<Self, ApiError> {
        let client = Client::builder().user_agent(user_agent).build()?;

        Ok(Self { client })
    }

    /// Make a GET request to the Aiven API
    pub async fn get(&self, url: &str, token: &str) -> Result<Value, ApiError> {
        tracing::debug!("GET {}", url);
        self.execute(self.client.get(url), token).await
    }

    /// Make a POST request to the Aiven API
    pub async fn post(&self, url: &str, token: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }

        self.execute(request, token).await
    }

    /// Make a PUT request to the Aiven API
    pub async fn put(&self, url: &str, token: &str, body: &Value) -> Result<Value, ApiError> {
        tracing::debug!("PUT {}", url);
        self.execute(self.client.put(url).json(body), token).await
    }

    /// Make a DELETE request to the Aiven API
    pub async fn delete(&self, url: &str, token: &str) -> Result<Value, ApiError> {
        tracing::debug!("DELETE {}", url);
        self.execute(self.client.delete(url), token).await
    }

    async fn execute(&self, request: RequestBuilder, token: &str) -> Result<Value, ApiError> {
        let response = request
            .header(AUTHORIZATION, format!("aivenv1 {}", token))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Only the sanitized body reaches the log
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));

            let parsed: Option<ErrorBody> = serde_json::from_str(&body).ok();
            let (message, more_info) = match parsed {
                Some(ErrorBody { message: Some(message), more_info }) => (message, more_info),
                _ => (
                    status.canonical_reason().unwrap_or("unknown error").to_string(),
                    None,
                ),
            };

            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
                more_info,
            });
        }

        // Handle empty response
        if body.is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Format an Aiven API error for display
pub fn format_api_error(error: &ApiError) -> String {
    let hint = match error.status() {
        Some(401) => "Authentication failed. Check AIVEN_TOKEN.",
        Some(403) => "Permission denied. Check the token's project membership.",
        Some(404) => "Resource not found.",
        Some(409) => "Resource conflict. The resource may already exist or be in use.",
        Some(429) => "Rate limit exceeded. Please try again later.",
        Some(400) => "Invalid request. Check your parameters.",
        Some(500..=599) => "Aiven API temporarily unavailable. Please try again.",
        Some(_) => "Request failed.",
        None => "Request failed. Check your network connection and try again.",
    };

    match error {
        ApiError::Status { message, .. } => format!("{} ({})", hint, message),
        _ => hint.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("[truncated, 500 bytes total]"));
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize_for_log("a\nb\tc"), "abc");
    }

    #[test]
    fn test_not_found_detection() {
        let err = ApiError::Status {
            status: 404,
            message: "Not found".to_string(),
            more_info: None,
        };
        assert!(err.is_not_found());

        let err = ApiError::Status {
            status: 500,
            message: "boom".to_string(),
            more_info: None,
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_format_api_error_keeps_remote_message() {
        let err = ApiError::Status {
            status: 403,
            message: "Not a member of project".to_string(),
            more_info: None,
        };
        let formatted = format_api_error(&err);
        assert!(formatted.starts_with("Permission denied"));
        assert!(formatted.contains("Not a member of project"));
    }
}
