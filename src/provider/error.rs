//! Lifecycle error kinds
//!
//! Every handler failure falls into one closed set of kinds. The dispatch
//! layer in [`super::lifecycle`] decides per operation which kinds are fatal.

use crate::api::ApiError;

/// Closed classification of handler failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote object does not exist
    NotFound,
    /// Any other failure talking to the remote API
    RemoteFailure,
    /// Writing an attribute into the local record failed
    LocalWriteFailure,
    /// The local record cannot be used for this operation
    Precondition,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{context}: {source}")]
    NotFound { context: String, source: ApiError },

    #[error("{context}: {source}")]
    RemoteFailure { context: String, source: ApiError },

    #[error("cannot set attribute `{key}`: {reason}")]
    LocalWriteFailure { key: String, reason: String },

    #[error("{0}")]
    Precondition(String),
}

impl ProviderError {
    /// Classify an API error, keeping the operation context
    pub fn remote(context: impl Into<String>, source: ApiError) -> Self {
        let context = context.into();
        if source.is_not_found() {
            ProviderError::NotFound { context, source }
        } else {
            ProviderError::RemoteFailure { context, source }
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        ProviderError::Precondition(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::NotFound { .. } => ErrorKind::NotFound,
            ProviderError::RemoteFailure { .. } => ErrorKind::RemoteFailure,
            ProviderError::LocalWriteFailure { .. } => ErrorKind::LocalWriteFailure,
            ProviderError::Precondition(_) => ErrorKind::Precondition,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// The API error behind a remote failure, if any
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ProviderError::NotFound { source, .. } | ProviderError::RemoteFailure { source, .. } => {
                Some(source)
            },
            _ => None,
        }
    }
}

/// Attach operation context to API results
pub trait RemoteContext<T> {
    fn remote_context(self, context: &str) -> Result<T, ProviderError>;
}

impl<T> RemoteContext<T> for Result<T, ApiError> {
    fn remote_context(self, context: &str) -> Result<T, ProviderError> {
        self.map_err(|e| ProviderError::remote(context, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ApiError {
        ApiError::Status {
            status: code,
            message: "Billing group not found".to_string(),
            more_info: None,
        }
    }

    #[test]
    fn test_remote_classifies_not_found() {
        let err: Result<(), _> = Err(status(404));
        let err = err.remote_context("cannot get billing group").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "cannot get billing group: 404: Billing group not found"
        );
    }

    #[test]
    fn test_other_statuses_are_remote_failures() {
        for code in [400, 401, 403, 429, 500] {
            assert_eq!(
                ProviderError::remote("op", status(code)).kind(),
                ErrorKind::RemoteFailure
            );
        }
    }
}
