//! Store error types

use chrono::{DateTime, Utc};
use stackflow_core::StackError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store is locked by {holder} since {since}")]
    Locked { holder: String, since: DateTime<Utc> },

    #[error("Store file version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Credential not found: {0}")]
    CredentialNotFound(String),

    #[error("Stack template not found: {0}")]
    TemplateNotFound(String),

    #[error("Credential '{identifier}' is not accessible by {username}")]
    PermissionDenied { identifier: String, username: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for StackError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CredentialNotFound(_) | StoreError::TemplateNotFound(_) => {
                StackError::NotFound(err.to_string())
            }
            StoreError::PermissionDenied { .. } => StackError::PermissionDenied(err.to_string()),
            other => StackError::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let err: StackError = StoreError::TemplateNotFound("st-1".into()).into();
        assert!(matches!(err, StackError::NotFound(ref m) if m.contains("st-1")));

        let err: StackError = StoreError::PermissionDenied {
            identifier: "cred-1".into(),
            username: "bob".into(),
        }
        .into();
        assert!(matches!(err, StackError::PermissionDenied(_)));

        let err: StackError = StoreError::UnsupportedVersion {
            found: 9,
            supported: 1,
        }
        .into();
        assert!(matches!(err, StackError::Store(_)));
    }
}
