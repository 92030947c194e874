//! Stack lifecycle error types

use thiserror::Error;

/// Errors raised while bootstrapping or planning a stack.
///
/// Every variant is terminal for the request that raised it. Nothing in this
/// workspace retries on any of them.
#[derive(Error, Debug)]
pub enum StackError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Executor unavailable: {0}")]
    Connection(String),

    #[error("Remote execution failed: {0}")]
    Execution(String),

    #[error("Unable to decode outputs for credential '{identifier}': {reason}")]
    Decode { identifier: String, reason: String },

    #[error("Invalid bootstrap metadata for credential '{identifier}': {reason}")]
    IncompleteResult { identifier: String, reason: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Credential '{identifier}': {source}")]
    Credential {
        identifier: String,
        #[source]
        source: Box<StackError>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StackError {
    /// Attach the failing credential's identifier.
    ///
    /// Decode and completeness errors already name the credential and are
    /// returned untouched, as are errors that were wrapped before.
    pub fn for_credential(self, identifier: &str) -> Self {
        match self {
            e @ (StackError::Decode { .. }
            | StackError::IncompleteResult { .. }
            | StackError::Credential { .. }) => e,
            e => StackError::Credential {
                identifier: identifier.to_string(),
                source: Box::new(e),
            },
        }
    }

    /// Returns the innermost error, looking through credential context.
    pub fn root(&self) -> &StackError {
        match self {
            StackError::Credential { source, .. } => source.root(),
            e => e,
        }
    }
}

pub type Result<T> = std::result::Result<T, StackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_credential_wraps_once() {
        let err = StackError::Execution("boom".into())
            .for_credential("cred-1")
            .for_credential("cred-2");

        assert_eq!(err.to_string(), "Credential 'cred-1': Remote execution failed: boom");
        assert!(matches!(err.root(), StackError::Execution(_)));
    }

    #[test]
    fn test_decode_error_keeps_identifier() {
        let err = StackError::Decode {
            identifier: "cred-1".into(),
            reason: "missing output 'vpc'".into(),
        }
        .for_credential("cred-1");

        assert!(matches!(err, StackError::Decode { .. }));
        assert!(err.to_string().contains("cred-1"));
    }
}
