//! Executor client error types

use stackflow_core::StackError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("executor at {endpoint} is unreachable: {reason}")]
    Unavailable { endpoint: String, reason: String },

    #[error("executor session is closed")]
    Closed,

    #[error("{0}")]
    Remote(String),

    #[error("unexpected executor response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<ExecutorError> for StackError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::Unavailable { .. } | ExecutorError::Closed => {
                StackError::Connection(err.to_string())
            }
            ExecutorError::Http(ref e) if e.is_connect() || e.is_timeout() => {
                StackError::Connection(err.to_string())
            }
            ExecutorError::Remote(msg) => StackError::Execution(msg),
            other => StackError::Execution(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecutorError>;
