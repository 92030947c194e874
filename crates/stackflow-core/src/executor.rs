//! Remote executor abstraction
//!
//! The executor runs finalized documents on behalf of the platform. This
//! layer only drives it: it never retries, and it never reinterprets a
//! remote failure.

use crate::action::Plan;
use crate::error::Result;
use crate::state::State;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// Payload of every Apply/Plan/Destroy call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorRequest {
    /// Finalized document, empty for Destroy
    #[serde(default)]
    pub content: String,

    /// Identifies the remote state the call operates on
    #[serde(rename = "contentID")]
    pub content_id: String,

    #[serde(rename = "traceID")]
    pub trace_id: String,
}

impl ExecutorRequest {
    pub fn new(content_id: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            content_id: content_id.into(),
            trace_id: trace_id.into(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// Factory for executor sessions
#[async_trait]
pub trait Executor: Send + Sync {
    /// Open a session against the endpoint.
    ///
    /// Fails with [`crate::StackError::Connection`] when it is unreachable.
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn ExecutorSession>>;
}

/// An open executor connection
#[async_trait]
pub trait ExecutorSession: Send {
    /// Execute the document and return the materialized state.
    async fn apply(&mut self, req: &ExecutorRequest) -> Result<State>;

    /// Dry-run the document, no remote mutation.
    async fn plan(&mut self, req: &ExecutorRequest) -> Result<Plan>;

    /// Tear down everything previously applied under the content id.
    async fn destroy(&mut self, req: &ExecutorRequest) -> Result<()>;

    /// Release the connection. Must be safe to call more than once.
    fn close(&mut self);
}

/// Scoped executor session, closed when dropped
pub struct SessionGuard {
    session: Box<dyn ExecutorSession>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn ExecutorSession>) -> Self {
        Self { session }
    }
}

impl Deref for SessionGuard {
    type Target = dyn ExecutorSession;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.close();
        tracing::debug!("Released executor session");
    }
}
