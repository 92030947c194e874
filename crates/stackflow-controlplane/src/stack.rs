//! Base stack
//!
//! Per-request state shared by the bootstrap and plan handlers: who is
//! asking, which executor to use, and the collaborators the lifecycle
//! drives.

use crate::credential::CredentialBuilder;
use stackflow_core::{
    Credential, CredentialStore, Executor, Result, SessionGuard, StackProvider, StackTemplateStore,
    Template,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Identity of the request a [`BaseStack`] serves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// RPC method the request came in through
    pub method: String,
    pub username: String,
    /// Correlates executor-side logs with this request
    pub trace_id: String,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            username: username.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }
}

/// Stack lifecycle controller for one request
pub struct BaseStack {
    pub(crate) ctx: RequestContext,
    pub(crate) endpoint: String,
    pub(crate) builder: CredentialBuilder,
    pub(crate) templates: Arc<dyn StackTemplateStore>,
    pub(crate) executor: Arc<dyn Executor>,
    pub(crate) provider: Arc<dyn StackProvider>,
}

impl BaseStack {
    pub fn new(
        ctx: RequestContext,
        endpoint: impl Into<String>,
        credentials: Arc<dyn CredentialStore>,
        templates: Arc<dyn StackTemplateStore>,
        executor: Arc<dyn Executor>,
        provider: Arc<dyn StackProvider>,
    ) -> Self {
        Self {
            ctx,
            endpoint: endpoint.into(),
            builder: CredentialBuilder::new(credentials),
            templates,
            executor,
            provider,
        }
    }

    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    /// Credentials resolved for the current request
    pub fn credentials(&self) -> &[Credential] {
        self.builder.credentials()
    }

    /// Content id of a remote execution owned by the requesting user.
    pub(crate) fn content_id(&self, key: &str) -> String {
        format!("{}-{}", self.ctx.username, key)
    }

    pub(crate) async fn connect(&self) -> Result<SessionGuard> {
        tracing::debug!(endpoint = %self.endpoint, "Connecting to executor");
        let session = self.executor.connect(&self.endpoint).await?;
        Ok(SessionGuard::new(session))
    }

    /// Parse a document and bind the provider variables of `credentials`.
    ///
    /// When several credentials bind the same variable the first one wins.
    pub(crate) fn build_template<'a>(
        &self,
        raw: &str,
        content_id: &str,
        credentials: impl IntoIterator<Item = &'a Credential>,
    ) -> Result<Template> {
        let mut template = Template::parse(raw, content_id)?;

        let mut variables: BTreeMap<String, String> = BTreeMap::new();
        for cred in credentials {
            for (name, value) in cred.meta.variables() {
                variables.entry(name).or_insert(value);
            }
        }
        template.inject_variables(variables);

        Ok(template)
    }
}
