//! Provider-specific stack behaviour

use crate::action::Plan;
use crate::credential::{Credential, CredentialMeta, Principal, Provider};
use crate::error::Result;
use crate::request::MachineDescriptor;
use crate::template::Template;
use serde_json::Value;
use std::collections::BTreeMap;

/// A rendered bootstrap document
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapTemplate {
    /// Deduplication key, derived by the caller when empty
    pub key: String,
    pub content: String,
}

impl BootstrapTemplate {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            key: String::new(),
            content: content.into(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

/// Everything the lifecycle needs to know about one provider
///
/// Implemented once per provider (see the `stackflow-cloud-aws` crate).
pub trait StackProvider: Send + Sync {
    /// Returns the provider this implementation handles
    fn provider(&self) -> Provider;

    /// Render the bootstrap documents for a credential.
    fn bootstrap_templates(&self, cred: &Credential, group: &str) -> Result<Vec<BootstrapTemplate>>;

    /// Keys of the bootstrap documents of a credential, in the order
    /// [`Self::bootstrap_templates`] returns them. An empty key is derived
    /// by the caller.
    ///
    /// Teardown only needs the keys, so providers that can name them
    /// without rendering should override this.
    fn bootstrap_keys(&self, cred: &Credential, group: &str) -> Result<Vec<String>> {
        Ok(self
            .bootstrap_templates(cred, group)?
            .into_iter()
            .map(|t| t.key)
            .collect())
    }

    /// Decode apply outputs into the credential metadata and check that the
    /// result is complete.
    fn apply_bootstrap_outputs(
        &self,
        identifier: &str,
        outputs: &BTreeMap<String, Value>,
        meta: &mut CredentialMeta,
    ) -> Result<()>;

    /// Region the credential is pinned to, if any.
    fn region(&self, meta: &CredentialMeta) -> Option<String>;

    /// Point the document at a region.
    fn set_region(&self, template: &mut Template, region: &str) -> Result<()>;

    /// Merge platform and bootstrap data into the document.
    ///
    /// Returns the names of the machine resources that were patched.
    fn inject_platform_data(
        &self,
        template: &mut Template,
        principal: &Principal,
        credentials: &[Credential],
    ) -> Result<Vec<String>>;

    /// Machines the plan would create, in executor order.
    fn machines_from_plan(&self, plan: &Plan, region: &str) -> Result<Vec<MachineDescriptor>>;
}
