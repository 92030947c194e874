//! Stored stack templates

use crate::credential::Provider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An infrastructure template as persisted by the template store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackTemplate {
    pub id: String,

    /// Raw infrastructure document
    pub content: String,

    /// Credential identifiers attached to the template, per provider
    #[serde(default)]
    pub credentials: BTreeMap<Provider, Vec<String>>,
}

impl StackTemplate {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            credentials: BTreeMap::new(),
        }
    }

    pub fn with_credential(mut self, provider: Provider, identifier: impl Into<String>) -> Self {
        self.credentials
            .entry(provider)
            .or_default()
            .push(identifier.into());
        self
    }

    /// All credential identifiers, ordered by provider then attachment order.
    pub fn credential_ids(&self) -> Vec<String> {
        self.credentials.values().flatten().cloned().collect()
    }
}
