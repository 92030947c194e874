//! Persistence collaborators

use crate::credential::{Credential, CredentialMeta, Principal};
use crate::error::Result;
use crate::stack::StackTemplate;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Credential persistence
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the credentials with the given identifiers.
    ///
    /// Identifiers that do not exist are left out of the result; a
    /// credential the principal may not use fails the whole call with
    /// [`crate::StackError::PermissionDenied`].
    async fn get(&self, identifiers: &[String], principal: &Principal) -> Result<Vec<Credential>>;

    /// Replace the metadata of the given credentials on behalf of `username`.
    async fn put(&self, username: &str, metas: BTreeMap<String, CredentialMeta>) -> Result<()>;
}

/// Stack template persistence
#[async_trait]
pub trait StackTemplateStore: Send + Sync {
    /// Fails with [`crate::StackError::NotFound`] for unknown ids.
    async fn get_by_id(&self, id: &str) -> Result<StackTemplate>;
}
