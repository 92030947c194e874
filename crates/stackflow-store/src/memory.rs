//! In-memory stores
//!
//! Used by tests and by embedders that keep credentials elsewhere.

use crate::access;
use crate::error::StoreError;
use async_trait::async_trait;
use stackflow_core::{
    Credential, CredentialMeta, CredentialStore, Principal, StackTemplate, StackTemplateStore,
};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<BTreeMap<String, Credential>>,
    puts: RwLock<usize>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: impl IntoIterator<Item = Credential>) -> Self {
        Self {
            credentials: RwLock::new(
                credentials
                    .into_iter()
                    .map(|c| (c.identifier.clone(), c))
                    .collect(),
            ),
            puts: RwLock::new(0),
        }
    }

    pub async fn insert(&self, credential: Credential) {
        self.credentials
            .write()
            .await
            .insert(credential.identifier.clone(), credential);
    }

    /// Stored credential, ignoring access rules.
    pub async fn credential(&self, identifier: &str) -> Option<Credential> {
        self.credentials.read().await.get(identifier).cloned()
    }

    /// Number of successful `put` calls.
    pub async fn put_count(&self) -> usize {
        *self.puts.read().await
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(
        &self,
        identifiers: &[String],
        principal: &Principal,
    ) -> stackflow_core::Result<Vec<Credential>> {
        let credentials = self.credentials.read().await;
        Ok(access::select(&credentials, identifiers, principal)?)
    }

    async fn put(
        &self,
        username: &str,
        metas: BTreeMap<String, CredentialMeta>,
    ) -> stackflow_core::Result<()> {
        let mut credentials = self.credentials.write().await;
        access::update_metas(&mut credentials, metas)?;
        *self.puts.write().await += 1;

        tracing::debug!(username = %username, "Updated credential metadata");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<BTreeMap<String, StackTemplate>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: impl IntoIterator<Item = StackTemplate>) -> Self {
        Self {
            templates: RwLock::new(templates.into_iter().map(|t| (t.id.clone(), t)).collect()),
        }
    }

    pub async fn insert(&self, template: StackTemplate) {
        self.templates
            .write()
            .await
            .insert(template.id.clone(), template);
    }
}

#[async_trait]
impl StackTemplateStore for MemoryTemplateStore {
    async fn get_by_id(&self, id: &str) -> stackflow_core::Result<StackTemplate> {
        self.templates
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::TemplateNotFound(id.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackflow_core::{AwsMeta, Provider, StackError};

    #[tokio::test]
    async fn test_put_replaces_meta() {
        let store = MemoryCredentialStore::with_credentials([Credential::new(
            "cred-1",
            "alice",
            CredentialMeta::empty(Provider::Aws),
        )]);

        let meta = CredentialMeta::Aws(AwsMeta {
            vpc: "vpc-1".into(),
            ..Default::default()
        });
        store
            .put("alice", BTreeMap::from([("cred-1".to_string(), meta.clone())]))
            .await
            .unwrap();

        assert_eq!(store.credential("cred-1").await.unwrap().meta, meta);
        assert_eq!(store.put_count().await, 1);
    }

    #[tokio::test]
    async fn test_put_unknown_credential() {
        let store = MemoryCredentialStore::new();

        let err = store
            .put(
                "alice",
                BTreeMap::from([("cred-1".to_string(), CredentialMeta::empty(Provider::Aws))]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StackError::NotFound(_)));
        assert_eq!(store.put_count().await, 0);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let store = MemoryTemplateStore::with_templates([StackTemplate::new("st-1", "{}")]);

        assert_eq!(store.get_by_id("st-1").await.unwrap().content, "{}");
        assert!(matches!(
            store.get_by_id("st-2").await,
            Err(StackError::NotFound(_))
        ));
    }
}
