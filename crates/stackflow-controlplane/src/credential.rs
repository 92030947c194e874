//! Credential builder
//!
//! Resolves the identifiers of a request into credential records once and
//! keeps them, in request order, for the rest of the request.

use stackflow_core::{Credential, CredentialStore, Principal, Result, StackError};
use std::sync::Arc;

pub struct CredentialBuilder {
    store: Arc<dyn CredentialStore>,
    credentials: Vec<Credential>,
}

impl CredentialBuilder {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            credentials: Vec::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Credentials resolved by the last [`Self::build_credentials`] call
    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    /// Resolve `identifiers` on behalf of `username` acting in `group`.
    ///
    /// Every identifier must resolve; the cached list replaces any previous
    /// one only on success.
    pub async fn build_credentials(
        &mut self,
        method: &str,
        username: &str,
        group: &str,
        identifiers: &[String],
    ) -> Result<&[Credential]> {
        let principal = Principal::new(username, group);
        let found = self.store.get(identifiers, &principal).await?;

        if let Some(missing) = identifiers
            .iter()
            .find(|id| !found.iter().any(|c| c.identifier == **id))
        {
            return Err(StackError::NotFound(format!(
                "credential '{}' for {}",
                missing, username
            )));
        }

        let mut ordered: Vec<Credential> = Vec::with_capacity(found.len());
        for identifier in identifiers {
            if ordered.iter().any(|c| c.identifier == *identifier) {
                continue;
            }
            if let Some(cred) = found.iter().find(|c| c.identifier == *identifier) {
                ordered.push(cred.clone());
            }
        }

        tracing::debug!(
            method,
            username,
            group,
            count = ordered.len(),
            "Built credentials"
        );

        self.credentials = ordered;
        Ok(&self.credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackflow_core::{CredentialMeta, Provider, StackError};
    use stackflow_store::MemoryCredentialStore;

    fn store() -> Arc<dyn CredentialStore> {
        Arc::new(MemoryCredentialStore::with_credentials([
            Credential::new("aws-1", "alice", CredentialMeta::empty(Provider::Aws)),
            Credential::new("vagrant-1", "alice", CredentialMeta::empty(Provider::Vagrant)),
        ]))
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_build_credentials_keeps_request_order() {
        let mut builder = CredentialBuilder::new(store());

        let creds = builder
            .build_credentials("plan", "alice", "g1", &ids(&["vagrant-1", "aws-1", "vagrant-1"]))
            .await
            .unwrap();

        let names: Vec<&str> = creds.iter().map(|c| c.identifier.as_str()).collect();
        assert_eq!(names, vec!["vagrant-1", "aws-1"]);
    }

    #[tokio::test]
    async fn test_failed_build_keeps_previous_credentials() {
        let mut builder = CredentialBuilder::new(store());
        builder
            .build_credentials("plan", "alice", "g1", &ids(&["aws-1"]))
            .await
            .unwrap();

        let err = builder
            .build_credentials("plan", "alice", "g1", &ids(&["aws-1", "aws-2"]))
            .await
            .unwrap_err();

        assert!(matches!(err, StackError::NotFound(ref m) if m.contains("aws-2")));
        assert_eq!(builder.credentials().len(), 1);
    }
}
