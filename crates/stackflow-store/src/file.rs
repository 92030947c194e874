//! File-backed stores
//!
//! Credentials and stack templates live in `credentials.json` and
//! `templates.json` under the store directory (`.stackflow/` by default).
//! Every write keeps the previous file as `<name>.backup` and happens under
//! `lock.json`.

use crate::access;
use crate::error::{Result, StoreError};
use crate::lock::StoreLock;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use stackflow_core::{
    Credential, CredentialMeta, CredentialStore, Principal, StackTemplate, StackTemplateStore,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const STORE_VERSION: u32 = 1;
const CREDENTIALS_FILE: &str = "credentials.json";
const TEMPLATES_FILE: &str = "templates.json";

/// On-disk layout of a store file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreFile<T> {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    pub entries: BTreeMap<String, T>,
}

impl<T> Default for StoreFile<T> {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            updated_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }
}

/// Reads and writes store files in one directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).await?;
            tracing::debug!("Created store directory: {}", self.dir.display());
        }
        Ok(())
    }

    /// Load a store file, empty when it does not exist yet.
    pub async fn load<T: DeserializeOwned>(&self, name: &str) -> Result<StoreFile<T>> {
        let path = self.dir.join(name);
        if !path.exists() {
            tracing::debug!("{} not found, starting empty", name);
            return Ok(StoreFile::default());
        }

        let content = fs::read_to_string(&path).await?;
        let file: StoreFile<T> = serde_json::from_str(&content)?;

        if file.version > STORE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: file.version,
                supported: STORE_VERSION,
            });
        }

        tracing::debug!("Loaded {} with {} entries", name, file.entries.len());
        Ok(file)
    }

    /// Write a store file, keeping the previous one as a backup.
    pub async fn save<T: Serialize>(&self, name: &str, file: &mut StoreFile<T>) -> Result<()> {
        self.ensure_dir().await?;

        let path = self.dir.join(name);
        let backup = self.dir.join(format!("{}.backup", name));

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
        }

        file.updated_at = Utc::now();
        fs::write(&path, serde_json::to_string_pretty(&*file)?).await?;

        tracing::debug!("Saved {} with {} entries", name, file.entries.len());
        Ok(())
    }

    pub async fn acquire_lock(&self) -> Result<StoreLock> {
        self.ensure_dir().await?;
        StoreLock::acquire(&self.dir).await
    }

    /// Load, modify and save a store file under the lock.
    async fn update<T, F>(&self, name: &str, f: F) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut BTreeMap<String, T>) -> Result<()>,
    {
        let lock = self.acquire_lock().await?;

        let mut file = self.load::<T>(name).await?;
        f(&mut file.entries)?;
        self.save(name, &mut file).await?;

        lock.release().await
    }
}

/// Credential store over `credentials.json`
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    files: FileStore,
}

impl FileCredentialStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            files: FileStore::new(dir),
        }
    }

    /// Add or replace a credential.
    pub async fn insert(&self, credential: Credential) -> Result<()> {
        self.files
            .update(CREDENTIALS_FILE, |entries: &mut BTreeMap<String, Credential>| {
                entries.insert(credential.identifier.clone(), credential);
                Ok(())
            })
            .await
    }

    pub async fn list(&self) -> Result<Vec<Credential>> {
        let file = self.files.load::<Credential>(CREDENTIALS_FILE).await?;
        Ok(file.entries.into_values().collect())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(
        &self,
        identifiers: &[String],
        principal: &Principal,
    ) -> stackflow_core::Result<Vec<Credential>> {
        let file = self.files.load::<Credential>(CREDENTIALS_FILE).await?;
        Ok(access::select(&file.entries, identifiers, principal)?)
    }

    async fn put(
        &self,
        username: &str,
        metas: BTreeMap<String, CredentialMeta>,
    ) -> stackflow_core::Result<()> {
        let count = metas.len();
        self.files
            .update(CREDENTIALS_FILE, |entries: &mut BTreeMap<String, Credential>| {
                access::update_metas(entries, metas)
            })
            .await?;

        tracing::info!(username = %username, count, "Stored credential metadata");
        Ok(())
    }
}

/// Stack template store over `templates.json`
#[derive(Debug, Clone)]
pub struct FileTemplateStore {
    files: FileStore,
}

impl FileTemplateStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            files: FileStore::new(dir),
        }
    }

    /// Add or replace a stack template.
    pub async fn insert(&self, template: StackTemplate) -> Result<()> {
        self.files
            .update(TEMPLATES_FILE, |entries: &mut BTreeMap<String, StackTemplate>| {
                entries.insert(template.id.clone(), template);
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl StackTemplateStore for FileTemplateStore {
    async fn get_by_id(&self, id: &str) -> stackflow_core::Result<StackTemplate> {
        let mut file = self.files.load::<StackTemplate>(TEMPLATES_FILE).await?;
        Ok(file
            .entries
            .remove(id)
            .ok_or_else(|| StoreError::TemplateNotFound(id.to_string()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackflow_core::{AwsMeta, Provider, StackError};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_credentials_save_load() {
        let temp_dir = tempdir().unwrap();
        let store = FileCredentialStore::new(temp_dir.path());

        store
            .insert(Credential::new("cred-1", "alice", CredentialMeta::empty(Provider::Aws)))
            .await
            .unwrap();

        let meta = CredentialMeta::Aws(AwsMeta {
            vpc: "vpc-1".into(),
            region: "us-east-1".into(),
            ..Default::default()
        });
        store
            .put("alice", BTreeMap::from([("cred-1".to_string(), meta.clone())]))
            .await
            .unwrap();

        let creds = store
            .get(&["cred-1".to_string()], &Principal::new("alice", "g1"))
            .await
            .unwrap();
        assert_eq!(creds.len(), 1);
        assert_eq!(creds[0].meta, meta);

        assert!(temp_dir.path().join("credentials.json.backup").exists());
        assert!(!temp_dir.path().join("lock.json").exists());
    }

    #[tokio::test]
    async fn test_empty_store() {
        let temp_dir = tempdir().unwrap();
        let store = FileCredentialStore::new(temp_dir.path());

        assert!(store.list().await.unwrap().is_empty());
        let creds = store
            .get(&["cred-1".to_string()], &Principal::new("alice", "g1"))
            .await
            .unwrap();
        assert!(creds.is_empty());
    }

    #[tokio::test]
    async fn test_put_fails_while_locked() {
        let temp_dir = tempdir().unwrap();
        let store = FileCredentialStore::new(temp_dir.path());
        store
            .insert(Credential::new("cred-1", "alice", CredentialMeta::empty(Provider::Aws)))
            .await
            .unwrap();

        let _lock = FileStore::new(temp_dir.path()).acquire_lock().await.unwrap();

        let err = store
            .put(
                "alice",
                BTreeMap::from([("cred-1".to_string(), CredentialMeta::empty(Provider::Aws))]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StackError::Store(ref m) if m.contains("locked")));
    }

    #[tokio::test]
    async fn test_newer_version_rejected() {
        let temp_dir = tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join("templates.json"),
            r#"{"version": 99, "updated_at": "2024-01-01T00:00:00Z", "entries": {}}"#,
        )
        .unwrap();

        let err = FileTemplateStore::new(temp_dir.path())
            .get_by_id("st-1")
            .await
            .unwrap_err();
        assert!(matches!(err, StackError::Store(ref m) if m.contains("99")));
    }

    #[tokio::test]
    async fn test_templates_get_by_id() {
        let temp_dir = tempdir().unwrap();
        let store = FileTemplateStore::new(temp_dir.path());

        store
            .insert(StackTemplate::new("st-1", "{}").with_credential(Provider::Aws, "cred-1"))
            .await
            .unwrap();

        let tmpl = store.get_by_id("st-1").await.unwrap();
        assert_eq!(tmpl.credential_ids(), vec!["cred-1"]);
        assert!(matches!(
            store.get_by_id("st-2").await,
            Err(StackError::NotFound(_))
        ));
    }
}
