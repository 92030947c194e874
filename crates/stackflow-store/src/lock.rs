//! Advisory store lock
//!
//! `lock.json` next to the store files, created with `create_new` so that
//! exactly one process holds it. A lock older than an hour is treated as
//! abandoned: it is removed and the create is retried once.

use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

const LOCK_FILE: &str = "lock.json";
const STALE_AFTER_HOURS: i64 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

impl LockInfo {
    fn current() -> Self {
        let host = std::env::var("HOSTNAME")
            .or_else(|_| std::env::var("HOST"))
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            holder: format!("{}:{}", host, std::process::id()),
            acquired_at: Utc::now(),
        }
    }

    fn is_stale(&self) -> bool {
        Utc::now().signed_duration_since(self.acquired_at).num_hours() >= STALE_AFTER_HOURS
    }
}

/// Store lock, removed on [`StoreLock::release`] or drop
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    held: bool,
}

impl StoreLock {
    /// Take the lock in `dir`, failing while another holder has it.
    pub async fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(LOCK_FILE);
        let content = serde_json::to_string_pretty(&LockInfo::current())?;
        let mut took_over = false;

        loop {
            match create(&path, &content).await {
                Ok(()) => {
                    tracing::debug!("Acquired store lock {}", path.display());
                    return Ok(Self { path, held: true });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }

            // The holder may release between our create and this read.
            let Some(existing) = read(&path).await? else {
                continue;
            };

            if took_over || !existing.is_stale() {
                return Err(StoreError::Locked {
                    holder: existing.holder,
                    since: existing.acquired_at,
                });
            }

            tracing::warn!("Taking over stale store lock held by {}", existing.holder);
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            took_over = true;
        }
    }

    pub async fn release(mut self) -> Result<()> {
        self.held = false;
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!("Released store lock");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if self.held {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

async fn create(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(content.as_bytes()).await?;
    file.flush().await
}

/// Lock currently on disk, `None` once it is gone.
///
/// A lock that cannot be parsed is still being written by its holder and
/// counts as fresh.
async fn read(path: &Path) -> Result<Option<LockInfo>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    Ok(Some(serde_json::from_str(&content).unwrap_or_else(|_| LockInfo {
        holder: "unknown".to_string(),
        acquired_at: Utc::now(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let temp_dir = tempdir().unwrap();

        let lock = StoreLock::acquire(temp_dir.path()).await.unwrap();
        assert!(matches!(
            StoreLock::acquire(temp_dir.path()).await,
            Err(StoreError::Locked { .. })
        ));

        lock.release().await.unwrap();
        assert!(StoreLock::acquire(temp_dir.path()).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_acquire_has_one_winner() {
        let temp_dir = tempdir().unwrap();

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let dir = temp_dir.path().to_path_buf();
                tokio::spawn(async move { StoreLock::acquire(&dir).await })
            })
            .collect();

        let mut results = Vec::new();
        for attempt in attempts {
            results.push(attempt.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, StoreError::Locked { .. }))
        );
    }

    #[tokio::test]
    async fn test_stale_lock_taken_over_once() {
        let temp_dir = tempdir().unwrap();
        let stale = LockInfo {
            holder: "old-host:1".into(),
            acquired_at: Utc::now() - Duration::hours(2),
        };
        std::fs::write(
            temp_dir.path().join(LOCK_FILE),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();

        let lock = StoreLock::acquire(temp_dir.path()).await.unwrap();
        assert!(matches!(
            StoreLock::acquire(temp_dir.path()).await,
            Err(StoreError::Locked { .. })
        ));
        lock.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_lock_is_removed() {
        let temp_dir = tempdir().unwrap();

        drop(StoreLock::acquire(temp_dir.path()).await.unwrap());

        assert!(!temp_dir.path().join(LOCK_FILE).exists());
    }
}
