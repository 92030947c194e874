pub mod bootstrap;
pub mod plan;

use stackflow_cloud_aws::AwsStack;
use stackflow_config::Settings;
use stackflow_controlplane::{BaseStack, RequestContext};
use stackflow_executor::HttpExecutor;
use stackflow_store::{FileCredentialStore, FileTemplateStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Settings merged with command line overrides
pub struct Context {
    pub settings: Settings,
    pub endpoint: String,
    pub user: String,
    pub store_dir: PathBuf,
}

impl Context {
    pub fn resolve(
        settings: Settings,
        endpoint: Option<String>,
        user: Option<String>,
        store_dir: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let user = user
            .or_else(|| std::env::var("USER").ok())
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("user is not set, pass --user or STACKFLOW_USER"))?;

        let endpoint = endpoint.unwrap_or_else(|| settings.executor.endpoint.clone());
        let store_dir = store_dir.unwrap_or_else(|| settings.store.dir.clone());
        tracing::debug!(
            endpoint = %endpoint,
            user = %user,
            store_dir = %store_dir.display(),
            "Resolved command context"
        );

        Ok(Self {
            endpoint,
            store_dir,
            user,
            settings,
        })
    }

    /// Controller for one command invocation
    pub fn base_stack(&self, method: &str) -> BaseStack {
        BaseStack::new(
            RequestContext::new(method, &self.user),
            &self.endpoint,
            Arc::new(FileCredentialStore::new(&self.store_dir)),
            Arc::new(FileTemplateStore::new(&self.store_dir)),
            Arc::new(HttpExecutor::new(Duration::from_secs(
                self.settings.executor.timeout_secs,
            ))),
            Arc::new(AwsStack::new(self.settings.bootstrap.clone())),
        )
    }
}
