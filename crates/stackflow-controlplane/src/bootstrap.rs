//! Bootstrap handler
//!
//! Creates or destroys the shared provider resources (network, security
//! group, key pair) of a group for every credential of the stack's provider,
//! then persists the resulting metadata.

use crate::stack::BaseStack;
use serde_json::Value;
use stackflow_core::{
    BootstrapRequest, Credential, CredentialMeta, ExecutorRequest, Resolution, Result,
    SessionGuard,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Root outputs of every bootstrap document run in the current pass, by key.
/// Destroyed documents have no outputs.
type Executed = BTreeMap<String, BTreeMap<String, Value>>;

impl BaseStack {
    /// Run a bootstrap request.
    ///
    /// Credentials are processed one at a time; the first failure aborts the
    /// request before later credentials are touched or persisted.
    #[tracing::instrument(
        name = "bootstrap",
        skip_all,
        fields(
            username = %self.ctx.username,
            group = %req.group_name,
            trace_id = %self.ctx.trace_id,
            destroy = req.destroy
        )
    )]
    pub async fn handle_bootstrap(&mut self, req: &BootstrapRequest) -> Result<bool> {
        req.valid()?;

        if req.destroy {
            debug!("Bootstrap destroy is called");
        } else {
            debug!("Bootstrap apply is called");
        }

        let username = self.ctx.username.clone();
        self.builder
            .build_credentials(&self.ctx.method, &username, &req.group_name, &req.identifiers)
            .await?;

        let provider = self.provider.provider();
        let targets: Vec<Credential> = self
            .builder
            .credentials()
            .iter()
            .filter(|c| c.provider() == provider)
            .cloned()
            .collect();

        if targets.is_empty() {
            info!("No {} credentials to bootstrap", provider);
            return Ok(true);
        }

        let mut session = self.connect().await?;
        let mut executed: Executed = BTreeMap::new();

        for cred in &targets {
            let meta = self
                .bootstrap_credential(&mut session, cred, req, &mut executed)
                .await
                .map_err(|e| e.for_credential(&cred.identifier))?;

            debug!(identifier = %cred.identifier, meta = ?meta, "Bootstrap response");

            self.builder
                .store()
                .put(&username, BTreeMap::from([(cred.identifier.clone(), meta)]))
                .await
                .map_err(|e| e.for_credential(&cred.identifier))?;
        }

        info!(count = targets.len(), "Bootstrap finished");
        Ok(true)
    }

    /// Run every bootstrap document of one credential and return its new
    /// metadata.
    ///
    /// A document whose key already ran in this pass is not sent to the
    /// executor again; its recorded result is applied to this credential.
    async fn bootstrap_credential(
        &self,
        session: &mut SessionGuard,
        cred: &Credential,
        req: &BootstrapRequest,
        executed: &mut Executed,
    ) -> Result<CredentialMeta> {
        let provider = self.provider.provider();

        if req.destroy {
            for key in self.provider.bootstrap_keys(cred, &req.group_name)? {
                let key = self.bootstrap_key(key, cred, &req.group_name);

                if executed.contains_key(&key) {
                    info!(key = %key, identifier = %cred.identifier, "Bootstrap resources already destroyed in this pass");
                    continue;
                }

                info!("Destroying bootstrap resources belonging to identifier '{}'", cred.identifier);
                session
                    .destroy(&ExecutorRequest::new(self.content_id(&key), &self.ctx.trace_id))
                    .await?;
                executed.insert(key, BTreeMap::new());
            }

            return Ok(CredentialMeta::empty(provider));
        }

        let mut meta = cred.meta.clone();
        for tmpl in self.provider.bootstrap_templates(cred, &req.group_name)? {
            let key = self.bootstrap_key(tmpl.key, cred, &req.group_name);

            let outputs = match executed.get(&key) {
                Some(outputs) => {
                    info!(key = %key, identifier = %cred.identifier, "Reusing bootstrap outputs from this pass");
                    outputs.clone()
                }
                None => {
                    info!("Creating bootstrap resources belonging to identifier '{}'", cred.identifier);
                    let content_id = self.content_id(&key);
                    debug!(content_id = %content_id, "Bootstrap template:\n{}", tmpl.content);

                    let template = self.build_template(&tmpl.content, &content_id, [cred])?;
                    let content = template.json_output(&Resolution::Apply)?;

                    let state = session
                        .apply(&ExecutorRequest::new(&content_id, &self.ctx.trace_id).with_content(content))
                        .await?;

                    let outputs = state.root_outputs();
                    debug!(identifier = %cred.identifier, outputs = ?outputs.keys().collect::<Vec<_>>(), "Bootstrap outputs");
                    executed.insert(key, outputs.clone());
                    outputs
                }
            };

            self.provider
                .apply_bootstrap_outputs(&cred.identifier, &outputs, &mut meta)?;
        }

        Ok(meta)
    }

    /// Key of a bootstrap document, `<provider>-<group>-<identifier>` unless
    /// the provider named one.
    fn bootstrap_key(&self, key: String, cred: &Credential, group: &str) -> String {
        if key.is_empty() {
            format!("{}-{}-{}", self.provider.provider(), group, cred.identifier)
        } else {
            key
        }
    }
}
