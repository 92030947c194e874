//! Plan handler
//!
//! Dry-runs a stored stack template against the executor and reports the
//! machines it would create.

use crate::stack::BaseStack;
use stackflow_core::{
    Credential, ExecutorRequest, PlanRequest, PlanResponse, Principal, Resolution, Result,
    StackError, Template,
};
use tracing::{debug, info};

/// Prefix of variables the user fills in after the template is saved
pub const USER_INPUT_PREFIX: &str = "userInput_";

impl BaseStack {
    /// Run a plan request.
    #[tracing::instrument(
        name = "plan",
        skip_all,
        fields(
            username = %self.ctx.username,
            group = %req.group_name,
            stack_template_id = %req.stack_template_id,
            trace_id = %self.ctx.trace_id
        )
    )]
    pub async fn handle_plan(&mut self, req: &PlanRequest) -> Result<PlanResponse> {
        req.valid()?;

        debug!("Fetching template for id {}", req.stack_template_id);
        let stack_template = self.templates.get_by_id(&req.stack_template_id).await?;

        if stack_template.content.trim().is_empty() {
            return Err(StackError::Template(format!(
                "template content is empty for stack template '{}'",
                stack_template.id
            )));
        }

        let credential_ids = stack_template.credential_ids();
        debug!(credentials = ?credential_ids, "Fetching credentials");

        let username = self.ctx.username.clone();
        self.builder
            .build_credentials(&self.ctx.method, &username, &req.group_name, &credential_ids)
            .await?;

        let region = self.select_region()?;
        let provider_prefix = self.provider.provider().variable_prefix();

        let mut session = self.connect().await?;

        let content_id = self.content_id(&req.stack_template_id);
        debug!("Parsing template ({}):\n{}", content_id, stack_template.content);

        let mut template =
            self.build_template(&stack_template.content, &content_id, self.builder.credentials())?;

        if let Some(region) = &region {
            self.provider.set_region(&mut template, region)?;
        }

        let principal = Principal::new(&username, &req.group_name);
        let patched = self
            .provider
            .inject_platform_data(&mut template, &principal, self.builder.credentials())?;
        debug!(machines = ?patched, "Injected platform data");

        // The plan may run before the user or the credentials supplied every
        // value; placeholders keep the document parseable.
        fill(&mut template, USER_INPUT_PREFIX)?;
        if region.is_none() {
            fill(&mut template, &provider_prefix)?;
        }

        let content = template.json_output(&Resolution::Plan {
            deferred_prefix: provider_prefix,
        })?;

        debug!("Calling plan with content");
        let plan = session
            .plan(&ExecutorRequest::new(&content_id, &self.ctx.trace_id).with_content(content))
            .await?;

        info!("Plan: {}", plan.summary());

        let machines = self
            .provider
            .machines_from_plan(&plan, region.as_deref().unwrap_or_default())?;
        debug!(count = machines.len(), "Machines planned to be created");

        Ok(PlanResponse { machines })
    }

    /// Region shared by the stack's credentials of this provider.
    ///
    /// A stack lives in exactly one region: the first credential of the
    /// provider must name it, and every other one must agree.
    fn select_region(&self) -> Result<Option<String>> {
        let provider = self.provider.provider();
        let mut matching = self
            .builder
            .credentials()
            .iter()
            .filter(|c| c.provider() == provider);

        let Some(first) = matching.next() else {
            return Ok(None);
        };
        let region = self.credential_region(first)?;

        if let Some(other) =
            matching.find(|c| self.provider.region(&c.meta).as_deref() != Some(region.as_str()))
        {
            return Err(StackError::Validation(format!(
                "credential '{}' is not in region '{}' of credential '{}'",
                other.identifier, region, first.identifier
            )));
        }

        Ok(Some(region))
    }

    fn credential_region(&self, cred: &Credential) -> Result<String> {
        self.provider.region(&cred.meta).ok_or_else(|| {
            StackError::Validation(format!(
                "region for identifier '{}' is not set",
                cred.identifier
            ))
        })
    }
}

fn fill(template: &mut Template, prefix: &str) -> Result<()> {
    let filled = template.fill_variables(prefix)?;
    if !filled.is_empty() {
        debug!(prefix, variables = ?filled, "Filled variables with placeholders");
    }
    Ok(())
}
