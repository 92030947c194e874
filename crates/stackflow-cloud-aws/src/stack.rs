//! AWS stack provider

use crate::bootstrap::{self, BootstrapParams};
use crate::outputs;
use crate::regions;
use serde_json::{Value, json};
use stackflow_core::{
    ActionType, BootstrapTemplate, Credential, CredentialMeta, MachineDescriptor, Plan, Principal,
    Provider, StackError, StackProvider, Template,
};
use std::collections::BTreeMap;

pub use stackflow_config::BootstrapSettings;

/// Resource type of AWS machines
pub const INSTANCE_RESOURCE: &str = "aws_instance";

const USERNAME_VARIABLE: &str = "platform_user_username";
const GROUP_VARIABLE: &str = "platform_group_slug";

/// AWS implementation of [`StackProvider`]
#[derive(Debug, Clone, Default)]
pub struct AwsStack {
    settings: BootstrapSettings,
}

impl AwsStack {
    pub fn new(settings: BootstrapSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BootstrapSettings {
        &self.settings
    }

    /// Typed bootstrap parameters for a credential.
    pub fn bootstrap_params(&self, cred: &Credential, group: &str) -> stackflow_core::Result<BootstrapParams> {
        let meta = aws_meta(cred)?;

        Ok(BootstrapParams {
            availability_zone: BootstrapParams::availability_zone_for(&meta.region)?,
            key_pair_name: format!(
                "{}-{}-{}",
                self.settings.key_pair_prefix, group, cred.identifier
            ),
            public_key: self.settings.public_key.clone(),
            environment_name: format!("{}-{}", self.settings.environment_name, group),
        })
    }
}

fn aws_meta(cred: &Credential) -> stackflow_core::Result<&stackflow_core::AwsMeta> {
    cred.meta.as_aws().ok_or_else(|| {
        StackError::Validation(format!(
            "credential '{}' is a {} credential, not aws",
            cred.identifier,
            cred.provider()
        ))
    })
}

impl StackProvider for AwsStack {
    fn provider(&self) -> Provider {
        Provider::Aws
    }

    fn bootstrap_templates(
        &self,
        cred: &Credential,
        group: &str,
    ) -> stackflow_core::Result<Vec<BootstrapTemplate>> {
        let params = self.bootstrap_params(cred, group)?;
        Ok(vec![BootstrapTemplate::new(bootstrap::render(&params)?)])
    }

    fn bootstrap_keys(&self, cred: &Credential, _group: &str) -> stackflow_core::Result<Vec<String>> {
        aws_meta(cred)?;
        Ok(vec![String::new()])
    }

    fn apply_bootstrap_outputs(
        &self,
        identifier: &str,
        outputs: &BTreeMap<String, Value>,
        meta: &mut CredentialMeta,
    ) -> stackflow_core::Result<()> {
        let Some(aws) = meta.as_aws_mut() else {
            return Err(StackError::Decode {
                identifier: identifier.to_string(),
                reason: "credential metadata is not aws".into(),
            });
        };

        outputs::decode(identifier, outputs, aws)?;

        let missing = aws.missing_bootstrap_fields();
        if !missing.is_empty() {
            return Err(StackError::IncompleteResult {
                identifier: identifier.to_string(),
                reason: format!("empty fields: {}", missing.join(", ")),
            });
        }

        Ok(())
    }

    fn region(&self, meta: &CredentialMeta) -> Option<String> {
        meta.as_aws()
            .map(|m| m.region.clone())
            .filter(|r| !r.is_empty())
    }

    fn set_region(&self, template: &mut Template, region: &str) -> stackflow_core::Result<()> {
        if regions::lookup(region).is_none() {
            return Err(StackError::Validation(format!(
                "region '{}' is not supported",
                region
            )));
        }

        template.set_provider_field("aws", "region", region);
        template.inject_variables([("aws_region", region)]);
        Ok(())
    }

    fn inject_platform_data(
        &self,
        template: &mut Template,
        principal: &Principal,
        credentials: &[Credential],
    ) -> stackflow_core::Result<Vec<String>> {
        let wanted = template.referenced_variables()?;
        let declared = template.declared_variables();
        let platform: Vec<(&str, &str)> = [
            (USERNAME_VARIABLE, principal.username.as_str()),
            (GROUP_VARIABLE, principal.group.as_str()),
        ]
        .into_iter()
        .filter(|(name, _)| wanted.contains(*name) || declared.contains_key(*name))
        .collect();
        template.inject_variables(platform);

        let Some(meta) = credentials.iter().find_map(|c| c.meta.as_aws()) else {
            return Ok(Vec::new());
        };
        let region = regions::lookup(&meta.region);

        let defaults: Vec<(&str, Value)> = [
            ("ami", non_empty(&meta.ami).or(region.map(|r| r.ami)).map(|v| json!(v))),
            ("subnet_id", non_empty(&meta.subnet).map(|v| json!(v))),
            ("key_name", non_empty(&meta.key_pair).map(|v| json!(v))),
            ("vpc_security_group_ids", non_empty(&meta.sg).map(|v| json!([v]))),
            ("availability_zone", region.map(|r| json!(r.availability_zone))),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect();

        let mut patched = Vec::new();
        for (name, body) in template.resources_mut(INSTANCE_RESOURCE) {
            for (key, value) in &defaults {
                body.entry(key.to_string()).or_insert_with(|| value.clone());
            }
            patched.push(name.clone());
        }

        tracing::debug!(instances = ?patched, "Injected AWS data");
        Ok(patched)
    }

    fn machines_from_plan(
        &self,
        plan: &Plan,
        region: &str,
    ) -> stackflow_core::Result<Vec<MachineDescriptor>> {
        Ok(plan
            .resources
            .iter()
            .filter(|r| r.resource_type == INSTANCE_RESOURCE && r.action == ActionType::Create)
            .map(|r| MachineDescriptor {
                label: r.name.clone(),
                provider: Provider::Aws,
                region: region.to_string(),
                attributes: r.attributes.clone(),
            })
            .collect())
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() { None } else { Some(s) }
}
