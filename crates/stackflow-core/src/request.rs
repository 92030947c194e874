//! Requests accepted by the stack lifecycle and their responses

use crate::credential::Provider;
use crate::error::{Result, StackError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Create or tear down the shared provider resources of a group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapRequest {
    pub group_name: String,
    pub identifiers: Vec<String>,
    #[serde(default)]
    pub destroy: bool,
}

impl BootstrapRequest {
    pub fn valid(&self) -> Result<()> {
        if self.group_name.trim().is_empty() {
            return Err(StackError::Validation("group name is not set".into()));
        }
        if self.identifiers.is_empty() {
            return Err(StackError::Validation("identifiers are not set".into()));
        }
        if self.identifiers.iter().any(|id| id.trim().is_empty()) {
            return Err(StackError::Validation("identifiers contain an empty value".into()));
        }
        Ok(())
    }
}

/// Dry-run a stored stack template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub stack_template_id: String,
    pub group_name: String,
}

impl PlanRequest {
    pub fn valid(&self) -> Result<()> {
        if self.stack_template_id.trim().is_empty() {
            return Err(StackError::Validation("stack template id is not set".into()));
        }
        if self.group_name.trim().is_empty() {
            return Err(StackError::Validation("group name is not set".into()));
        }
        Ok(())
    }
}

/// A machine the plan would create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineDescriptor {
    /// Resource name within the template (e.g. `example` for `aws_instance.example`)
    pub label: String,
    pub provider: Provider,
    pub region: String,
    /// Planned attributes reported by the executor
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanResponse {
    pub machines: Vec<MachineDescriptor>,
}
