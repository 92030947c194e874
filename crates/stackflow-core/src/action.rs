//! Dry-run plans returned by the remote executor

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A resource change the executor would perform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedResource {
    /// Resource type (e.g. "aws_instance", "aws_vpc")
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Resource name within the template
    pub name: String,

    /// Type of action to perform
    pub action: ActionType,

    /// Planned attribute values, as reported by the executor
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl PlannedResource {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        action: ActionType,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            action,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Full resource address (type.name)
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource
    Update,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Plan containing every resource change, in executor order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub resources: Vec<PlannedResource>,
}

impl Plan {
    pub fn new(resources: Vec<PlannedResource>) -> Self {
        Self { resources }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_changes(&self) -> bool {
        self.resources.iter().any(|r| r.action != ActionType::NoOp)
    }

    /// Get resources by action type, preserving order
    pub fn resources_by_action(&self, action: ActionType) -> Vec<&PlannedResource> {
        self.resources.iter().filter(|r| r.action == action).collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.resources_by_action(ActionType::Create).len(),
            update: self.resources_by_action(ActionType::Update).len(),
            delete: self.resources_by_action(ActionType::Delete).len(),
            no_change: self.resources_by_action(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete, {} unchanged",
            self.create, self.update, self.delete, self.no_change
        )
    }
}
