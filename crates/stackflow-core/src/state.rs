//! Materialized state returned by a remote apply

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Path of the root module in a state document
pub const ROOT_MODULE: &str = "root";

/// State returned by the executor after a successful apply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Modules indexed by their path, the root module is `["root"]`
    #[serde(default)]
    pub modules: Vec<ModuleState>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// State with a single root module holding the given outputs
    pub fn with_outputs<K, V>(outputs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        Self {
            modules: vec![ModuleState {
                path: vec![ROOT_MODULE.to_string()],
                outputs: outputs
                    .into_iter()
                    .map(|(k, v)| (k.into(), OutputValue::new(v)))
                    .collect(),
            }],
        }
    }

    pub fn root_module(&self) -> Option<&ModuleState> {
        self.modules.iter().find(|m| m.is_root())
    }

    /// Outputs of the root module, empty when the state has none
    pub fn root_outputs(&self) -> BTreeMap<String, serde_json::Value> {
        self.root_module()
            .map(|m| {
                m.outputs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// State of a single module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleState {
    pub path: Vec<String>,

    #[serde(default)]
    pub outputs: BTreeMap<String, OutputValue>,
}

impl ModuleState {
    pub fn is_root(&self) -> bool {
        self.path.len() == 1 && self.path[0] == ROOT_MODULE
    }
}

/// A single output value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputValue {
    pub value: serde_json::Value,

    #[serde(default)]
    pub sensitive: bool,
}

impl OutputValue {
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        Self {
            value: value.into(),
            sensitive: false,
        }
    }
}
