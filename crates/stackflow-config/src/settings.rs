//! Settings file schema

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:2300";
const DEFAULT_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub executor: ExecutorSettings,
    pub store: StoreSettings,
    pub bootstrap: BootstrapSettings,
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_level: Option<String>,
}

/// Remote executor connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Directory holding credentials.json and templates.json
    pub dir: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".stackflow"),
        }
    }
}

/// Inputs of the provider bootstrap documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapSettings {
    /// Base environment name, suffixed with the group
    pub environment_name: String,
    /// Public key installed as the group's key pair
    pub public_key: String,
    pub key_pair_prefix: String,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            environment_name: "StackFlow-Bootstrap".to_string(),
            public_key: String::new(),
            key_pair_prefix: "stackflow".to_string(),
        }
    }
}

impl Settings {
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        // an empty file is a valid, all-default settings file
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&content, path)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
