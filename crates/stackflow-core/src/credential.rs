//! Provider credentials and their derived metadata

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Infrastructure provider a credential belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Vagrant,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Vagrant => "vagrant",
        }
    }

    /// Prefix shared by every template variable this provider owns
    /// (e.g. `aws_region`).
    pub fn variable_prefix(&self) -> String {
        format!("{}_", self.as_str())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aws" => Ok(Provider::Aws),
            "vagrant" => Ok(Provider::Vagrant),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// AWS credential metadata
///
/// The first three fields are supplied by the user. The rest are written
/// by a successful bootstrap and describe the shared resources it created.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsMeta {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,

    pub acl: String,
    pub cidr_block: String,
    pub igw: String,
    pub key_pair: String,
    pub rtb: String,
    pub sg: String,
    pub subnet: String,
    pub vpc: String,
    pub ami: String,
}

impl AwsMeta {
    /// Names of bootstrap fields that are still empty.
    pub fn missing_bootstrap_fields(&self) -> Vec<&'static str> {
        [
            ("acl", &self.acl),
            ("cidr_block", &self.cidr_block),
            ("igw", &self.igw),
            ("key_pair", &self.key_pair),
            ("rtb", &self.rtb),
            ("sg", &self.sg),
            ("subnet", &self.subnet),
            ("vpc", &self.vpc),
            ("ami", &self.ami),
            ("region", &self.region),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.missing_bootstrap_fields().is_empty()
    }
}

impl fmt::Debug for AwsMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsMeta")
            .field("access_key", &self.access_key)
            .field("secret_key", &if self.secret_key.is_empty() { "" } else { "***" })
            .field("region", &self.region)
            .field("acl", &self.acl)
            .field("cidr_block", &self.cidr_block)
            .field("igw", &self.igw)
            .field("key_pair", &self.key_pair)
            .field("rtb", &self.rtb)
            .field("sg", &self.sg)
            .field("subnet", &self.subnet)
            .field("vpc", &self.vpc)
            .field("ami", &self.ami)
            .finish()
    }
}

/// Vagrant credential metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VagrantMeta {
    pub query_string: String,
    pub memory: u32,
    pub cpus: u32,
    pub box_type: String,
}

/// Provider-specific credential metadata
///
/// The variant fixes the provider, so a credential can never belong to
/// more than one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", content = "data", rename_all = "lowercase")]
pub enum CredentialMeta {
    Aws(AwsMeta),
    Vagrant(VagrantMeta),
}

impl CredentialMeta {
    /// A fresh, empty metadata object for the provider.
    pub fn empty(provider: Provider) -> Self {
        match provider {
            Provider::Aws => CredentialMeta::Aws(AwsMeta::default()),
            Provider::Vagrant => CredentialMeta::Vagrant(VagrantMeta::default()),
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            CredentialMeta::Aws(_) => Provider::Aws,
            CredentialMeta::Vagrant(_) => Provider::Vagrant,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == CredentialMeta::empty(self.provider())
    }

    pub fn as_aws(&self) -> Option<&AwsMeta> {
        match self {
            CredentialMeta::Aws(meta) => Some(meta),
            _ => None,
        }
    }

    pub fn as_aws_mut(&mut self) -> Option<&mut AwsMeta> {
        match self {
            CredentialMeta::Aws(meta) => Some(meta),
            _ => None,
        }
    }

    /// Template variables this metadata binds, keyed by full variable name.
    ///
    /// Empty values are left out so they stay unresolved in the document.
    pub fn variables(&self) -> BTreeMap<String, String> {
        let pairs: Vec<(&str, String)> = match self {
            CredentialMeta::Aws(meta) => vec![
                ("access_key", meta.access_key.clone()),
                ("secret_key", meta.secret_key.clone()),
                ("region", meta.region.clone()),
            ],
            CredentialMeta::Vagrant(meta) => vec![
                ("query_string", meta.query_string.clone()),
                ("box_type", meta.box_type.clone()),
                (
                    "memory",
                    if meta.memory == 0 { String::new() } else { meta.memory.to_string() },
                ),
                (
                    "cpus",
                    if meta.cpus == 0 { String::new() } else { meta.cpus.to_string() },
                ),
            ],
        };

        let prefix = self.provider().variable_prefix();
        pairs
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (format!("{}{}", prefix, name), value))
            .collect()
    }
}

/// The user and group a request acts on behalf of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub group: String,
}

impl Principal {
    pub fn new(username: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            group: group.into(),
        }
    }
}

/// A stored provider credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub identifier: String,

    /// Username that created the credential
    pub owner: String,

    /// Groups the credential is shared with
    #[serde(default)]
    pub shared_with: Vec<String>,

    pub meta: CredentialMeta,
}

impl Credential {
    pub fn new(identifier: impl Into<String>, owner: impl Into<String>, meta: CredentialMeta) -> Self {
        Self {
            identifier: identifier.into(),
            owner: owner.into(),
            shared_with: Vec::new(),
            meta,
        }
    }

    pub fn share_with(mut self, group: impl Into<String>) -> Self {
        self.shared_with.push(group.into());
        self
    }

    pub fn provider(&self) -> Provider {
        self.meta.provider()
    }

    /// Whether the principal may use this credential.
    pub fn is_accessible_by(&self, principal: &Principal) -> bool {
        self.owner == principal.username || self.shared_with.iter().any(|g| *g == principal.group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_bootstrap_fields() {
        let meta = AwsMeta {
            region: "eu-west-1".into(),
            vpc: "vpc-1".into(),
            ..Default::default()
        };

        let missing = meta.missing_bootstrap_fields();
        assert!(missing.contains(&"subnet"));
        assert!(!missing.contains(&"vpc"));
        assert!(!missing.contains(&"region"));
        assert!(!meta.is_bootstrapped());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let meta = AwsMeta {
            secret_key: "very-secret".into(),
            ..Default::default()
        };

        let debug = format!("{:?}", meta);
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_variables_skip_empty_values() {
        let meta = CredentialMeta::Aws(AwsMeta {
            access_key: "AKIA".into(),
            ..Default::default()
        });

        let vars = meta.variables();
        assert_eq!(vars.get("aws_access_key").map(String::as_str), Some("AKIA"));
        assert!(!vars.contains_key("aws_region"));
    }

    #[test]
    fn test_meta_serde_carries_provider() {
        let cred = Credential::new("cred-1", "alice", CredentialMeta::empty(Provider::Aws));
        let json = serde_json::to_value(&cred).unwrap();

        assert_eq!(json["meta"]["provider"], "aws");

        let back: Credential = serde_json::from_value(json).unwrap();
        assert_eq!(back.provider(), Provider::Aws);
        assert!(back.meta.is_empty());
    }

    #[test]
    fn test_accessible_by_owner_or_group() {
        let cred = Credential::new("cred-1", "alice", CredentialMeta::empty(Provider::Aws))
            .share_with("team");

        assert!(cred.is_accessible_by(&Principal::new("alice", "other")));
        assert!(cred.is_accessible_by(&Principal::new("bob", "team")));
        assert!(!cred.is_accessible_by(&Principal::new("bob", "other")));
    }
}
