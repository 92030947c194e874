use stackflow_cloud_aws::{AwsStack, BootstrapSettings};
use stackflow_controlplane::mock::MockExecutor;
use stackflow_controlplane::{BaseStack, RequestContext};
use stackflow_core::{AwsMeta, Credential, CredentialMeta, Provider, StackProvider, StackTemplate};
use stackflow_store::{MemoryCredentialStore, MemoryTemplateStore};
use std::sync::Arc;

pub const USER: &str = "alice";
pub const GROUP: &str = "g1";
pub const ENDPOINT: &str = "http://executor.test";
#[allow(dead_code)]
pub const TRACE_ID: &str = "trace-1";

/// Outputs a successful bootstrap apply reports
pub fn bootstrap_outputs() -> Vec<(&'static str, &'static str)> {
    vec![
        ("acl", "acl-0a1b"),
        ("ami", "ami-cf35f3a4"),
        ("cidr_block", "10.0.0.0/16"),
        ("igw", "igw-0a1b"),
        ("key_pair", "stackflow-g1-cred-aws-1"),
        ("region", "us-east-1"),
        ("rtb", "rtb-0a1b"),
        ("sg", "sg-0a1b"),
        ("subnet", "subnet-0a1b"),
        ("vpc", "vpc-0a1b"),
    ]
}

pub fn aws_credential(identifier: &str, region: &str) -> Credential {
    Credential::new(
        identifier,
        USER,
        CredentialMeta::Aws(AwsMeta {
            access_key: "AKIAEXAMPLE".into(),
            secret_key: "secret".into(),
            region: region.into(),
            ..Default::default()
        }),
    )
}

#[allow(dead_code)]
pub fn bootstrapped_credential(identifier: &str) -> Credential {
    let mut meta = AwsMeta {
        access_key: "AKIAEXAMPLE".into(),
        secret_key: "secret".into(),
        ..Default::default()
    };
    for (key, value) in bootstrap_outputs() {
        let slot = match key {
            "acl" => &mut meta.acl,
            "ami" => &mut meta.ami,
            "cidr_block" => &mut meta.cidr_block,
            "igw" => &mut meta.igw,
            "key_pair" => &mut meta.key_pair,
            "region" => &mut meta.region,
            "rtb" => &mut meta.rtb,
            "sg" => &mut meta.sg,
            "subnet" => &mut meta.subnet,
            _ => &mut meta.vpc,
        };
        *slot = value.to_string();
    }
    Credential::new(identifier, USER, CredentialMeta::Aws(meta))
}

pub struct Harness {
    pub credentials: Arc<MemoryCredentialStore>,
    pub templates: Arc<MemoryTemplateStore>,
    pub executor: MockExecutor,
    pub provider: Arc<dyn StackProvider>,
}

impl Harness {
    pub fn new(executor: MockExecutor) -> Self {
        Self {
            credentials: Arc::new(MemoryCredentialStore::new()),
            templates: Arc::new(MemoryTemplateStore::new()),
            executor,
            provider: Arc::new(AwsStack::new(BootstrapSettings {
                public_key: "ssh-rsa AAAA test@stackflow".into(),
                ..Default::default()
            })),
        }
    }

    #[allow(dead_code)]
    pub fn with_provider(mut self, provider: Arc<dyn StackProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub async fn with_credential(self, credential: Credential) -> Self {
        self.credentials.insert(credential).await;
        self
    }

    #[allow(dead_code)]
    pub async fn with_template(self, template: StackTemplate) -> Self {
        self.templates.insert(template).await;
        self
    }

    /// Controller for a fresh request
    pub fn stack(&self) -> BaseStack {
        BaseStack::new(
            RequestContext::new("stackflow", USER).with_trace_id(TRACE_ID),
            ENDPOINT,
            self.credentials.clone(),
            self.templates.clone(),
            Arc::new(self.executor.clone()),
            self.provider.clone(),
        )
    }

    #[allow(dead_code)]
    pub async fn meta(&self, identifier: &str) -> CredentialMeta {
        self.credentials
            .credential(identifier)
            .await
            .map(|c| c.meta)
            .unwrap_or_else(|| CredentialMeta::empty(Provider::Aws))
    }
}
