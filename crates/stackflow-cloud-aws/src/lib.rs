//! AWS provider for StackFlow
//!
//! Implements [`stackflow_core::StackProvider`] for AWS:
//!
//! - Bootstrap document synthesis (VPC, subnet, routing, security group, key pair)
//! - Exhaustive decoding of bootstrap outputs into [`stackflow_core::AwsMeta`]
//! - Region selection and injection of bootstrap data into `aws_instance` resources
//! - Extraction of planned machines from executor plans
//!
//! # Example
//!
//! ```ignore
//! use stackflow_cloud_aws::{AwsStack, BootstrapSettings};
//! use stackflow_core::StackProvider;
//!
//! let stack = AwsStack::new(BootstrapSettings::default());
//! let templates = stack.bootstrap_templates(&credential, "my-group")?;
//! ```

#![recursion_limit = "256"]

pub mod bootstrap;
pub mod outputs;
pub mod regions;
pub mod stack;

pub use bootstrap::BootstrapParams;
pub use regions::RegionInfo;
pub use stack::{AwsStack, BootstrapSettings};
