//! StackFlow control plane
//!
//! Drives the two stack lifecycle flows against a remote executor:
//!
//! - **Bootstrap**: create (or destroy) the shared provider resources of a
//!   group per credential, decode the results and persist them
//! - **Plan**: dry-run a stored stack template and report the machines it
//!   would create
//!
//! ```text
//! BootstrapRequest ─▶ CredentialBuilder ─▶ StackProvider templates ─▶ Executor.apply ─▶ CredentialStore.put
//! PlanRequest ─▶ StackTemplateStore ─▶ CredentialBuilder ─▶ Template ─▶ Executor.plan ─▶ PlanResponse
//! ```
//!
//! One [`BaseStack`] serves one request. Credentials are processed
//! sequentially and nothing is retried.

pub mod bootstrap;
pub mod credential;
pub mod plan;
pub mod stack;

#[cfg(feature = "test-utils")]
pub mod mock;

pub use credential::CredentialBuilder;
pub use plan::USER_INPUT_PREFIX;
pub use stack::{BaseStack, RequestContext};
