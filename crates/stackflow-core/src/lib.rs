//! StackFlow core
//!
//! Data model and collaborator seams for the stack lifecycle: credentials
//! and their provider metadata, stored stack templates, requests, the
//! executor wire types, and the template builder that turns raw documents
//! into finalized ones.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │              stackflow-controlplane               │
//! │        (Bootstrap / Plan lifecycle handlers)      │
//! └──────┬──────────────┬──────────────┬──────────────┘
//!        │              │              │
//! ┌──────▼──────┐ ┌─────▼──────┐ ┌─────▼──────────────┐
//! │ Credential  │ │  Executor  │ │   StackProvider    │
//! │ / Template  │ │  (remote)  │ │ (stackflow-cloud-*) │
//! │   stores    │ └────────────┘ └────────────────────┘
//! └─────────────┘
//! ```

pub mod action;
pub mod credential;
pub mod error;
pub mod executor;
pub mod provider;
pub mod request;
pub mod stack;
pub mod state;
pub mod store;
pub mod template;

// Re-exports
pub use action::{ActionType, Plan, PlanSummary, PlannedResource};
pub use credential::{AwsMeta, Credential, CredentialMeta, Principal, Provider, VagrantMeta};
pub use error::{Result, StackError};
pub use executor::{Executor, ExecutorRequest, ExecutorSession, SessionGuard};
pub use provider::{BootstrapTemplate, StackProvider};
pub use request::{BootstrapRequest, MachineDescriptor, PlanRequest, PlanResponse};
pub use stack::StackTemplate;
pub use state::{ModuleState, OutputValue, State};
pub use store::{CredentialStore, StackTemplateStore};
pub use template::{Resolution, Template};
