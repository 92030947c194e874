//! StackFlow stores
//!
//! Implementations of the credential and stack template stores:
//!
//! - [`memory`]: `RwLock`-guarded maps, for tests and embedding
//! - [`file`]: JSON files in a store directory, with backup and lock file
//!
//! Both apply the same access rules: a credential is visible to its owner
//! and to the groups it is shared with.

mod access;
pub mod error;
pub mod file;
pub mod lock;
pub mod memory;

pub use error::{Result, StoreError};
pub use file::{FileCredentialStore, FileStore, FileTemplateStore, StoreFile};
pub use lock::StoreLock;
pub use memory::{MemoryCredentialStore, MemoryTemplateStore};
