//! Remote executor client for StackFlow
//!
//! The executor is an HTTP service exposing `/health`, `/apply`, `/plan` and
//! `/destroy`. Each call posts an [`stackflow_core::ExecutorRequest`] and
//! receives an envelope `{"success": bool, "result": ..., "error": "..."}`.
//!
//! # Example
//!
//! ```ignore
//! use stackflow_core::{Executor, ExecutorRequest, SessionGuard};
//! use stackflow_executor::HttpExecutor;
//!
//! let executor = HttpExecutor::default();
//! let mut session = SessionGuard::new(executor.connect("http://127.0.0.1:2300").await?);
//! let state = session.apply(&ExecutorRequest::new("alice-st-1", trace_id).with_content(doc)).await?;
//! ```

pub mod client;
pub mod error;

pub use client::{HttpExecutor, HttpSession};
pub use error::{ExecutorError, Result};
