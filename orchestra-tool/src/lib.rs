#![deny(missing_docs)]
//! Tool registry for orchestra.
//!
//! Tools are registered once at startup as a [`ToolDescriptor`] plus a
//! shared [`ToolExecutor`]. After that the [`ToolRegistry`] is read-only:
//! wrap it in an `Arc` and dispatch from as many loops as you like.
//!
//! Dispatch never fails outward. Unknown tools, schema violations, executor
//! errors, panics and timeouts all come back as a failed
//! [`ToolResult`](orchestra_types::ToolResult) the brain can read.
//!
//! [`ToolDescriptor`]: orchestra_types::ToolDescriptor

pub mod executor;
pub mod finish;
pub mod registry;
pub mod validate;

pub use executor::{ToolError, ToolExecutor, ToolOutput};
pub use finish::FinishTool;
pub use registry::{RegistryError, ToolRegistry};
pub use validate::validate_arguments;
