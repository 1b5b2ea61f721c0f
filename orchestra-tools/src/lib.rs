#![deny(missing_docs)]
//! Built-in tool executors for orchestra.
//!
//! | Tool | Where it runs | Kind |
//! |---|---|---|
//! | [`PythonSandbox`] (`python_sandbox`) | local subprocess | computation |
//! | [`WebSearch`] (`web_search`) | Brave Search API | retrieval |
//! | [`ModelTool`] (`phi4`, `gemini`, ...) | any [`BrainClient`](orchestra_turn::BrainClient) | model |
//!
//! Each tool exposes a `descriptor()` to register it under, and implements
//! [`ToolExecutor`](orchestra_tool::ToolExecutor).

mod model;
mod python;
mod web_search;

pub use model::ModelTool;
pub use python::PythonSandbox;
pub use web_search::{BRAVE_SEARCH_URL, WebSearch};
