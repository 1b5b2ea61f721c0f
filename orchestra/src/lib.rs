#![deny(missing_docs)]
//! # orchestra: umbrella crate
//!
//! A single import surface for the orchestra workspace. Re-exports the
//! member crates behind feature flags, plus a `prelude` for the common path:
//! build a [`ToolRegistry`](orchestra_tool::ToolRegistry), wrap it in an
//! `Arc`, hand it to an [`ExecutionLoop`](orchestra_loop::ExecutionLoop)
//! with a brain client, and call `run_query`.

#[cfg(feature = "core")]
pub use orchestra_loop;
#[cfg(feature = "provider-openai")]
pub use orchestra_provider_openai;
#[cfg(feature = "core")]
pub use orchestra_route;
#[cfg(feature = "core")]
pub use orchestra_tool;
#[cfg(feature = "tools")]
pub use orchestra_tools;
#[cfg(feature = "core")]
pub use orchestra_turn;
#[cfg(feature = "core")]
pub use orchestra_types;

/// Common imports for composing a loop.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use orchestra_types::{
        Action, CapabilityClass, CostClass, Decimal, ErrorKind, LatencyClass, LoopError,
        LoopResult, PreferenceVector, TerminationReason, ToolDescriptor, ToolKind, ToolResult,
        Turn,
    };

    #[cfg(feature = "core")]
    pub use orchestra_tool::{ToolError, ToolExecutor, ToolOutput, ToolRegistry};

    #[cfg(feature = "core")]
    pub use orchestra_turn::{BrainClient, BrainError, BrainRequest, BrainResponse};

    #[cfg(feature = "core")]
    pub use orchestra_route::RoutingPolicy;

    #[cfg(feature = "core")]
    pub use orchestra_loop::{CancellationToken, ExecutionLoop, LoopConfig};

    #[cfg(feature = "provider-openai")]
    pub use orchestra_provider_openai::{OpenAiCompatible, Pricing};

    #[cfg(feature = "tools")]
    pub use orchestra_tools::{ModelTool, PythonSandbox, WebSearch};
}
