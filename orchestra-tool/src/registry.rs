//! Tool registry: register, resolve, list, and dispatch tools.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use orchestra_types::{ErrorKind, ToolDescriptor, ToolResult};
use serde_json::Value;
use thiserror::Error;

use crate::executor::{ToolError, ToolExecutor};
use crate::finish::FinishTool;
use crate::validate::validate_arguments;

/// Errors from registry composition and lookup.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A tool with this name is already registered.
    #[error("tool already registered: {0}")]
    DuplicateName(String),
    /// No tool with this name is registered.
    #[error("tool not found: {0}")]
    NotFound(String),
}

struct Entry {
    descriptor: ToolDescriptor,
    executor: Arc<dyn ToolExecutor>,
}

/// Name-keyed tool registry.
///
/// Keeps registration order for listing. Every registry starts with the
/// built-in [`FinishTool`].
pub struct ToolRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// A registry holding only `finish`.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::new(),
            index: HashMap::new(),
        };
        registry.insert(FinishTool::descriptor(), Arc::new(FinishTool));
        registry
    }

    /// Register a tool under its descriptor's name.
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        executor: Arc<dyn ToolExecutor>,
    ) -> Result<(), RegistryError> {
        if self.index.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateName(descriptor.name));
        }
        tracing::debug!(tool = %descriptor.name, local = descriptor.is_local, "registered tool");
        self.insert(descriptor, executor);
        Ok(())
    }

    fn insert(&mut self, descriptor: ToolDescriptor, executor: Arc<dyn ToolExecutor>) {
        self.index.insert(descriptor.name.clone(), self.entries.len());
        self.entries.push(Entry {
            descriptor,
            executor,
        });
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Look up the executor registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ToolExecutor>, RegistryError> {
        self.entry(name)
            .map(|e| Arc::clone(&e.executor))
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Descriptor registered under `name`.
    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.entry(name).map(|e| &e.descriptor)
    }

    /// Whether a tool named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Descriptors of available tools matching `predicate`, in registration
    /// order.
    pub fn list_available<P>(&self, predicate: P) -> Vec<ToolDescriptor>
    where
        P: Fn(&ToolDescriptor) -> bool,
    {
        self.entries
            .iter()
            .filter(|e| e.executor.is_available() && predicate(&e.descriptor))
            .map(|e| e.descriptor.clone())
            .collect()
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.descriptor.name.as_str())
    }

    /// Number of registered tools, `finish` included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: `finish` is registered from the start.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate and run a tool. Never fails outward; every problem comes
    /// back as a failed [`ToolResult`].
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> ToolResult {
        self.run(name, arguments, None).await
    }

    /// [`dispatch`](Self::dispatch) with a deadline on the executor.
    pub async fn dispatch_with_timeout(
        &self,
        name: &str,
        arguments: &Value,
        timeout: Duration,
    ) -> ToolResult {
        self.run(name, arguments, Some(timeout)).await
    }

    async fn run(&self, name: &str, arguments: &Value, timeout: Option<Duration>) -> ToolResult {
        let Some(entry) = self.entry(name) else {
            tracing::warn!(tool = %name, "dispatch to unregistered tool");
            return ToolResult::failed(ErrorKind::NotFound, format!("tool not found: {name}"));
        };

        if let Err(message) = validate_arguments(arguments, &entry.descriptor.parameter_schema) {
            tracing::debug!(tool = %name, %message, "arguments rejected");
            return ToolResult::failed(
                ErrorKind::Validation,
                format!("invalid arguments for {name}: {message}"),
            );
        }

        let started = Instant::now();
        let call = AssertUnwindSafe(entry.executor.execute(arguments.clone())).catch_unwind();
        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_elapsed) => {
                    tracing::warn!(tool = %name, timeout_secs = limit.as_secs_f64(), "tool timed out");
                    return ToolResult::failed(
                        ErrorKind::Timeout,
                        format!("tool '{name}' timed out after {:.1}s", limit.as_secs_f64()),
                    )
                    .with_latency_ms(elapsed_ms(started));
                }
            },
            None => call.await,
        };
        let latency_ms = elapsed_ms(started);

        let result = match outcome {
            Ok(Ok(output)) => ToolResult::ok(output.output).with_cost(output.cost),
            Ok(Err(ToolError::InvalidInput(message))) => ToolResult::failed(
                ErrorKind::Validation,
                format!("invalid arguments for {name}: {message}"),
            ),
            Ok(Err(err)) => ToolResult::failed(ErrorKind::Execution, err.to_string()),
            Err(panic) => ToolResult::failed(
                ErrorKind::Execution,
                format!("tool '{name}' panicked: {}", panic_message(&*panic)),
            ),
        };

        match &result.error {
            None => {
                tracing::debug!(tool = %name, latency_ms, cost = %result.cost_incurred, "tool succeeded");
            }
            Some(failure) => {
                tracing::warn!(
                    tool = %name,
                    latency_ms,
                    kind = ?failure.kind,
                    error = %failure.message,
                    "tool failed"
                );
            }
        }
        result.with_latency_ms(latency_ms)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_registry_has_finish() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("finish"));
        assert!(registry.resolve("finish").is_ok());
        assert_eq!(
            registry.resolve("nope").err(),
            Some(RegistryError::NotFound("nope".into()))
        );
    }

    #[test]
    fn duplicate_finish_is_rejected() {
        let mut registry = ToolRegistry::new();
        let err = registry
            .register(FinishTool::descriptor(), Arc::new(FinishTool))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("finish".into()));
    }

    #[test]
    fn panic_message_extracts_strings() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*payload), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*payload), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&*payload), "unknown panic");
    }
}
