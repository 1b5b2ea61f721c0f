//! `python_sandbox`: run a snippet in a separate Python process.

use std::process::Stdio;

use async_trait::async_trait;
use orchestra_tool::{ToolError, ToolExecutor, ToolOutput};
use orchestra_types::{CapabilityClass, CostClass, LatencyClass, ToolDescriptor, ToolKind};
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Longest stdout or stderr kept in the result, in characters.
const MAX_STREAM_CHARS: usize = 16_000;

/// Executes Python code in an isolated interpreter (`python3 -I`).
///
/// The code is piped through stdin, so nothing touches the filesystem. The
/// child is killed when the call is dropped, which is how the registry's
/// timeout stops runaway scripts.
#[derive(Debug, Clone)]
pub struct PythonSandbox {
    interpreter: String,
}

impl PythonSandbox {
    /// Registry name.
    pub const NAME: &'static str = "python_sandbox";

    /// Use `python3` from `PATH`.
    pub fn new() -> Self {
        Self {
            interpreter: "python3".into(),
        }
    }

    /// Use a specific interpreter binary.
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Local, free, computation.
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            "Executes Python code for math, logic, and data processing. \
             Returns stdout/stderr. Use for calculations, data transformation, \
             and programmatic operations. Print the values you need.",
            json!({
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": "Valid Python code to execute"
                    }
                },
                "required": ["code"]
            }),
        )
        .with_cost(CostClass::Free)
        .with_latency(LatencyClass::Fast)
        .with_capability(CapabilityClass::Standard)
        .with_kind(ToolKind::Computation)
    }
}

impl Default for PythonSandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for PythonSandbox {
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let code = arguments
            .get("code")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidInput("code must be a string".into()))?;

        let mut child = Command::new(&self.interpreter)
            .arg("-I")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                ToolError::Unavailable(format!("failed to start '{}': {err}", self.interpreter))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolError::ExecutionFailed("interpreter stdin is unavailable".into()))?;
        stdin.write_all(code.as_bytes()).await.map_err(|err| {
            ToolError::ExecutionFailed(format!("failed to send code to interpreter: {err}"))
        })?;
        drop(stdin);

        let output = child.wait_with_output().await.map_err(|err| {
            ToolError::ExecutionFailed(format!("failed waiting for interpreter: {err}"))
        })?;

        let stdout = clip(&String::from_utf8_lossy(&output.stdout));
        let stderr = clip(&String::from_utf8_lossy(&output.stderr));
        tracing::debug!(
            status = %output.status,
            code_len = code.len(),
            stdout_len = stdout.len(),
            "python snippet finished"
        );

        if !output.status.success() {
            return Err(ToolError::ExecutionFailed(format!(
                "python exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let result = match stdout.trim() {
            "" => "(No output)",
            text => text,
        };
        Ok(ToolOutput::new(json!({
            "status": "success",
            "stdout": stdout,
            "stderr": stderr,
            "result": result,
        })))
    }
}

fn clip(text: &str) -> String {
    match text.char_indices().nth(MAX_STREAM_CHARS) {
        Some((boundary, _)) => format!("{}\n... [output truncated]", &text[..boundary]),
        None => text.to_string(),
    }
}
