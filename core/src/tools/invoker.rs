//! Validated, time-bounded execution of model-requested tool calls

use crate::error::ToolError;
use crate::tools::schema::validate_arguments;
use crate::tools::{ToolCall, ToolRegistry, ToolResult};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Executes tool calls against a registry.
///
/// `invoke` never returns an error: unknown tools, bad arguments, failures,
/// panics and timeouts all come back as a failed [`ToolResult`].
#[derive(Clone)]
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolInvoker {
    /// Create an invoker with a per-call timeout
    pub fn new(registry: Arc<ToolRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Execute a tool call
    pub async fn invoke(&self, call: &ToolCall) -> ToolResult {
        let start_time = Instant::now();
        let result = match self.run(call).await {
            Ok(payload) => ToolResult::success(call, payload),
            Err(error) => {
                warn!(
                    tool = %call.name,
                    call_id = %call.id,
                    kind = error.kind(),
                    "tool call failed: {}",
                    error
                );
                ToolResult::failure(call, error)
            }
        };
        let duration = start_time.elapsed().as_millis() as u64;

        debug!(tool = %call.name, call_id = %call.id, duration_ms = duration, "tool call finished");
        result.with_duration(duration)
    }

    async fn run(&self, call: &ToolCall) -> Result<serde_json::Value, ToolError> {
        let tool = self.registry.lookup(&call.name)?;
        let args = validate_arguments(&call.name, &tool.parameters(), &call.arguments)?;

        debug!(tool = %call.name, call_id = %call.id, "executing tool");

        let execution = AssertUnwindSafe(tool.execute(args)).catch_unwind();
        match tokio::time::timeout(self.timeout, execution).await {
            Err(_) => Err(ToolError::Timeout {
                name: call.name.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
            Ok(Err(panic)) => Err(ToolError::ExecutionFailed {
                name: call.name.clone(),
                message: panic_message(panic.as_ref()),
            }),
            Ok(Ok(Err(e))) => Err(ToolError::ExecutionFailed {
                name: call.name.clone(),
                message: e.to_string(),
            }),
            Ok(Ok(Ok(payload))) => Ok(payload),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("tool panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("tool panicked: {}", s)
    } else {
        "tool panicked".to_string()
    }
}
