use std::time::Duration;

use flowsmith_core_types::RemoteTaskId;
use thiserror::Error;

/// Errors emitted by the task runner client.
#[derive(Debug, Error)]
pub enum TaskRunnerError {
    /// HTTP transport failure.
    #[error("task runner request failed: {0}")]
    Transport(String),

    /// The runner answered with a non-success status code.
    #[error("task runner returned {status}: {body}")]
    Backend { status: u16, body: String },

    /// The runner answered with a body we cannot interpret.
    #[error("invalid task runner response: {0}")]
    InvalidResponse(String),

    /// No terminal status was observed before the deadline.
    #[error("task {task_id} did not complete within {}s", .timeout.as_secs_f64())]
    Timeout {
        task_id: RemoteTaskId,
        timeout: Duration,
    },

    /// Polling was cancelled from outside.
    #[error("polling of task {task_id} was cancelled")]
    Cancelled { task_id: RemoteTaskId },
}

impl TaskRunnerError {
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}
