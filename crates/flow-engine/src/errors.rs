use std::collections::BTreeSet;
use std::time::Duration;

use flowsmith_core_types::{ActionId, FlowId, RemoteTaskId, TaskStatus};
use flowsmith_doc_store::StoreError;
use reasoning_oracle::OracleError;
use task_runner::TaskRunnerError;
use thiserror::Error;

/// Errors surfaced by the planning and execution engine.
///
/// Every variant is fatal to the in-flight operation. Partial progress that was
/// already persisted stays in the store.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A block, action, flow or execution id did not resolve.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// The remote task did not reach a terminal status in time.
    #[error("task {task_id} did not complete within {}s", .timeout.as_secs_f64())]
    Timeout {
        task_id: RemoteTaskId,
        timeout: Duration,
    },

    /// The oracle answered with something other than the requested JSON.
    #[error("malformed oracle response during {stage}: {reason}")]
    MalformedOracleResponse { stage: String, reason: String },

    /// Required inputs are still absent.
    #[error("missing required inputs: {}", join(.fields))]
    MissingInputs {
        fields: BTreeSet<String>,
        /// Flow the inputs are needed for, when one was already materialized.
        flow_id: Option<FlowId>,
    },

    /// The remote task ended in a terminal status other than `completed`.
    #[error("action {action_id} failed remotely (task {task_id}, status {status}){}", reason_suffix(.reason))]
    RemoteTaskFailure {
        action_id: ActionId,
        task_id: RemoteTaskId,
        status: TaskStatus,
        reason: Option<String>,
    },

    /// Execution was cancelled while awaiting a remote task.
    #[error("execution cancelled while awaiting task {task_id}")]
    Cancelled { task_id: RemoteTaskId },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("oracle unavailable: {0}")]
    Oracle(String),

    #[error("task runner error: {0}")]
    TaskRunner(String),
}

impl EngineError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn malformed(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedOracleResponse {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_inputs(fields: BTreeSet<String>, flow_id: Option<FlowId>) -> Self {
        Self::MissingInputs { fields, flow_id }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Timeout { .. } => "timeout",
            Self::MalformedOracleResponse { .. } => "malformed_oracle_response",
            Self::MissingInputs { .. } => "missing_inputs",
            Self::RemoteTaskFailure { .. } => "remote_task_failure",
            Self::Cancelled { .. } => "cancelled",
            Self::Store(_) => "store",
            Self::Oracle(_) => "oracle",
            Self::TaskRunner(_) => "task_runner",
        }
    }
}

impl From<OracleError> for EngineError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::Malformed { stage, reason } => Self::MalformedOracleResponse { stage, reason },
            other => Self::Oracle(other.to_string()),
        }
    }
}

impl From<TaskRunnerError> for EngineError {
    fn from(err: TaskRunnerError) -> Self {
        match err {
            TaskRunnerError::Timeout { task_id, timeout } => Self::Timeout { task_id, timeout },
            TaskRunnerError::Cancelled { task_id } => Self::Cancelled { task_id },
            other => Self::TaskRunner(other.to_string()),
        }
    }
}

fn join(fields: &BTreeSet<String>) -> String {
    fields.iter().cloned().collect::<Vec<_>>().join(", ")
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|reason| format!(": {reason}"))
        .unwrap_or_default()
}
