use flowsmith_core_types::{Inputs, Outputs, RemoteTaskId, TaskStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefixes `https://` unless the URL already carries an http(s) scheme.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Everything the runner needs to execute one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub url: String,
    pub navigation_goal: String,
    pub data_extraction_goal: String,
    pub inputs: Inputs,
}

impl TaskRequest {
    pub fn new(
        url: &str,
        navigation_goal: impl Into<String>,
        data_extraction_goal: impl Into<String>,
        inputs: Inputs,
    ) -> Self {
        Self {
            url: normalize_url(url),
            navigation_goal: navigation_goal.into(),
            data_extraction_goal: data_extraction_goal.into(),
            inputs,
        }
    }
}

/// Reference to a dispatched remote task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle {
    pub task_id: RemoteTaskId,
}

impl TaskHandle {
    pub fn new(task_id: impl Into<RemoteTaskId>) -> Self {
        Self {
            task_id: task_id.into(),
        }
    }
}

/// Point-in-time view of a remote task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    pub task_id: RemoteTaskId,
    pub status: TaskStatus,
    pub extracted_information: Outputs,
    pub failure_reason: Option<String>,
}

impl TaskSnapshot {
    pub fn new(task_id: impl Into<RemoteTaskId>, status: TaskStatus) -> Self {
        Self {
            task_id: task_id.into(),
            status,
            extracted_information: Outputs::new(),
            failure_reason: None,
        }
    }

    pub fn with_extracted(mut self, extracted: Option<Value>) -> Self {
        self.extracted_information = normalize_extracted(extracted);
        self
    }

    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }
}

/// Final state of a remote task; `status` is always terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalResult {
    pub task_id: RemoteTaskId,
    pub status: TaskStatus,
    pub extracted_information: Outputs,
    pub failure_reason: Option<String>,
}

impl From<TaskSnapshot> for TerminalResult {
    fn from(snapshot: TaskSnapshot) -> Self {
        Self {
            task_id: snapshot.task_id,
            status: snapshot.status,
            extracted_information: snapshot.extracted_information,
            failure_reason: snapshot.failure_reason,
        }
    }
}

/// Missing or null extraction becomes an empty mapping; scalars and arrays are
/// wrapped under `value`.
pub(crate) fn normalize_extracted(extracted: Option<Value>) -> Outputs {
    match extracted {
        None | Some(Value::Null) => Outputs::new(),
        Some(Value::Object(map)) => map,
        Some(other) => {
            let mut wrapped = Outputs::new();
            wrapped.insert("value".to_string(), other);
            wrapped
        }
    }
}
