use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownStatus;

/// Status reported by the remote task runner for a single automation task.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Created,
    Queued,
    Running,
    Completed,
    Terminated,
    Failed,
    Canceled,
}

impl TaskStatus {
    pub const TERMINAL: [TaskStatus; 4] = [
        TaskStatus::Completed,
        TaskStatus::Failed,
        TaskStatus::Terminated,
        TaskStatus::Canceled,
    ];

    pub fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Created => "created",
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Terminated => "terminated",
            TaskStatus::Failed => "failed",
            TaskStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "created" => Ok(TaskStatus::Created),
            "queued" => Ok(TaskStatus::Queued),
            "running" => Ok(TaskStatus::Running),
            "completed" => Ok(TaskStatus::Completed),
            "terminated" => Ok(TaskStatus::Terminated),
            "failed" => Ok(TaskStatus::Failed),
            // both spellings show up in runner payloads
            "canceled" | "cancelled" => Ok(TaskStatus::Canceled),
            other => Err(UnknownStatus {
                kind: "task",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle of an [`crate::ActionExecution`] or [`crate::FlowExecution`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    /// Maps a terminal remote status onto the execution status it finalizes to.
    /// Returns `None` while the remote task is still in flight.
    pub fn from_terminal(status: TaskStatus) -> Option<Self> {
        match status {
            TaskStatus::Completed => Some(ExecutionStatus::Completed),
            TaskStatus::Failed | TaskStatus::Terminated | TaskStatus::Canceled => {
                Some(ExecutionStatus::Failed)
            }
            TaskStatus::Created | TaskStatus::Queued | TaskStatus::Running => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ExecutionStatus::Pending),
            "running" => Ok(ExecutionStatus::Running),
            "completed" => Ok(ExecutionStatus::Completed),
            "failed" => Ok(ExecutionStatus::Failed),
            other => Err(UnknownStatus {
                kind: "execution",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_four_statuses_are_terminal() {
        let terminal: Vec<_> = [
            TaskStatus::Created,
            TaskStatus::Queued,
            TaskStatus::Running,
            TaskStatus::Completed,
            TaskStatus::Terminated,
            TaskStatus::Failed,
            TaskStatus::Canceled,
        ]
        .into_iter()
        .filter(|status| status.is_terminal())
        .collect();
        assert_eq!(terminal.len(), 4);
        assert!(!TaskStatus::Queued.is_terminal());
    }

    #[test]
    fn remote_failures_finalize_as_failed() {
        for status in [
            TaskStatus::Failed,
            TaskStatus::Terminated,
            TaskStatus::Canceled,
        ] {
            assert_eq!(
                ExecutionStatus::from_terminal(status),
                Some(ExecutionStatus::Failed)
            );
        }
        assert_eq!(
            ExecutionStatus::from_terminal(TaskStatus::Completed),
            Some(ExecutionStatus::Completed)
        );
        assert_eq!(ExecutionStatus::from_terminal(TaskStatus::Running), None);
    }

    #[test]
    fn parses_british_cancel_spelling() {
        assert_eq!("cancelled".parse::<TaskStatus>(), Ok(TaskStatus::Canceled));
        assert!("exploded".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn statuses_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Running).unwrap(),
            "\"running\""
        );
        let parsed: TaskStatus = serde_json::from_str("\"terminated\"").unwrap();
        assert_eq!(parsed, TaskStatus::Terminated);
    }
}
