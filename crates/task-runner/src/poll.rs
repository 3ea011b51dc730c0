use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::TaskRunnerError;
use crate::model::{TaskHandle, TerminalResult};
use crate::TaskRunner;

/// Fixed-interval polling bounded by a wall-clock timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(3000),
        }
    }
}

/// Polls until the task reaches a terminal status.
///
/// Fails with [`TaskRunnerError::Timeout`] once more than `policy.timeout` has
/// elapsed without a terminal status; never earlier.
pub async fn await_completion(
    runner: &dyn TaskRunner,
    handle: &TaskHandle,
    policy: PollPolicy,
) -> Result<TerminalResult, TaskRunnerError> {
    poll_until_terminal(runner, handle, policy, None).await
}

/// Same as [`await_completion`], also stopping when `cancel` fires between ticks.
pub async fn await_completion_with_cancel(
    runner: &dyn TaskRunner,
    handle: &TaskHandle,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> Result<TerminalResult, TaskRunnerError> {
    poll_until_terminal(runner, handle, policy, Some(cancel)).await
}

async fn poll_until_terminal(
    runner: &dyn TaskRunner,
    handle: &TaskHandle,
    policy: PollPolicy,
    cancel: Option<&CancellationToken>,
) -> Result<TerminalResult, TaskRunnerError> {
    let started = Instant::now();
    let mut ticks = 0u32;
    loop {
        if started.elapsed() > policy.timeout {
            return Err(TaskRunnerError::Timeout {
                task_id: handle.task_id.clone(),
                timeout: policy.timeout,
            });
        }
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(TaskRunnerError::Cancelled {
                task_id: handle.task_id.clone(),
            });
        }

        let snapshot = runner.poll(handle).await?;
        ticks += 1;
        if snapshot.status.is_terminal() {
            debug!(task_id = %handle.task_id, status = %snapshot.status, ticks, "task reached terminal status");
            return Ok(snapshot.into());
        }
        debug!(task_id = %handle.task_id, status = %snapshot.status, ticks, "task still in flight");

        match cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => {
                        return Err(TaskRunnerError::Cancelled {
                            task_id: handle.task_id.clone(),
                        });
                    }
                    _ = sleep(policy.interval) => {}
                }
            }
            None => sleep(policy.interval).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskRequest, TaskSnapshot};
    use async_trait::async_trait;
    use flowsmith_core_types::TaskStatus;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays scripted statuses, repeating the last one forever.
    struct ScriptedRunner {
        statuses: Mutex<VecDeque<TaskStatus>>,
        last: Mutex<TaskStatus>,
        polls: AtomicUsize,
    }

    impl ScriptedRunner {
        fn new(statuses: &[TaskStatus]) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                last: Mutex::new(TaskStatus::Created),
                polls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TaskRunner for ScriptedRunner {
        async fn dispatch(&self, _request: &TaskRequest) -> Result<TaskHandle, TaskRunnerError> {
            Ok(TaskHandle::new("tsk_1"))
        }

        async fn poll(&self, handle: &TaskHandle) -> Result<TaskSnapshot, TaskRunnerError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let mut last = self.last.lock().unwrap();
            if let Some(next) = self.statuses.lock().unwrap().pop_front() {
                *last = next;
            }
            Ok(TaskSnapshot::new(handle.task_id.clone(), *last))
        }
    }

    fn policy(interval_secs: u64, timeout_secs: u64) -> PollPolicy {
        PollPolicy::new(
            Duration::from_secs(interval_secs),
            Duration::from_secs(timeout_secs),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn returns_first_terminal_status() {
        let runner = ScriptedRunner::new(&[
            TaskStatus::Queued,
            TaskStatus::Running,
            TaskStatus::Failed,
        ]);
        let result = await_completion(&runner, &TaskHandle::new("tsk_1"), policy(10, 300))
            .await
            .unwrap();
        assert_eq!(result.status, TaskStatus::Failed);
        assert!(result.extracted_information.is_empty());
        assert_eq!(runner.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_no_earlier_than_deadline() {
        let runner = ScriptedRunner::new(&[TaskStatus::Running]);
        let started = Instant::now();
        let err = await_completion(&runner, &TaskHandle::new("tsk_1"), policy(10, 35))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskRunnerError::Timeout { .. }));
        assert!(started.elapsed() >= Duration::from_secs(35));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_polling() {
        let runner = ScriptedRunner::new(&[TaskStatus::Running]);
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(15)).await;
            trigger.cancel();
        });

        let err = await_completion_with_cancel(
            &runner,
            &TaskHandle::new("tsk_1"),
            policy(10, 300),
            &token,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TaskRunnerError::Cancelled { .. }));
        assert_eq!(runner.polls.load(Ordering::SeqCst), 2);
    }
}
