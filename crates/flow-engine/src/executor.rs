use std::collections::BTreeSet;
use std::sync::Arc;

use flowsmith_core_types::{
    Action, ActionExecution, ActionId, ExecutionStatus, Flow, FlowExecution, FlowId, Inputs,
    Outputs,
};
use task_runner::{
    await_completion, await_completion_with_cancel, PollPolicy, TaskRequest, TaskRunner,
    TerminalResult,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::errors::EngineError;
use crate::repository::{ActionRepository, FlowRepository};

/// How `continue_flow_execution` treats work done by an earlier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumeMode {
    /// When the latest run failed, carry its completed steps forward and resume
    /// at the first step that did not complete. A latest run that completed or
    /// is still running is left alone and the flow starts from the beginning.
    #[default]
    Checkpoint,
    /// Run every action again from the start.
    Restart,
}

/// Runs flows action by action against the task runner.
///
/// Each run checkpoints its [`FlowExecution`] after every step, so a failed or
/// interrupted run leaves its completed steps in the store.
pub struct FlowExecutor {
    flows: FlowRepository,
    actions: ActionRepository,
    runner: Arc<dyn TaskRunner>,
    policy: PollPolicy,
    cancel: Option<CancellationToken>,
}

/// A step that did not complete, with the record to append when it was dispatched.
struct StepFailure {
    step: Option<ActionExecution>,
    error: EngineError,
}

impl StepFailure {
    fn before_dispatch(error: EngineError) -> Self {
        Self { step: None, error }
    }
}

impl FlowExecutor {
    pub fn new(
        flows: FlowRepository,
        actions: ActionRepository,
        runner: Arc<dyn TaskRunner>,
    ) -> Self {
        Self {
            flows,
            actions,
            runner,
            policy: PollPolicy::default(),
            cancel: None,
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stops awaiting remote tasks once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub async fn execute_flow(
        &self,
        flow_id: &FlowId,
        initial_inputs: Inputs,
    ) -> Result<FlowExecution, EngineError> {
        let flow = self.flows.get_flow(flow_id).await?;
        let execution = FlowExecution::start(flow.id.clone(), initial_inputs);
        self.run(&flow, execution).await
    }

    /// Runs `flow_id` again with `additional_inputs`.
    pub async fn continue_flow_execution(
        &self,
        flow_id: &FlowId,
        additional_inputs: Inputs,
        mode: ResumeMode,
    ) -> Result<FlowExecution, EngineError> {
        let flow = self.flows.get_flow(flow_id).await?;
        let previous = match mode {
            ResumeMode::Restart => None,
            ResumeMode::Checkpoint => self
                .flows
                .latest_execution(&flow.id)
                .await?
                .filter(|execution| execution.status == ExecutionStatus::Failed),
        };

        let execution = match previous {
            Some(previous) => resume_from(&flow, &previous, additional_inputs),
            None => {
                info!(flow_id = %flow.id, ?mode, "running flow from the start");
                FlowExecution::start(flow.id.clone(), additional_inputs)
            }
        };
        self.run(&flow, execution).await
    }

    /// Required inputs of every action in the flow that `provided` does not supply.
    pub async fn check_missing_inputs(
        &self,
        flow_id: &FlowId,
        provided: &Inputs,
    ) -> Result<BTreeSet<String>, EngineError> {
        let flow = self.flows.get_flow(flow_id).await?;
        let mut missing = BTreeSet::new();
        for action_id in flow.action_ids() {
            let action = self.actions.get(action_id).await?;
            missing.extend(missing_for(&action, provided));
        }
        Ok(missing)
    }

    async fn run(
        &self,
        flow: &Flow,
        mut execution: FlowExecution,
    ) -> Result<FlowExecution, EngineError> {
        self.flows.save_execution(&execution).await?;

        let mut accumulated = Outputs::new();
        for step in &execution.action_executions {
            if let Some(output) = &step.output {
                accumulated.extend(output.clone());
            }
        }

        let resume_at = execution.action_executions.len();
        info!(
            execution_id = %execution.id,
            flow_id = %flow.id,
            actions = flow.actions.len(),
            resume_at,
            "flow execution started"
        );

        for action_ref in flow.actions.iter().skip(resume_at) {
            match self
                .run_action(flow, &action_ref.id, &execution.initial_inputs, &accumulated)
                .await
            {
                Ok(step) => {
                    if let Some(output) = &step.output {
                        accumulated.extend(output.clone());
                    }
                    execution.record(step);
                    self.flows.save_execution(&execution).await?;
                }
                Err(StepFailure { step, error }) => {
                    if let Some(step) = step {
                        execution.record(step);
                    }
                    execution.fail();
                    warn!(
                        execution_id = %execution.id,
                        flow_id = %flow.id,
                        action_id = %action_ref.id,
                        error = %error,
                        "flow execution failed"
                    );
                    if let Err(save_err) = self.flows.save_execution(&execution).await {
                        warn!(execution_id = %execution.id, error = %save_err, "failed to persist failed execution");
                    }
                    return Err(error);
                }
            }
        }

        execution.complete();
        self.flows.save_execution(&execution).await?;
        info!(execution_id = %execution.id, flow_id = %flow.id, "flow execution completed");
        Ok(execution)
    }

    async fn run_action(
        &self,
        flow: &Flow,
        action_id: &ActionId,
        inputs: &Inputs,
        accumulated: &Outputs,
    ) -> Result<ActionExecution, StepFailure> {
        let action = self
            .actions
            .get(action_id)
            .await
            .map_err(StepFailure::before_dispatch)?;

        let mut task_inputs = inputs.clone();
        task_inputs.extend(accumulated.clone());

        let missing = missing_for(&action, &task_inputs);
        if !missing.is_empty() {
            return Err(StepFailure::before_dispatch(EngineError::missing_inputs(
                missing,
                Some(flow.id.clone()),
            )));
        }

        let request = TaskRequest::new(
            &action.url,
            &action.navigation_goal,
            &action.data_extraction_goal,
            task_inputs.clone(),
        );
        let handle = self
            .runner
            .dispatch(&request)
            .await
            .map_err(|err| StepFailure::before_dispatch(err.into()))?;

        let mut step = ActionExecution::new(action.id.clone(), task_inputs);
        step.mark_running(handle.task_id.clone());
        info!(
            flow_id = %flow.id,
            action_id = %action.id,
            task_id = %handle.task_id,
            url = %request.url,
            "dispatched action"
        );

        let awaited = match &self.cancel {
            Some(token) => {
                await_completion_with_cancel(self.runner.as_ref(), &handle, self.policy, token)
                    .await
            }
            None => await_completion(self.runner.as_ref(), &handle, self.policy).await,
        };

        match awaited {
            Ok(result) => match ExecutionStatus::from_terminal(result.status) {
                Some(ExecutionStatus::Completed) => {
                    step.finish(
                        ExecutionStatus::Completed,
                        result.extracted_information,
                        None,
                    );
                    Ok(step)
                }
                _ => Err(remote_failure(step, &action, result)),
            },
            Err(err) => {
                step.finish(ExecutionStatus::Failed, Outputs::new(), Some(err.to_string()));
                Err(StepFailure {
                    step: Some(step),
                    error: err.into(),
                })
            }
        }
    }
}

fn remote_failure(mut step: ActionExecution, action: &Action, result: TerminalResult) -> StepFailure {
    let TerminalResult {
        task_id,
        status,
        extracted_information,
        failure_reason,
    } = result;
    let message = failure_reason
        .clone()
        .unwrap_or_else(|| format!("remote task ended with status {status}"));
    step.finish(ExecutionStatus::Failed, extracted_information, Some(message));
    StepFailure {
        step: Some(step),
        error: EngineError::RemoteTaskFailure {
            action_id: action.id.clone(),
            task_id,
            status,
            reason: failure_reason,
        },
    }
}

/// Carries the completed prefix of `previous` into a new run.
fn resume_from(flow: &Flow, previous: &FlowExecution, additional_inputs: Inputs) -> FlowExecution {
    let mut inputs = previous.initial_inputs.clone();
    inputs.extend(additional_inputs);

    let mut execution = FlowExecution::start(flow.id.clone(), inputs);
    execution.resumed_from = Some(previous.id.clone());
    for (step, action_id) in previous.action_executions.iter().zip(flow.action_ids()) {
        if !step.is_completed() || &step.action_id != action_id {
            break;
        }
        execution.record(step.clone());
    }

    info!(
        execution_id = %execution.id,
        resumed_from = %previous.id,
        carried = execution.action_executions.len(),
        "resuming flow from checkpoint"
    );
    execution
}

fn missing_for(action: &Action, provided: &Inputs) -> BTreeSet<String> {
    action
        .required_inputs
        .iter()
        .filter(|name| !provided.contains_key(name.as_str()))
        .cloned()
        .collect()
}
