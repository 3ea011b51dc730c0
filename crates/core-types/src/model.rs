use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    ActionExecutionId, ActionId, BlockId, ExecutionId, ExecutionStatus, FlowId, RemoteTaskId,
};

/// Named input values handed to a task (`navigation_payload` on the wire).
pub type Inputs = Map<String, Value>;

/// Data extracted by a finished task.
pub type Outputs = Map<String, Value>;

/// Block type assigned to blocks discovered for a website.
pub const BLOCK_TYPE_WEBSITE: &str = "website_based";

/// Fields required to register a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlock {
    pub name: String,
    #[serde(rename = "type")]
    pub block_type: String,
    pub url: String,
}

impl NewBlock {
    pub fn website(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            block_type: BLOCK_TYPE_WEBSITE.to_string(),
            url: url.into(),
        }
    }
}

/// Logical grouping of actions discovered for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub name: String,
    #[serde(rename = "type")]
    pub block_type: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Block {
    pub fn from_new(id: BlockId, block: NewBlock, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: block.name,
            block_type: block.block_type,
            url: block.url,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields required to register an action; id and timestamps are assigned on store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAction {
    pub block_id: BlockId,
    pub name: String,
    pub navigation_goal: String,
    #[serde(default)]
    pub data_extraction_goal: String,
    #[serde(default)]
    pub required_inputs: BTreeSet<String>,
    #[serde(default)]
    pub output_schema: BTreeMap<String, String>,
    pub url: String,
}

/// A parametrized browser automation bound to a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub block_id: BlockId,
    pub name: String,
    pub navigation_goal: String,
    #[serde(default)]
    pub data_extraction_goal: String,
    #[serde(default)]
    pub required_inputs: BTreeSet<String>,
    #[serde(default)]
    pub output_schema: BTreeMap<String, String>,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Action {
    pub fn from_new(id: ActionId, action: NewAction, now: DateTime<Utc>) -> Self {
        Self {
            id,
            block_id: action.block_id,
            name: action.name,
            navigation_goal: action.navigation_goal,
            data_extraction_goal: action.data_extraction_goal,
            required_inputs: action.required_inputs,
            output_schema: action.output_schema,
            url: action.url,
            created_at: now,
            updated_at: now,
        }
    }

    /// Free text used when matching this action against a planned capability.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.name, self.navigation_goal, self.data_extraction_goal
        )
    }
}

/// Reference from a flow to an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionRef {
    pub id: ActionId,
}

impl From<ActionId> for ActionRef {
    fn from(id: ActionId) -> Self {
        Self { id }
    }
}

/// Ordered, named sequence of action references. Order is execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    pub id: FlowId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub actions: Vec<ActionRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flow {
    pub fn action_ids(&self) -> impl Iterator<Item = &ActionId> {
        self.actions.iter().map(|action| &action.id)
    }
}

/// One dispatch of one action inside a flow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionExecution {
    pub id: ActionExecutionId,
    pub action_id: ActionId,
    pub inputs: Inputs,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub remote_task_id: Option<RemoteTaskId>,
    #[serde(default)]
    pub output: Option<Outputs>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ActionExecution {
    pub fn new(action_id: ActionId, inputs: Inputs) -> Self {
        Self {
            id: ActionExecutionId::new(),
            action_id,
            inputs,
            status: ExecutionStatus::Pending,
            remote_task_id: None,
            output: None,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn mark_running(&mut self, task_id: RemoteTaskId) {
        self.status = ExecutionStatus::Running;
        self.remote_task_id = Some(task_id);
        self.started_at = Some(Utc::now());
    }

    pub fn finish(&mut self, status: ExecutionStatus, output: Outputs, error: Option<String>) {
        self.status = status;
        self.output = Some(output);
        self.error = error;
        self.completed_at = Some(Utc::now());
    }

    pub fn is_completed(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }
}

/// Durable record of one run of a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowExecution {
    pub id: ExecutionId,
    pub flow_id: FlowId,
    pub initial_inputs: Inputs,
    pub action_executions: Vec<ActionExecution>,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub outputs: BTreeMap<ActionExecutionId, Outputs>,
    /// Execution this run picked up from when it was resumed at a checkpoint.
    #[serde(default)]
    pub resumed_from: Option<ExecutionId>,
}

impl FlowExecution {
    /// Creates a record already in the `running` state.
    pub fn start(flow_id: FlowId, initial_inputs: Inputs) -> Self {
        Self {
            id: ExecutionId::new(),
            flow_id,
            initial_inputs,
            action_executions: Vec::new(),
            status: ExecutionStatus::Running,
            started_at: Some(Utc::now()),
            completed_at: None,
            outputs: BTreeMap::new(),
            resumed_from: None,
        }
    }

    /// Appends a finished action execution and indexes its output.
    pub fn record(&mut self, execution: ActionExecution) {
        if let Some(output) = &execution.output {
            self.outputs.insert(execution.id.clone(), output.clone());
        }
        self.action_executions.push(execution);
    }

    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self) {
        self.status = ExecutionStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    /// Number of leading action executions that completed successfully.
    pub fn completed_prefix(&self) -> usize {
        self.action_executions
            .iter()
            .take_while(|execution| execution.is_completed())
            .count()
    }
}
