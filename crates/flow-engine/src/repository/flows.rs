use std::sync::Arc;

use chrono::Utc;
use flowsmith_core_types::{ActionRef, ExecutionId, ExecutionStatus, Flow, FlowExecution, FlowId};
use flowsmith_doc_store::{DocumentStore, FieldFilter, EXECUTIONS, FLOWS};
use tracing::debug;

use super::{decode, encode};
use crate::errors::EngineError;

/// Flow definitions and their execution records.
#[derive(Clone)]
pub struct FlowRepository {
    store: Arc<dyn DocumentStore>,
}

impl FlowRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create_flow(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        actions: Vec<ActionRef>,
    ) -> Result<Flow, EngineError> {
        let now = Utc::now();
        let flow = Flow {
            id: FlowId::new(),
            name: name.into(),
            description: description.into(),
            actions,
            created_at: now,
            updated_at: now,
        };
        let document = encode(flow.id.as_str(), &flow)?
            .with_field("name", flow.name.clone())
            .with_field("description", flow.description.clone());
        self.store.put(FLOWS, document).await?;
        debug!(flow_id = %flow.id, actions = flow.actions.len(), "stored flow");
        Ok(flow)
    }

    pub async fn get_flow(&self, id: &FlowId) -> Result<Flow, EngineError> {
        match self.store.get(FLOWS, id.as_str()).await? {
            Some(document) => decode(FLOWS, document),
            None => Err(EngineError::not_found("flow", id)),
        }
    }

    pub async fn list_flows(&self, limit: usize) -> Result<Vec<Flow>, EngineError> {
        self.store
            .list(FLOWS, limit)
            .await?
            .into_iter()
            .map(|document| decode(FLOWS, document))
            .collect()
    }

    /// Inserts or replaces the execution record.
    pub async fn save_execution(&self, execution: &FlowExecution) -> Result<(), EngineError> {
        let document = encode(execution.id.as_str(), execution)?
            .with_field("flow_id", execution.flow_id.as_str())
            .with_field("status", execution.status.as_str());
        self.store.put(EXECUTIONS, document).await?;
        debug!(
            execution_id = %execution.id,
            flow_id = %execution.flow_id,
            status = %execution.status,
            steps = execution.action_executions.len(),
            "checkpointed execution"
        );
        Ok(())
    }

    pub async fn get_execution(&self, id: &ExecutionId) -> Result<FlowExecution, EngineError> {
        match self.store.get(EXECUTIONS, id.as_str()).await? {
            Some(document) => decode(EXECUTIONS, document),
            None => Err(EngineError::not_found("execution", id)),
        }
    }

    /// Executions in insertion order, optionally narrowed to one flow and status.
    pub async fn list_executions(
        &self,
        flow_id: Option<&FlowId>,
        status: Option<ExecutionStatus>,
    ) -> Result<Vec<FlowExecution>, EngineError> {
        let mut filters = Vec::new();
        if let Some(id) = flow_id {
            filters.push(FieldFilter::new("flow_id", id.as_str()));
        }
        if let Some(status) = status {
            filters.push(FieldFilter::new("status", status.as_str()));
        }
        self.store
            .scan(EXECUTIONS, &filters)
            .await?
            .into_iter()
            .map(|document| decode(EXECUTIONS, document))
            .collect()
    }

    /// Most recently started execution of `flow_id`, if any.
    pub async fn latest_execution(
        &self,
        flow_id: &FlowId,
    ) -> Result<Option<FlowExecution>, EngineError> {
        Ok(self
            .list_executions(Some(flow_id), None)
            .await?
            .into_iter()
            .max_by_key(|execution| execution.started_at))
    }
}
