//! Goal-to-flow planning.
//!
//! Planning runs in five phases, each backed by one oracle call:
//! plan synthesis, resolve-or-create of every candidate, sufficiency
//! validation, ordering, and input resolution. Oracle replies are advisory;
//! the planner only enforces that they parse and reference known actions.

use std::collections::HashSet;
use std::sync::Arc;

use flowsmith_core_types::{Action, ActionId, ActionRef, Flow, FlowExecution, Inputs};
use reasoning_oracle::{parse_json, ReasoningOracle};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::blocks::BlockManager;
use crate::errors::EngineError;
use crate::executor::FlowExecutor;
use crate::prompts;
use crate::repository::{ActionRepository, BlockRepository, FlowRepository};
use crate::schema::{CandidateAction, FlowPlanReply, SufficiencyReply};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Token budget for planning, validation and ordering replies.
    pub max_tokens: u32,
    /// Token budget for input extraction replies.
    pub extraction_max_tokens: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            extraction_max_tokens: 1000,
        }
    }
}

/// A materialized flow plus the inputs resolved for it.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedFlow {
    pub flow: Flow,
    pub inputs: Inputs,
}

pub struct FlowPlanner {
    oracle: Arc<dyn ReasoningOracle>,
    blocks: BlockRepository,
    actions: ActionRepository,
    flows: FlowRepository,
    block_manager: Arc<BlockManager>,
    executor: Arc<FlowExecutor>,
    config: PlannerConfig,
}

impl FlowPlanner {
    pub fn new(
        oracle: Arc<dyn ReasoningOracle>,
        blocks: BlockRepository,
        actions: ActionRepository,
        flows: FlowRepository,
        block_manager: Arc<BlockManager>,
        executor: Arc<FlowExecutor>,
    ) -> Self {
        Self {
            oracle,
            blocks,
            actions,
            flows,
            block_manager,
            executor,
            config: PlannerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Turns a natural-language goal into a stored flow.
    ///
    /// The flow is stored before inputs are resolved, so a
    /// [`EngineError::MissingInputs`] failure still names the flow it was for.
    pub async fn create_flow_from_prompt(
        &self,
        prompt: &str,
        initial_inputs: Inputs,
    ) -> Result<PlannedFlow, EngineError> {
        let plan: FlowPlanReply = self.ask("plan_synthesis", &prompts::plan_synthesis(prompt)).await?;
        info!(flow_name = %plan.flow_name, candidates = plan.actions.len(), "oracle proposed a plan");

        let mut resolved = Vec::with_capacity(plan.actions.len());
        for candidate in plan.actions {
            resolved.push(self.resolve(candidate).await?);
        }

        let verdict: SufficiencyReply = self
            .ask("sufficiency", &prompts::sufficiency(prompt, &resolved))
            .await?;
        if !verdict.is_sufficient {
            info!(missing = verdict.missing_capabilities.len(), "plan judged insufficient");
            for capability in verdict.missing_capabilities {
                resolved.push(self.resolve(capability).await?);
            }
        }

        let ordered: Vec<String> = self
            .ask("ordering", &prompts::ordering(prompt, &resolved))
            .await?;
        let action_refs = order_actions(&resolved, ordered)?;

        let flow = self
            .flows
            .create_flow(plan.flow_name, plan.flow_description, action_refs)
            .await?;
        info!(flow_id = %flow.id, actions = flow.actions.len(), "planned flow stored");

        let inputs = self.resolve_inputs(prompt, &flow, initial_inputs).await?;
        Ok(PlannedFlow { flow, inputs })
    }

    /// Plans a flow for `prompt` and runs it with the resolved inputs.
    pub async fn create_and_execute(
        &self,
        prompt: &str,
        initial_inputs: Inputs,
    ) -> Result<(PlannedFlow, FlowExecution), EngineError> {
        let planned = self.create_flow_from_prompt(prompt, initial_inputs).await?;
        let execution = self
            .executor
            .execute_flow(&planned.flow.id, planned.inputs.clone())
            .await?;
        Ok((planned, execution))
    }

    async fn ask<T: serde::de::DeserializeOwned>(
        &self,
        stage: &str,
        prompt: &str,
    ) -> Result<T, EngineError> {
        debug!(stage, "querying oracle");
        let reply = self.oracle.complete(prompt, self.config.max_tokens).await?;
        Ok(parse_json(stage, &reply)?)
    }

    /// Finds or creates the stored action standing for `candidate`, reusing the
    /// best stored match under a URL-matched block when there is one.
    async fn resolve(&self, candidate: CandidateAction) -> Result<Action, EngineError> {
        let blocks = self.blocks.search_by_url(&candidate.url).await?;
        let Some(block) = blocks.first() else {
            let hints = serde_json::to_string(&[&candidate])
                .map_err(|err| EngineError::malformed("resolve", err.to_string()))?;
            let created = self
                .block_manager
                .create_block(&format!("Block for {}", candidate.name), &candidate.url, &hints)
                .await?;
            return created.actions.into_iter().next().ok_or_else(|| {
                EngineError::malformed("website_analysis", "block created without actions")
            });
        };

        let block_ids: HashSet<_> = blocks.iter().map(|block| &block.id).collect();
        let reuse = self
            .actions
            .search(&candidate.search_text())
            .await?
            .into_iter()
            .find(|action| block_ids.contains(&action.block_id));
        if let Some(action) = reuse {
            debug!(action_id = %action.id, candidate = %candidate.name, "reusing stored action");
            return Ok(action);
        }

        let action = self
            .actions
            .store(candidate.into_new_action(block.id.clone()))
            .await?;
        debug!(action_id = %action.id, block_id = %block.id, "stored new action under existing block");
        Ok(action)
    }

    /// Checks the flow's required inputs, asking the oracle once to fill gaps from `prompt`.
    async fn resolve_inputs(
        &self,
        prompt: &str,
        flow: &Flow,
        mut inputs: Inputs,
    ) -> Result<Inputs, EngineError> {
        let missing = self.executor.check_missing_inputs(&flow.id, &inputs).await?;
        if missing.is_empty() {
            return Ok(inputs);
        }

        debug!(flow_id = %flow.id, ?missing, "extracting inputs from prompt");
        let reply = self
            .oracle
            .complete(
                &prompts::input_extraction(prompt, &missing),
                self.config.extraction_max_tokens,
            )
            .await?;
        let mut extracted: Inputs = parse_json("input_extraction", &reply)?;
        for name in &missing {
            match extracted.remove(name) {
                Some(serde_json::Value::Null) | None => {}
                Some(value) => {
                    inputs.insert(name.clone(), value);
                }
            }
        }

        let still_missing = self.executor.check_missing_inputs(&flow.id, &inputs).await?;
        if !still_missing.is_empty() {
            warn!(flow_id = %flow.id, missing = ?still_missing, "required inputs unresolved");
            return Err(EngineError::missing_inputs(still_missing, Some(flow.id.clone())));
        }
        Ok(inputs)
    }
}

/// Keeps the oracle's order, dropping repeats and ids that were never resolved.
fn order_actions(resolved: &[Action], ordered: Vec<String>) -> Result<Vec<ActionRef>, EngineError> {
    let known: HashSet<&str> = resolved.iter().map(|action| action.id.as_str()).collect();
    let mut seen = HashSet::new();
    let mut refs = Vec::with_capacity(ordered.len());
    for id in ordered {
        if !known.contains(id.as_str()) {
            warn!(action_id = %id, "ordering referenced an unknown action; dropped");
            continue;
        }
        if seen.insert(id.clone()) {
            refs.push(ActionRef::from(ActionId::from(id)));
        }
    }
    if refs.is_empty() {
        return Err(EngineError::malformed(
            "ordering",
            "no known action ids in ordering",
        ));
    }
    Ok(refs)
}
