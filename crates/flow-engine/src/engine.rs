use std::sync::Arc;

use flowsmith_doc_store::{DocumentStore, ALL_COLLECTIONS};
use reasoning_oracle::ReasoningOracle;
use task_runner::{PollPolicy, TaskRunner};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::blocks::BlockManager;
use crate::errors::EngineError;
use crate::executor::FlowExecutor;
use crate::planner::{FlowPlanner, PlannerConfig};
use crate::repository::{ActionRepository, BlockRepository, FlowRepository, DEFAULT_MIN_SCORE};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum similarity for search hits to count as candidates.
    pub min_score: f64,
    pub poll: PollPolicy,
    pub planner: PlannerConfig,
    pub cancel: Option<CancellationToken>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            poll: PollPolicy::default(),
            planner: PlannerConfig::default(),
            cancel: None,
        }
    }
}

/// Every engine component, wired over one set of collaborators.
pub struct Engine {
    pub blocks: BlockRepository,
    pub actions: ActionRepository,
    pub flows: FlowRepository,
    pub block_manager: Arc<BlockManager>,
    pub executor: Arc<FlowExecutor>,
    pub planner: FlowPlanner,
}

impl Engine {
    /// Ensures the store collections exist and builds the components.
    pub async fn bootstrap(
        store: Arc<dyn DocumentStore>,
        runner: Arc<dyn TaskRunner>,
        oracle: Arc<dyn ReasoningOracle>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        for collection in ALL_COLLECTIONS {
            store.ensure_collection(collection).await?;
        }

        let blocks = BlockRepository::new(store.clone()).with_min_score(config.min_score);
        let actions = ActionRepository::new(store.clone()).with_min_score(config.min_score);
        let flows = FlowRepository::new(store);

        let block_manager = Arc::new(BlockManager::new(
            blocks.clone(),
            actions.clone(),
            oracle.clone(),
        ));

        let mut executor =
            FlowExecutor::new(flows.clone(), actions.clone(), runner).with_poll_policy(config.poll);
        if let Some(token) = config.cancel {
            executor = executor.with_cancellation(token);
        }
        let executor = Arc::new(executor);

        let planner = FlowPlanner::new(
            oracle,
            blocks.clone(),
            actions.clone(),
            flows.clone(),
            block_manager.clone(),
            executor.clone(),
        )
        .with_config(config.planner);

        info!(min_score = config.min_score, "flow engine ready");
        Ok(Self {
            blocks,
            actions,
            flows,
            block_manager,
            executor,
            planner,
        })
    }
}
