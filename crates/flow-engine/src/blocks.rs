use std::sync::Arc;

use flowsmith_core_types::{Action, Block, NewBlock};
use reasoning_oracle::{parse_json, ReasoningOracle};
use serde::Serialize;
use tracing::info;

use crate::errors::EngineError;
use crate::prompts;
use crate::repository::{ActionRepository, BlockRepository};
use crate::schema::SuggestionReply;

/// Token budget for website analysis replies.
pub const SUGGESTION_MAX_TOKENS: u32 = 1000;

/// A freshly created block with the actions suggested for it, in suggestion order.
#[derive(Debug, Clone, Serialize)]
pub struct BlockWithActions {
    pub block: Block,
    pub actions: Vec<Action>,
}

/// Creates website blocks and seeds them with oracle-suggested actions.
pub struct BlockManager {
    blocks: BlockRepository,
    actions: ActionRepository,
    oracle: Arc<dyn ReasoningOracle>,
}

impl BlockManager {
    pub fn new(
        blocks: BlockRepository,
        actions: ActionRepository,
        oracle: Arc<dyn ReasoningOracle>,
    ) -> Self {
        Self {
            blocks,
            actions,
            oracle,
        }
    }

    /// Stores a website block for `url` and one action per oracle suggestion.
    ///
    /// `action_hints` is passed to the oracle verbatim.
    pub async fn create_block(
        &self,
        name: &str,
        url: &str,
        action_hints: &str,
    ) -> Result<BlockWithActions, EngineError> {
        let block = self.blocks.store(NewBlock::website(name, url)).await?;

        let reply = self
            .oracle
            .complete(
                &prompts::website_suggestions(url, action_hints),
                SUGGESTION_MAX_TOKENS,
            )
            .await?;
        let suggestions: SuggestionReply = parse_json("website_analysis", &reply)?;
        if suggestions.actions.is_empty() {
            return Err(EngineError::malformed(
                "website_analysis",
                format!("no actions suggested for {url}"),
            ));
        }

        let mut actions = Vec::with_capacity(suggestions.actions.len());
        for suggestion in suggestions.actions {
            let action = self
                .actions
                .store(suggestion.into_new_action(block.id.clone(), &block.url))
                .await?;
            actions.push(action);
        }

        info!(block_id = %block.id, url = %block.url, actions = actions.len(), "created block");
        Ok(BlockWithActions { block, actions })
    }
}
