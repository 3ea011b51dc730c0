use std::sync::Arc;

use chrono::Utc;
use flowsmith_core_types::{Block, BlockId, NewBlock};
use flowsmith_doc_store::{DocumentStore, SearchQuery, BLOCKS};
use tracing::debug;

use super::{decode, encode, site_query, DEFAULT_MIN_SCORE};
use crate::errors::EngineError;

/// Blocks grouped by website.
#[derive(Clone)]
pub struct BlockRepository {
    store: Arc<dyn DocumentStore>,
    min_score: f64,
}

impl BlockRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            min_score: DEFAULT_MIN_SCORE,
        }
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub async fn store(&self, block: NewBlock) -> Result<Block, EngineError> {
        let block = Block::from_new(BlockId::new(), block, Utc::now());
        let document = encode(block.id.as_str(), &block)?
            .with_field("name", block.name.clone())
            .with_field("type", block.block_type.clone())
            .with_field("url", block.url.clone());
        self.store.put(BLOCKS, document).await?;
        debug!(block_id = %block.id, url = %block.url, "stored block");
        Ok(block)
    }

    pub async fn get(&self, id: &BlockId) -> Result<Block, EngineError> {
        match self.store.get(BLOCKS, id.as_str()).await? {
            Some(document) => decode(BLOCKS, document),
            None => Err(EngineError::not_found("block", id)),
        }
    }

    /// Blocks whose URL resembles `url`, most similar first.
    pub async fn search_by_url(&self, url: &str) -> Result<Vec<Block>, EngineError> {
        let query = SearchQuery::new(site_query(url)).in_fields(["url"]);
        let hits = self.store.search(BLOCKS, &query).await?;
        hits.into_iter()
            .filter(|hit| hit.score >= self.min_score)
            .map(|hit| decode(BLOCKS, hit.document))
            .collect()
    }

    pub async fn list(&self, limit: usize) -> Result<Vec<Block>, EngineError> {
        self.store
            .list(BLOCKS, limit)
            .await?
            .into_iter()
            .map(|document| decode(BLOCKS, document))
            .collect()
    }
}
