use std::sync::Arc;

use chrono::Utc;
use flowsmith_core_types::{Action, ActionId, BlockId, NewAction};
use flowsmith_doc_store::{DocumentStore, FieldFilter, SearchQuery, ACTIONS};
use tracing::debug;

use super::{decode, encode, site_query, DEFAULT_MIN_SCORE};
use crate::errors::EngineError;

const TEXT_FIELDS: [&str; 3] = ["name", "navigation_goal", "data_extraction_goal"];

/// Action records plus similarity lookups.
///
/// Results of the search operations are candidates: nothing prevents two
/// near-identical actions from being stored.
#[derive(Clone)]
pub struct ActionRepository {
    store: Arc<dyn DocumentStore>,
    min_score: f64,
}

impl ActionRepository {
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

    /// Stores the action under a fresh id with both timestamps set to now.
    pub async fn store(&self, action: NewAction) -> Result<Action, EngineError> {
        let action = Action::from_new(ActionId::new(), action, Utc::now());
        let document = encode(action.id.as_str(), &action)?
            .with_field("block_id", action.block_id.as_str())
            .with_field("name", action.name.clone())
            .with_field("navigation_goal", action.navigation_goal.clone())
            .with_field("data_extraction_goal", action.data_extraction_goal.clone())
            .with_field("url", action.url.clone());
        self.store.put(ACTIONS, document).await?;
        debug!(action_id = %action.id, block_id = %action.block_id, name = %action.name, "stored action");
        Ok(action)
    }

    pub async fn get(&self, id: &ActionId) -> Result<Action, EngineError> {
        match self.store.get(ACTIONS, id.as_str()).await? {
            Some(document) => decode(ACTIONS, document),
            None => Err(EngineError::not_found("action", id)),
        }
    }

    /// Actions bound to a URL similar to `url`.
    pub async fn search_by_url(&self, url: &str) -> Result<Vec<Action>, EngineError> {
        self.ranked(SearchQuery::new(site_query(url)).in_fields(["url"]))
            .await
    }

    /// Actions ranked by relevance to `text`, most relevant first.
    pub async fn search(&self, text: &str) -> Result<Vec<Action>, EngineError> {
        self.ranked(SearchQuery::new(text).in_fields(TEXT_FIELDS))
            .await
    }

    pub async fn list(&self, limit: usize) -> Result<Vec<Action>, EngineError> {
        self.store
            .list(ACTIONS, limit)
            .await?
            .into_iter()
            .map(|document| decode(ACTIONS, document))
            .collect()
    }

    pub async fn list_by_block(&self, block_id: &BlockId) -> Result<Vec<Action>, EngineError> {
        self.store
            .scan(ACTIONS, &[FieldFilter::new("block_id", block_id.as_str())])
            .await?
            .into_iter()
            .map(|document| decode(ACTIONS, document))
            .collect()
    }

    async fn ranked(&self, query: SearchQuery) -> Result<Vec<Action>, EngineError> {
        let hits = self.store.search(ACTIONS, &query).await?;
        hits.into_iter()
            .filter(|hit| hit.score >= self.min_score)
            .map(|hit| decode(ACTIONS, hit.document))
            .collect()
    }
}
