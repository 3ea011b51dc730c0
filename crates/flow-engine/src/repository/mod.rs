//! Typed repositories over the document store.
//!
//! Each record is stored as a [`Document`] whose payload is the serialized
//! record and whose fields carry the attributes used for search and filtering.

mod actions;
mod blocks;
mod flows;

pub use actions::ActionRepository;
pub use blocks::BlockRepository;
pub use flows::FlowRepository;

use flowsmith_doc_store::{Document, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use task_runner::normalize_url;

use crate::errors::EngineError;

/// Similarity hits scoring below this are not treated as candidates.
pub const DEFAULT_MIN_SCORE: f64 = 0.5;

fn encode<T: Serialize>(id: &str, record: &T) -> Result<Document, EngineError> {
    let payload = serde_json::to_value(record)
        .map_err(|err| StoreError::corrupt("<encode>", id, err.to_string()))?;
    Ok(Document::new(id, payload))
}

fn decode<T: DeserializeOwned>(collection: &str, document: Document) -> Result<T, EngineError> {
    let Document { id, payload, .. } = document;
    serde_json::from_value(payload)
        .map_err(|err| StoreError::corrupt(collection, id, err.to_string()).into())
}

/// Text used to match records by site: the host without `www.`, else the raw URL.
pub(crate) fn site_query(raw: &str) -> String {
    let normalized = normalize_url(raw);
    url::Url::parse(&normalized)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .map(|host| host.trim_start_matches("www.").to_string())
        .unwrap_or_else(|| raw.trim().to_string())
}
