use std::cmp::Ordering as CmpOrdering;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::DocumentStore;
use crate::errors::StoreError;
use crate::model::{Document, FieldFilter, SearchHit, SearchQuery};
use crate::similarity::{overlap_score, tokenize};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredDocument {
    collection: String,
    seq: u64,
    document: Document,
}

/// Process-local store with keyword-overlap similarity and optional JSON snapshots.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: DashMap<String, DashMap<String, StoredDocument>>,
    sequence: AtomicU64,
    storage_path: Option<PathBuf>,
    persist_lock: Mutex<()>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store that snapshots every write to `path`, loading an existing snapshot first.
    pub fn with_persistence(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let store = Self {
            storage_path: Some(path.clone()),
            ..Self::default()
        };

        if path.exists() {
            let bytes = fs::read(&path).map_err(|err| StoreError::Persistence(err.to_string()))?;
            if !bytes.is_empty() {
                let records: Vec<StoredDocument> = serde_json::from_slice(&bytes)
                    .map_err(|err| StoreError::Persistence(format!("{err}")))?;
                let mut max_seq = 0;
                for record in records {
                    max_seq = max_seq.max(record.seq);
                    store
                        .collections
                        .entry(record.collection.clone())
                        .or_default()
                        .insert(record.document.id.clone(), record);
                }
                store.sequence.store(max_seq + 1, Ordering::SeqCst);
            }
            debug!(path = %path.display(), "loaded document store snapshot");
        }

        Ok(store)
    }

    /// Number of documents in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    fn sorted_entries(&self, collection: &str) -> Vec<StoredDocument> {
        let mut entries: Vec<StoredDocument> = self
            .collections
            .get(collection)
            .map(|docs| docs.iter().map(|entry| entry.value().clone()).collect())
            .unwrap_or_default();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.storage_path else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock().await;
        let mut records: Vec<StoredDocument> = self
            .collections
            .iter()
            .flat_map(|collection| {
                collection
                    .value()
                    .iter()
                    .map(|entry| entry.value().clone())
                    .collect::<Vec<_>>()
            })
            .collect();
        records.sort_by_key(|record| record.seq);

        let bytes = serde_json::to_vec_pretty(&records)
            .map_err(|err| StoreError::Persistence(err.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|err| StoreError::Persistence(err.to_string()))?;
            }
        }
        tokio::fs::write(path, bytes)
            .await
            .map_err(|err| StoreError::Persistence(err.to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        self.collections.entry(collection.to_string()).or_default();
        Ok(())
    }

    async fn put(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        let seq = {
            let docs = self.collections.entry(collection.to_string()).or_default();
            // replacing keeps the original insertion position
            let seq = docs
                .get(&document.id)
                .map(|existing| existing.seq)
                .unwrap_or_else(|| self.sequence.fetch_add(1, Ordering::SeqCst));
            docs.insert(
                document.id.clone(),
                StoredDocument {
                    collection: collection.to_string(),
                    seq,
                    document,
                },
            );
            seq
        };
        debug!(collection, seq, "stored document");

        if let Err(err) = self.persist().await {
            warn!(error = %err, "document store persist failed after put");
            return Err(err);
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).map(|entry| entry.document.clone())))
    }

    async fn search(
        &self,
        collection: &str,
        query: &SearchQuery,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let query_tokens = tokenize(&query.text);
        let mut ranked: Vec<(u64, SearchHit)> = self
            .sorted_entries(collection)
            .into_iter()
            .filter(|entry| matches_filters(&entry.document, &query.filters))
            .filter_map(|entry| {
                let haystack = match &query.fields {
                    Some(fields) => fields
                        .iter()
                        .filter_map(|field| entry.document.field(field))
                        .collect::<Vec<_>>()
                        .join(" "),
                    None => entry
                        .document
                        .fields
                        .values()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(" "),
                };
                let score = overlap_score(&query_tokens, &tokenize(&haystack));
                (score > 0.0).then(|| {
                    (
                        entry.seq,
                        SearchHit {
                            document: entry.document,
                            score,
                        },
                    )
                })
            })
            .collect();

        ranked.sort_by(|(left_seq, left), (right_seq, right)| {
            right
                .score
                .partial_cmp(&left.score)
                .unwrap_or(CmpOrdering::Equal)
                .then(left_seq.cmp(right_seq))
        });

        Ok(ranked
            .into_iter()
            .take(query.limit)
            .map(|(_, hit)| hit)
            .collect())
    }

    async fn list(&self, collection: &str, limit: usize) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .sorted_entries(collection)
            .into_iter()
            .take(limit)
            .map(|entry| entry.document)
            .collect())
    }

    async fn scan(
        &self,
        collection: &str,
        filters: &[FieldFilter],
    ) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .sorted_entries(collection)
            .into_iter()
            .filter(|entry| matches_filters(&entry.document, filters))
            .map(|entry| entry.document)
            .collect())
    }
}

fn matches_filters(document: &Document, filters: &[FieldFilter]) -> bool {
    filters
        .iter()
        .all(|filter| document.field(&filter.field) == Some(filter.value.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn action_doc(id: &str, url: &str, name: &str) -> Document {
        Document::new(id, json!({ "id": id, "name": name }))
            .with_field("url", url)
            .with_field("name", name)
    }

    #[tokio::test]
    async fn put_replaces_and_keeps_position() {
        let store = MemoryDocumentStore::new();
        store.put("c", action_doc("a", "a.com", "first")).await.unwrap();
        store.put("c", action_doc("b", "b.com", "second")).await.unwrap();
        store
            .put("c", action_doc("a", "a.com", "first again"))
            .await
            .unwrap();

        let listed = store.list("c", 10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "a");
        assert_eq!(listed[0].field("name"), Some("first again"));
    }

    #[tokio::test]
    async fn search_ranks_by_overlap_then_insertion() {
        let store = MemoryDocumentStore::new();
        store
            .put("c", action_doc("1", "https://shop.example.com", "browse catalog"))
            .await
            .unwrap();
        store
            .put("c", action_doc("2", "https://shop.example.com", "search catalog items"))
            .await
            .unwrap();
        store
            .put("c", action_doc("3", "https://other.org", "unrelated"))
            .await
            .unwrap();

        let hits = store
            .search("c", &SearchQuery::new("search catalog").in_fields(["name"]))
            .await
            .unwrap();
        let ids: Vec<_> = hits.iter().map(|hit| hit.document.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn filters_require_exact_field_match() {
        let store = MemoryDocumentStore::new();
        let doc = Document::new("e1", json!({}))
            .with_field("flow_id", "f1")
            .with_field("status", "failed");
        store.put("executions", doc).await.unwrap();

        let hits = store
            .search(
                "executions",
                &SearchQuery::new("failed").filter("flow_id", "f2"),
            )
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn scan_is_filtered_and_uncapped() {
        let store = MemoryDocumentStore::new();
        for i in 0..1500 {
            let flow = if i % 3 == 0 { "f1" } else { "f2" };
            let doc = Document::new(format!("e{i}"), json!({})).with_field("flow_id", flow);
            store.put("executions", doc).await.unwrap();
        }

        let matched = store
            .scan("executions", &[FieldFilter::new("flow_id", "f1")])
            .await
            .unwrap();
        assert_eq!(matched.len(), 500);
        assert_eq!(matched[0].id, "e0");
        assert_eq!(matched.last().unwrap().id, "e1497");
        assert_eq!(store.scan("executions", &[]).await.unwrap().len(), 1500);
    }

    #[tokio::test]
    async fn missing_collection_and_id_return_none() {
        let store = MemoryDocumentStore::new();
        assert!(store.get("nowhere", "x").await.unwrap().is_none());
        store.ensure_collection("c").await.unwrap();
        assert!(store.get("c", "x").await.unwrap().is_none());
        assert_eq!(store.len("c"), 0);
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        {
            let store = MemoryDocumentStore::with_persistence(&path).unwrap();
            store.put("c", action_doc("a", "a.com", "alpha")).await.unwrap();
            store.put("c", action_doc("b", "b.com", "beta")).await.unwrap();
        }

        let reopened = MemoryDocumentStore::with_persistence(&path).unwrap();
        let listed = reopened.list("c", 10).await.unwrap();
        assert_eq!(
            listed.iter().map(|doc| doc.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        reopened.put("c", action_doc("c", "c.com", "gamma")).await.unwrap();
        assert_eq!(reopened.list("c", 10).await.unwrap()[2].id, "c");
    }
}
