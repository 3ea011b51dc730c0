//! Marqo-compatible REST backend.
//!
//! The canonical record travels as a JSON string in the `payload` attribute;
//! every entry of [`Document::fields`] is indexed as a tensor field.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::api::DocumentStore;
use crate::errors::StoreError;
use crate::model::{Document, FieldFilter, SearchHit, SearchQuery};

const PAYLOAD_FIELD: &str = "payload";
/// Hits requested per page when scanning a whole collection.
const SCAN_PAGE: usize = 400;

#[derive(Debug, Clone)]
pub struct MarqoConfig {
    pub url: String,
    pub timeout: Duration,
}

impl Default for MarqoConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8882".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct MarqoDocumentStore {
    client: Client,
    config: MarqoConfig,
}

impl MarqoDocumentStore {
    pub fn new(config: MarqoConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| StoreError::transport(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<response unavailable>".to_string());
        Err(StoreError::Backend { status, body })
    }

    fn encode(document: &Document) -> Value {
        let mut body = Map::new();
        body.insert("_id".to_string(), Value::String(document.id.clone()));
        body.insert(
            PAYLOAD_FIELD.to_string(),
            Value::String(document.payload.to_string()),
        );
        for (name, value) in &document.fields {
            body.insert(name.clone(), Value::String(value.clone()));
        }
        Value::Object(body)
    }

    fn decode(collection: &str, raw: Map<String, Value>) -> Result<Document, StoreError> {
        let id = raw
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::corrupt(collection, "<unknown>", "missing _id"))?
            .to_string();
        let payload = raw
            .get(PAYLOAD_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::corrupt(collection, &id, "missing payload"))?;
        let payload: Value = serde_json::from_str(payload)
            .map_err(|err| StoreError::corrupt(collection, &id, err.to_string()))?;

        let fields: BTreeMap<String, String> = raw
            .iter()
            .filter(|(name, _)| !name.starts_with('_') && name.as_str() != PAYLOAD_FIELD)
            .filter_map(|(name, value)| value.as_str().map(|text| (name.clone(), text.to_string())))
            .collect();

        Ok(Document {
            id,
            fields,
            payload,
        })
    }

    async fn search_page(
        &self,
        collection: &str,
        body: &MarqoSearchRequest,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let response = self
            .client
            .post(self.endpoint(&format!("indexes/{collection}/search")))
            .json(body)
            .send()
            .await
            .map_err(|err| StoreError::transport(err.to_string()))?;
        let parsed: MarqoSearchResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| StoreError::corrupt(collection, "<search>", err.to_string()))?;

        parsed
            .hits
            .into_iter()
            .map(|hit| {
                let score = hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0);
                Self::decode(collection, hit).map(|document| SearchHit { document, score })
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddDocumentsRequest {
    documents: Vec<Value>,
    tensor_fields: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MarqoSearchRequest {
    q: String,
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    searchable_attributes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarqoSearchResponse {
    #[serde(default)]
    hits: Vec<Map<String, Value>>,
}

fn filter_expression(filters: &[FieldFilter]) -> Option<String> {
    if filters.is_empty() {
        return None;
    }
    Some(
        filters
            .iter()
            .map(|filter| format!("{}:({})", filter.field, filter.value))
            .collect::<Vec<_>>()
            .join(" AND "),
    )
}

#[async_trait]
impl DocumentStore for MarqoDocumentStore {
    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.endpoint(&format!("indexes/{collection}")))
            .json(&Value::Object(Map::new()))
            .send()
            .await
            .map_err(|err| StoreError::transport(err.to_string()))?;
        // an existing index answers 409
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        Self::check(response).await.map(|_| ())
    }

    async fn put(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        let body = AddDocumentsRequest {
            tensor_fields: document.fields.keys().cloned().collect(),
            documents: vec![Self::encode(&document)],
        };
        let response = self
            .client
            .post(self.endpoint(&format!("indexes/{collection}/documents")))
            .json(&body)
            .send()
            .await
            .map_err(|err| StoreError::transport(err.to_string()))?;
        Self::check(response).await?;
        debug!(collection, id = %document.id, "indexed document in marqo");
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let response = self
            .client
            .get(self.endpoint(&format!("indexes/{collection}/documents/{id}")))
            .send()
            .await
            .map_err(|err| StoreError::transport(err.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw: Map<String, Value> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| StoreError::corrupt(collection, id, err.to_string()))?;
        Self::decode(collection, raw).map(Some)
    }

    async fn search(
        &self,
        collection: &str,
        query: &SearchQuery,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let body = MarqoSearchRequest {
            q: query.text.clone(),
            limit: query.limit,
            offset: None,
            searchable_attributes: query.fields.clone(),
            filter: filter_expression(&query.filters),
        };
        self.search_page(collection, &body).await
    }

    async fn list(&self, collection: &str, limit: usize) -> Result<Vec<Document>, StoreError> {
        let hits = self
            .search(collection, &SearchQuery::new("*").limit(limit))
            .await?;
        Ok(hits.into_iter().map(|hit| hit.document).collect())
    }

    async fn scan(
        &self,
        collection: &str,
        filters: &[FieldFilter],
    ) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        loop {
            let body = MarqoSearchRequest {
                q: "*".to_string(),
                limit: SCAN_PAGE,
                offset: Some(documents.len()),
                searchable_attributes: None,
                filter: filter_expression(filters),
            };
            let page = self.search_page(collection, &body).await?;
            let fetched = page.len();
            documents.extend(page.into_iter().map(|hit| hit.document));
            if fetched < SCAN_PAGE {
                break;
            }
        }
        debug!(collection, documents = documents.len(), "scanned marqo index");
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn store_for(server: &Server) -> MarqoDocumentStore {
        MarqoDocumentStore::new(MarqoConfig {
            url: server.url(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn put_sends_payload_and_tensor_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/indexes/automation-actions/documents")
            .match_body(Matcher::PartialJson(json!({
                "documents": [{ "_id": "a1", "url": "https://example.com" }],
                "tensorFields": ["url"]
            })))
            .with_status(200)
            .with_body(r#"{"errors": false}"#)
            .create_async()
            .await;

        let store = store_for(&server);
        let doc = Document::new("a1", json!({"name": "x"})).with_field("url", "https://example.com");
        store.put("automation-actions", doc).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_decodes_payload_and_maps_404() {
        let mut server = Server::new_async().await;
        let found = server
            .mock("GET", "/indexes/automation-flows/documents/f1")
            .with_status(200)
            .with_body(r#"{"_id": "f1", "payload": "{\"name\":\"demo\"}", "name": "demo"}"#)
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/indexes/automation-flows/documents/nope")
            .with_status(404)
            .with_body(r#"{"message": "not found"}"#)
            .create_async()
            .await;

        let store = store_for(&server);
        let doc = store.get("automation-flows", "f1").await.unwrap().unwrap();
        assert_eq!(doc.payload, json!({"name": "demo"}));
        assert_eq!(doc.field("name"), Some("demo"));
        assert!(store.get("automation-flows", "nope").await.unwrap().is_none());
        found.assert_async().await;
        missing.assert_async().await;
    }

    #[tokio::test]
    async fn search_passes_filter_and_reads_scores() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/indexes/automation-executions/search")
            .match_body(Matcher::PartialJson(json!({
                "q": "run",
                "filter": "flow_id:(f1)"
            })))
            .with_status(200)
            .with_body(
                r#"{"hits": [{"_id": "e1", "_score": 0.9, "payload": "{}", "flow_id": "f1"}]}"#,
            )
            .create_async()
            .await;

        let store = store_for(&server);
        let hits = store
            .search(
                "automation-executions",
                &SearchQuery::new("run").filter("flow_id", "f1"),
            )
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 0.9).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn scan_pages_until_a_short_page() {
        let mut server = Server::new_async().await;
        let full_page: Vec<_> = (0..SCAN_PAGE)
            .map(|i| json!({"_id": format!("e{i}"), "payload": "{}", "flow_id": "f1"}))
            .collect();
        let first = server
            .mock("POST", "/indexes/automation-executions/search")
            .match_body(Matcher::PartialJson(json!({"offset": 0, "filter": "flow_id:(f1)"})))
            .with_status(200)
            .with_body(json!({ "hits": full_page }).to_string())
            .create_async()
            .await;
        let second = server
            .mock("POST", "/indexes/automation-executions/search")
            .match_body(Matcher::PartialJson(json!({"offset": SCAN_PAGE})))
            .with_status(200)
            .with_body(r#"{"hits": [{"_id": "last", "payload": "{}", "flow_id": "f1"}]}"#)
            .create_async()
            .await;

        let documents = store_for(&server)
            .scan("automation-executions", &[FieldFilter::new("flow_id", "f1")])
            .await
            .unwrap();
        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(documents.len(), SCAN_PAGE + 1);
        assert_eq!(documents.last().unwrap().id, "last");
    }

    #[tokio::test]
    async fn existing_index_is_not_an_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/indexes/automation-blocks")
            .with_status(409)
            .create_async()
            .await;
        store_for(&server)
            .ensure_collection("automation-blocks")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn backend_errors_carry_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/indexes/automation-blocks/search")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        let err = store_for(&server)
            .search("automation-blocks", &SearchQuery::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend { status: 500, .. }));
    }
}
