use async_trait::async_trait;

use crate::errors::StoreError;
use crate::model::{Document, FieldFilter, SearchHit, SearchQuery};

/// Indexed collections supporting add/get/search.
///
/// Implementations must tolerate concurrent readers and writers; no
/// transactional isolation is expected.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates the collection if it does not exist yet.
    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError>;

    /// Inserts the document, replacing any document with the same id.
    async fn put(&self, collection: &str, document: Document) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Ranked similarity search, most relevant first.
    async fn search(
        &self,
        collection: &str,
        query: &SearchQuery,
    ) -> Result<Vec<SearchHit>, StoreError>;

    /// Documents in insertion order.
    async fn list(&self, collection: &str, limit: usize) -> Result<Vec<Document>, StoreError>;

    /// Every document whose fields match all `filters`, without a result cap.
    async fn scan(
        &self,
        collection: &str,
        filters: &[FieldFilter],
    ) -> Result<Vec<Document>, StoreError>;
}
