use async_trait::async_trait;

use crate::{Document, DocumentResult, NewDocument};

/// Operations on a hosted document database, one collection at a time.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document with a store-assigned id.
    async fn create(&self, collection: &str, doc: NewDocument) -> DocumentResult<Document>;

    /// Every document of the collection.
    async fn list(&self, collection: &str) -> DocumentResult<Vec<Document>>;

    async fn get(&self, collection: &str, id: &str) -> DocumentResult<Document>;

    async fn delete(&self, collection: &str, id: &str) -> DocumentResult<()>;
}
