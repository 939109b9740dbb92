use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::document::validate_segment;
use crate::{Document, DocumentError, DocumentResult, DocumentStore, NewDocument};

/// In-memory document store.
///
/// Documents keep insertion order within a collection. Server timestamps are
/// filled with the current time as an RFC 3339 string, the same shape the
/// Firestore adapter returns.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    create_calls: AtomicUsize,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_writes: AtomicBool,
    fail_lists: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Seed a document as-is, bypassing validation and counters.
    pub async fn insert_raw(&self, collection: &str, doc: Document) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, collection: &str, doc: NewDocument) -> DocumentResult<Document> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        validate_segment("collection", collection)?;

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DocumentError::unavailable("writes disabled"));
        }

        let now = Utc::now();
        let mut fields = doc.fields;
        for field in doc.server_timestamps {
            fields.insert(field, Value::String(now.to_rfc3339()));
        }

        let document = Document {
            id: uuid::Uuid::new_v4().simple().to_string(),
            fields,
            create_time: Some(now),
        };

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());

        Ok(document)
    }

    async fn list(&self, collection: &str) -> DocumentResult<Vec<Document>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        validate_segment("collection", collection)?;

        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(DocumentError::unavailable("lists disabled"));
        }

        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> DocumentResult<Document> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        validate_segment("collection", collection)?;
        validate_segment("id", id)?;

        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned())
            .ok_or_else(|| DocumentError::not_found(collection, id))
    }

    async fn delete(&self, collection: &str, id: &str) -> DocumentResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        validate_segment("collection", collection)?;
        validate_segment("id", id)?;

        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(DocumentError::unavailable("deletes disabled"));
        }

        // Firestore deletes are idempotent; missing ids succeed.
        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.retain(|d| d.id != id);
        }
        Ok(())
    }
}
