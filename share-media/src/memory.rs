use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::{MediaError, MediaResult, MediaStore, MediaUpload, UploadReceipt};

/// In-memory media store.
///
/// URLs look like `memory://media/{public_id}/{filename}` so the filename's
/// extension survives for classification. Call counters and failure
/// switches let tests observe traffic and simulate outages.
#[derive(Default)]
pub struct MemoryMediaStore {
    objects: RwLock<HashMap<String, MediaUpload>>,
    upload_calls: AtomicUsize,
    destroy_calls: AtomicUsize,
    fail_uploads: AtomicBool,
    fail_destroys: AtomicBool,
    omit_urls: AtomicBool,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_destroys(&self, fail: bool) {
        self.fail_destroys.store(fail, Ordering::SeqCst);
    }

    /// Accept uploads but answer without a usable URL, the way a media host
    /// does when its response lacks `secure_url`.
    pub fn omit_urls(&self, omit: bool) {
        self.omit_urls.store(omit, Ordering::SeqCst);
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn destroy_calls(&self) -> usize {
        self.destroy_calls.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn contains(&self, public_id: &str) -> bool {
        self.objects.read().await.contains_key(public_id)
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn upload(&self, upload: MediaUpload) -> MediaResult<UploadReceipt> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MediaError::unavailable("uploads disabled"));
        }
        if upload.is_empty() {
            return Err(MediaError::invalid("file is empty"));
        }

        if self.omit_urls.load(Ordering::SeqCst) {
            return Err(MediaError::MissingUrl);
        }

        let public_id = uuid::Uuid::new_v4().simple().to_string();
        let secure_url = format!("memory://media/{public_id}/{}", upload.filename);

        self.objects.write().await.insert(public_id.clone(), upload);

        Ok(UploadReceipt {
            secure_url,
            public_id: Some(public_id),
        })
    }

    async fn destroy(&self, public_id: &str) -> MediaResult<Value> {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_destroys.load(Ordering::SeqCst) {
            return Err(MediaError::unavailable("destroy disabled"));
        }

        let removed = self.objects.write().await.remove(public_id).is_some();
        Ok(json!({ "result": if removed { "ok" } else { "not found" } }))
    }
}
