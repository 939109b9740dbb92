use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::MediaResult;

/// A file to upload, fully buffered
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl MediaUpload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// What the store hands back after a successful upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub secure_url: String,
    #[serde(default)]
    pub public_id: Option<String>,
}

/// Hosted media store operations
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload a file. Succeeds only when the store returned a durable URL.
    async fn upload(&self, upload: MediaUpload) -> MediaResult<UploadReceipt>;

    /// Delete a stored object by public id, returning the store's raw result.
    async fn destroy(&self, public_id: &str) -> MediaResult<Value>;
}
