use std::sync::Arc;

use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use share_core::ShareError;
use share_docs::{DocumentError, DocumentStore, NewDocument};
use share_media::{MediaError, MediaStore, MediaUpload};
use thiserror::Error;

use crate::record::Submission;

/// A file picked by the visitor.
#[derive(Debug, Clone, PartialEq)]
pub struct FileInput {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FileInput {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// What the visitor filled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionInput {
    pub name: String,
    pub message: String,
    pub file: Option<FileInput>,
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("All fields are required.")]
    MissingFields { fields: Vec<&'static str> },

    #[error("The attached file could not be read.")]
    InvalidFile,

    #[error("File upload failed.")]
    Upload(#[source] MediaError),

    #[error("Submission failed.")]
    Persist(#[source] DocumentError),
}

impl From<SubmissionError> for ShareError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::MissingFields { ref fields } => {
                let errors: Map<String, Value> = fields
                    .iter()
                    .map(|f| (f.to_string(), json!(["required"])))
                    .collect();
                ShareError::bad_request(err.to_string()).with_errors(Value::Object(errors))
            }
            SubmissionError::InvalidFile => ShareError::bad_request(err.to_string())
                .with_errors(json!({"file": ["data must be base64"]})),
            SubmissionError::Upload(source) => ShareError::bad_gateway("File upload failed.").with_source(source),
            SubmissionError::Persist(source) => ShareError::bad_gateway("Submission failed.").with_source(source),
        }
    }
}

impl SubmissionInput {
    pub fn new(name: impl Into<String>, message: impl Into<String>, file: Option<FileInput>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            file,
        }
    }

    /// Read the JSON produced by the multipart layer (or sent directly):
    /// `{"name", "message", "file": {"filename", "contentType", "data"}}`
    /// with base64 `data`. Absent fields read as empty.
    pub fn from_json(value: &Value) -> Result<Self, SubmissionError> {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let file = match value.get("file") {
            None | Some(Value::Null) => None,
            Some(Value::Object(f)) => {
                let data = f.get("data").and_then(Value::as_str).unwrap_or_default();
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(data)
                    .map_err(|_| SubmissionError::InvalidFile)?;
                Some(FileInput {
                    filename: f
                        .get("filename")
                        .and_then(Value::as_str)
                        .unwrap_or("upload")
                        .to_string(),
                    content_type: f.get("contentType").and_then(Value::as_str).map(str::to_string),
                    bytes: Bytes::from(bytes),
                })
            }
            Some(_) => return Err(SubmissionError::InvalidFile),
        };

        Ok(Self {
            name: text("name"),
            message: text("message"),
            file,
        })
    }

    /// Fields that count as empty: blank text, no file, or a zero-byte file.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.message.trim().is_empty() {
            missing.push("message");
        }
        if self.file.as_ref().map_or(true, |f| f.bytes.is_empty()) {
            missing.push("file");
        }
        missing
    }

    pub fn validate(&self) -> Result<(), SubmissionError> {
        let fields = self.missing_fields();
        if fields.is_empty() {
            Ok(())
        } else {
            Err(SubmissionError::MissingFields { fields })
        }
    }
}

/// Upload the file, then store the record pointing at it.
pub struct SubmissionWorkflow {
    media: Arc<dyn MediaStore>,
    documents: Arc<dyn DocumentStore>,
    collection: String,
}

impl SubmissionWorkflow {
    pub fn new(media: Arc<dyn MediaStore>, documents: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            media,
            documents,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Validation runs before any network call. A failed write leaves the
    /// uploaded file in place.
    pub async fn submit(&self, input: SubmissionInput) -> Result<Submission, SubmissionError> {
        input.validate()?;
        let SubmissionInput { name, message, file } = input;
        let Some(file) = file else {
            return Err(SubmissionError::MissingFields { fields: vec!["file"] });
        };

        let mut upload = MediaUpload::new(file.filename, file.bytes);
        if let Some(ct) = file.content_type {
            upload = upload.content_type(ct);
        }

        let receipt = self.media.upload(upload).await.map_err(|e| {
            tracing::error!(error = %e, "file upload failed");
            SubmissionError::Upload(e)
        })?;

        let doc = NewDocument::default()
            .field("name", name.clone())
            .field("message", message.clone())
            .field("fileUrl", receipt.secure_url.clone())
            .server_timestamp("createdAt");

        let stored = self.documents.create(&self.collection, doc).await.map_err(|e| {
            tracing::error!(error = %e, collection = %self.collection, "saving submission failed");
            SubmissionError::Persist(e)
        })?;

        let created_at = stored
            .get_str("createdAt")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .or(stored.create_time);

        tracing::info!(id = %stored.id, file_url = %receipt.secure_url, "submission stored");
        Ok(Submission {
            id: stored.id,
            name,
            message,
            file_url: receipt.secure_url,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use share_docs::MemoryDocumentStore;
    use share_media::MemoryMediaStore;

    fn workflow() -> (Arc<MemoryMediaStore>, Arc<MemoryDocumentStore>, SubmissionWorkflow) {
        let media = Arc::new(MemoryMediaStore::new());
        let docs = Arc::new(MemoryDocumentStore::new());
        let wf = SubmissionWorkflow::new(media.clone(), docs.clone(), "data");
        (media, docs, wf)
    }

    fn complete() -> SubmissionInput {
        SubmissionInput::new("Ada", "hello", Some(FileInput::new("cat.png", vec![1u8, 2, 3])))
    }

    #[tokio::test]
    async fn any_empty_field_short_circuits_without_network_calls() {
        let cases = [
            SubmissionInput::new("  ", "hello", Some(FileInput::new("a.png", vec![1u8]))),
            SubmissionInput::new("Ada", "", Some(FileInput::new("a.png", vec![1u8]))),
            SubmissionInput::new("Ada", "hello", None),
            SubmissionInput::new("Ada", "hello", Some(FileInput::new("a.png", Vec::<u8>::new()))),
        ];

        for input in cases {
            let (media, docs, wf) = workflow();
            let err = wf.submit(input).await.unwrap_err();
            assert_eq!(err.to_string(), "All fields are required.");
            assert_eq!(media.upload_calls(), 0);
            assert_eq!(docs.create_calls(), 0);
        }
    }

    #[tokio::test]
    async fn stores_record_pointing_at_uploaded_file() {
        let (media, docs, wf) = workflow();
        let s = wf.submit(complete()).await.unwrap();

        assert!(s.file_url.starts_with("memory://media/"));
        assert!(s.file_url.ends_with("/cat.png"));
        assert!(s.created_at.is_some());
        assert_eq!(media.upload_calls(), 1);

        let stored = docs.get("data", &s.id).await.unwrap();
        assert_eq!(stored.get_str("name"), Some("Ada"));
        assert_eq!(stored.get_str("fileUrl"), Some(s.file_url.as_str()));
    }

    #[tokio::test]
    async fn upload_failure_writes_nothing() {
        let (media, docs, wf) = workflow();
        media.fail_uploads(true);

        let err = wf.submit(complete()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Upload(_)));
        assert_eq!(err.to_string(), "File upload failed.");
        assert_eq!(docs.create_calls(), 0);
    }

    #[tokio::test]
    async fn upload_without_url_writes_nothing() {
        let (media, docs, wf) = workflow();
        media.omit_urls(true);

        let err = wf.submit(complete()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Upload(MediaError::MissingUrl)));
        assert_eq!(err.to_string(), "File upload failed.");
        assert_eq!(media.upload_calls(), 1);
        assert_eq!(docs.create_calls(), 0);
        assert_eq!(docs.len("data").await, 0);
    }

    #[tokio::test]
    async fn write_failure_keeps_uploaded_file() {
        let (media, docs, wf) = workflow();
        docs.fail_writes(true);

        let err = wf.submit(complete()).await.unwrap_err();
        assert_eq!(err.to_string(), "Submission failed.");
        assert_eq!(media.len().await, 1);
        assert_eq!(media.destroy_calls(), 0);
    }

    #[test]
    fn reads_multipart_json() {
        let input = SubmissionInput::from_json(&json!({
            "name": "Ada",
            "message": "hi",
            "file": {"filename": "a.zip", "contentType": "application/zip", "size": 3, "data": "AQID"}
        }))
        .unwrap();

        let file = input.file.unwrap();
        assert_eq!(file.filename, "a.zip");
        assert_eq!(file.content_type.as_deref(), Some("application/zip"));
        assert_eq!(&file.bytes[..], &[1u8, 2, 3][..]);

        assert!(matches!(
            SubmissionInput::from_json(&json!({"file": {"data": "%%%"}})),
            Err(SubmissionError::InvalidFile)
        ));
        assert_eq!(
            SubmissionInput::from_json(&json!({})).unwrap().missing_fields(),
            vec!["name", "message", "file"]
        );
    }

    #[test]
    fn missing_fields_map_to_bad_request() {
        let err: ShareError = SubmissionError::MissingFields { fields: vec!["name", "file"] }.into();
        assert_eq!(err.code(), 400);
        assert_eq!(err.message, "All fields are required.");
        assert_eq!(err.errors, Some(json!({"name": ["required"], "file": ["required"]})));
    }
}
