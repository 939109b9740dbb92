use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use share_docs::Document;
use thiserror::Error;

use crate::file_kind::{classify_file_kind, FileKind};

/// A stored submission: who sent it, their note, and where the file lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub name: String,
    pub message: String,
    pub file_url: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Why a stored document is not a usable submission.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("field '{0}' is missing or not a string")]
    MissingField(&'static str),

    #[error("field 'fileUrl' is empty")]
    EmptyFileUrl,

    #[error("field 'fileUrl' is not an http(s) or memory URL: {0}")]
    UnsafeFileUrl(String),

    #[error("field 'createdAt' is not a timestamp: {0}")]
    BadTimestamp(String),
}

fn string_field(doc: &Document, field: &'static str) -> Result<String, RecordError> {
    doc.get_str(field)
        .map(str::to_string)
        .ok_or(RecordError::MissingField(field))
}

/// Only URLs the pages may put in `src`/`href` are accepted.
const FILE_URL_SCHEMES: [&str; 3] = ["http", "https", "memory"];

fn check_file_url(raw: &str) -> Result<(), RecordError> {
    if raw.trim().is_empty() {
        return Err(RecordError::EmptyFileUrl);
    }
    match Url::parse(raw) {
        Ok(url) if FILE_URL_SCHEMES.contains(&url.scheme()) => Ok(()),
        _ => Err(RecordError::UnsafeFileUrl(raw.to_string())),
    }
}

fn parse_created_at(value: Option<&Value>) -> Result<Option<DateTime<Utc>>, RecordError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| RecordError::BadTimestamp(s.clone())),
        Some(other) => Err(RecordError::BadTimestamp(other.to_string())),
    }
}

impl TryFrom<Document> for Submission {
    type Error = RecordError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        let name = string_field(&doc, "name")?;
        let message = string_field(&doc, "message")?;
        let file_url = string_field(&doc, "fileUrl")?;
        check_file_url(&file_url)?;
        let created_at = parse_created_at(doc.fields.get("createdAt"))?;

        Ok(Self {
            id: doc.id,
            name,
            message,
            file_url,
            created_at,
        })
    }
}

impl Submission {
    pub fn file_kind(&self) -> FileKind {
        classify_file_kind(&self.file_url)
    }

    /// Calendar date of `createdAt`, as the dashboard prints it.
    pub fn display_date(&self) -> Option<String> {
        self.created_at.map(|t| t.format("%Y-%m-%d").to_string())
    }
}

/// Map stored documents to submissions, skipping (and logging) any that fail
/// validation.
pub fn valid_submissions(collection: &str, docs: Vec<Document>) -> Vec<Submission> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match Submission::try_from(doc) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!(collection, id = %id, error = %e, "skipping malformed record");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(fields: Value) -> Document {
        Document::new("abc", fields.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn well_formed_document_maps_to_camel_case_record() {
        let s = Submission::try_from(doc(json!({
            "name": "Ada",
            "message": "hello",
            "fileUrl": "https://cdn.example.com/a.png",
            "createdAt": "2024-05-01T10:00:00.123Z"
        })))
        .unwrap();

        assert_eq!(s.id, "abc");
        assert_eq!(s.file_kind(), FileKind::Image);
        assert_eq!(s.display_date().as_deref(), Some("2024-05-01"));

        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["fileUrl"], "https://cdn.example.com/a.png");
        assert!(v["createdAt"].is_string());
    }

    #[test]
    fn missing_timestamp_is_allowed() {
        let s = Submission::try_from(doc(json!({
            "name": "Ada", "message": "m", "fileUrl": "https://cdn.example.com/u.zip"
        })))
        .unwrap();
        assert_eq!(s.created_at, None);
        assert_eq!(s.display_date(), None);
    }

    #[test]
    fn malformed_documents_fail_closed() {
        assert_eq!(
            Submission::try_from(doc(json!({"message": "m", "fileUrl": "https://cdn.example.com/u"}))).unwrap_err(),
            RecordError::MissingField("name")
        );
        assert_eq!(
            Submission::try_from(doc(json!({"name": "n", "message": "m", "fileUrl": "  "}))).unwrap_err(),
            RecordError::EmptyFileUrl
        );
        assert!(matches!(
            Submission::try_from(doc(json!({
                "name": "n", "message": "m", "fileUrl": "https://cdn.example.com/u", "createdAt": 12
            }))),
            Err(RecordError::BadTimestamp(_))
        ));
        for url in ["javascript:alert(1)", "JavaScript:alert(1)", "data:text/html,<b>x</b>", "u.png", "//cdn/x.png"] {
            assert_eq!(
                Submission::try_from(doc(json!({"name": "n", "message": "m", "fileUrl": url}))).unwrap_err(),
                RecordError::UnsafeFileUrl(url.to_string()),
                "{url}"
            );
        }
    }

    #[test]
    fn http_https_and_memory_file_urls_are_accepted() {
        for url in ["http://cdn.example.com/a.png", "HTTPS://cdn.example.com/a.png", "memory://media/1/a.png"] {
            let s = Submission::try_from(doc(json!({"name": "n", "message": "m", "fileUrl": url}))).unwrap();
            assert_eq!(s.file_url, url);
        }
    }

    #[test]
    fn listing_skips_bad_records() {
        let good = doc(json!({"name": "n", "message": "m", "fileUrl": "https://cdn.example.com/u.png"}));
        let mut bad = doc(json!({"name": 3}));
        bad.id = "bad".into();

        let out = valid_submissions("data", vec![bad, good]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "abc");
    }
}
