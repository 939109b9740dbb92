use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, IntoUrl, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::{json, Value};

use crate::document::validate_segment;
use crate::value::{decode_fields, encode_fields};
use crate::{Document, DocumentError, DocumentResult, DocumentStore, NewDocument};

/// Connection settings for the Firestore REST API.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub base_url: String,
    pub project_id: String,
    pub database: String,
    /// Sent as the `key` query parameter.
    pub api_key: Option<String>,
    /// Sent as a bearer token.
    pub access_token: Option<String>,
    pub page_size: u32,
    pub timeout: Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: "https://firestore.googleapis.com".to_string(),
            project_id: project_id.into(),
            database: "(default)".to_string(),
            api_key: None,
            access_token: None,
            page_size: 300,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/{}/documents", self.project_id, self.database)
    }
}

/// Firestore REST adapter.
pub struct FirestoreStore {
    client: Client,
    config: FirestoreConfig,
}

fn parse_time(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Map a REST `Document` resource into a [`Document`].
fn from_resource(resource: &Value) -> DocumentResult<Document> {
    let name = resource
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| DocumentError::decode("document resource has no name"))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();

    let fields = match resource.get("fields") {
        Some(fields) => decode_fields(fields)?,
        None => Default::default(),
    };

    Ok(Document {
        id,
        fields,
        create_time: parse_time(resource.get("createTime")),
    })
}

async fn rejected(response: Response) -> DocumentError {
    let status = response.status().as_u16();
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| "no error message".to_string());
    DocumentError::rejected(status, message)
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig) -> DocumentResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn with_client(client: Client, config: FirestoreConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/v1/{}{}", self.config.base_url, self.config.database_path(), suffix)
    }

    /// `.../documents/{segments...}`, each segment percent-encoded so ids
    /// holding `?`, `#` or `%` address exactly that document.
    fn document_url(&self, segments: &[&str]) -> DocumentResult<Url> {
        let mut url = Url::parse(&self.url(""))
            .map_err(|e| DocumentError::invalid(format!("bad document store URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| DocumentError::invalid("document store URL cannot carry a path"))?
            .extend(segments);
        Ok(url)
    }

    fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        let mut req = self.client.request(method, url);
        if let Some(key) = &self.config.api_key {
            req = req.query(&[("key", key)]);
        }
        if let Some(token) = &self.config.access_token {
            req = req.bearer_auth(token);
        }
        req
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn create(&self, collection: &str, doc: NewDocument) -> DocumentResult<Document> {
        validate_segment("collection", collection)?;

        let id = uuid::Uuid::new_v4().simple().to_string();
        let name = format!("{}/{collection}/{id}", self.config.database_path());

        let transforms: Vec<Value> = doc
            .server_timestamps
            .iter()
            .map(|field| json!({ "fieldPath": field, "setToServerValue": "REQUEST_TIME" }))
            .collect();

        let body = json!({
            "writes": [{
                "update": { "name": name, "fields": encode_fields(&doc.fields) },
                "updateTransforms": transforms,
                "currentDocument": { "exists": false },
            }]
        });

        let response = self
            .request(Method::POST, self.url(":commit"))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let committed: Value = response.json().await?;
        let commit_time = committed.get("commitTime").and_then(Value::as_str).map(str::to_string);
        let transform_results = committed
            .pointer("/writeResults/0/transformResults")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut fields = doc.fields;
        for (i, field) in doc.server_timestamps.iter().enumerate() {
            let ts = transform_results
                .get(i)
                .and_then(|r| r.get("timestampValue"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| commit_time.clone());
            if let Some(ts) = ts {
                fields.insert(field.clone(), Value::String(ts));
            }
        }

        tracing::debug!(collection, id = %id, "document created");
        Ok(Document {
            id,
            fields,
            create_time: parse_time(committed.get("commitTime")),
        })
    }

    async fn list(&self, collection: &str) -> DocumentResult<Vec<Document>> {
        validate_segment("collection", collection)?;

        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = self
                .request(Method::GET, self.document_url(&[collection])?)
                .query(&[("pageSize", self.config.page_size.to_string())]);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token)]);
            }

            let response = req.send().await?;
            if !response.status().is_success() {
                return Err(rejected(response).await);
            }

            let page: Value = response.json().await?;
            if let Some(items) = page.get("documents").and_then(Value::as_array) {
                for item in items {
                    // One undecodable document must not hide the rest.
                    match from_resource(item) {
                        Ok(doc) => documents.push(doc),
                        Err(e) => {
                            let name = item.get("name").and_then(Value::as_str).unwrap_or("-");
                            tracing::warn!(collection, name, error = %e, "skipping undecodable document");
                        }
                    }
                }
            }

            page_token = page
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            if page_token.is_none() {
                break;
            }
        }

        tracing::debug!(collection, count = documents.len(), "documents listed");
        Ok(documents)
    }

    async fn get(&self, collection: &str, id: &str) -> DocumentResult<Document> {
        validate_segment("collection", collection)?;
        validate_segment("id", id)?;

        let response = self
            .request(Method::GET, self.document_url(&[collection, id])?)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DocumentError::not_found(collection, id));
        }
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let resource: Value = response.json().await?;
        from_resource(&resource)
    }

    async fn delete(&self, collection: &str, id: &str) -> DocumentResult<()> {
        validate_segment("collection", collection)?;
        validate_segment("id", id)?;

        let response = self
            .request(Method::DELETE, self.document_url(&[collection, id])?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        tracing::debug!(collection, id, "document deleted");
        Ok(())
    }
}
