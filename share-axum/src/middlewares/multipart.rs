use std::collections::HashSet;

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
};
use base64::Engine;
use bytes::Bytes;
use serde_json::{json, Map, Value};
use share_core::errors::ShareError;
use tower::{Layer, Service};

use crate::ShareAxumError;

/// Limits and field rules for multipart to JSON conversion.
#[derive(Clone, Debug)]
pub struct MultipartConfig {
    /// Maximum size of a single file in bytes (None = unlimited)
    pub max_file_size: Option<usize>,
    /// Maximum size of the whole request body in bytes
    pub max_total_size: usize,
    /// Allowed content types for files (empty = all allowed)
    pub allowed_content_types: HashSet<String>,
    /// Field names to treat as files (empty = any part with a filename)
    pub file_fields: HashSet<String>,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_file_size: Some(100 * 1024 * 1024),
            max_total_size: 200 * 1024 * 1024,
            allowed_content_types: HashSet::new(),
            file_fields: HashSet::new(),
        }
    }
}

impl MultipartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_file_size(mut self, size: usize) -> Self {
        self.max_file_size = Some(size);
        self
    }

    pub fn max_total_size(mut self, size: usize) -> Self {
        self.max_total_size = size;
        self
    }

    pub fn allow_content_type(mut self, content_type: &str) -> Self {
        self.allowed_content_types.insert(content_type.to_string());
        self
    }

    pub fn file_field(mut self, field_name: &str) -> Self {
        self.file_fields.insert(field_name.to_string());
        self
    }
}

/// Layer that turns `multipart/form-data` POST bodies into JSON so they can
/// be consumed by JSON services and handlers.
///
/// Text parts become strings. File parts become
/// `{"filename", "contentType", "size", "data"}` with base64 `data`.
/// A file part with no filename and no bytes (an empty file input) is
/// dropped. Other requests pass through untouched.
#[derive(Clone, Default)]
pub struct MultipartToJson {
    config: MultipartConfig,
}

impl MultipartToJson {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MultipartConfig) -> Self {
        Self { config }
    }
}

impl<S> Layer<S> for MultipartToJson {
    type Service = MultipartToJsonService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MultipartToJsonService {
            inner,
            config: self.config.clone(),
        }
    }
}

#[derive(Clone)]
pub struct MultipartToJsonService<S> {
    inner: S,
    config: MultipartConfig,
}

fn is_multipart(req: &Request) -> bool {
    req.method() == Method::POST
        && req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

impl<S> Service<Request> for MultipartToJsonService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // The clone is not ready; swap so the ready service handles this call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let config = self.config.clone();

        Box::pin(async move {
            if !is_multipart(&req) {
                return inner.call(req).await;
            }

            match convert_multipart_to_json(req, &config).await {
                Ok(json_req) => inner.call(json_req).await,
                Err(err) => {
                    tracing::warn!(error = %err, "rejecting multipart body");
                    Ok(ShareAxumError::from(err).into_response())
                }
            }
        })
    }
}

async fn convert_multipart_to_json(req: Request, config: &MultipartConfig) -> Result<Request, ShareError> {
    let (mut parts, body) = req.into_parts();

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| ShareError::bad_request(format!("Invalid multipart content-type: {e}")))?;

    let body_bytes = axum::body::to_bytes(body, config.max_total_size)
        .await
        .map_err(|_| {
            ShareError::payload_too_large(format!(
                "Request body exceeds {} bytes or could not be read",
                config.max_total_size
            ))
        })?;

    let mut multipart = multer::Multipart::new(
        futures::stream::once(async move { Ok::<Bytes, std::io::Error>(body_bytes) }),
        boundary,
    );
    let mut json_map = Map::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ShareError::bad_request(format!("Failed to parse multipart data: {e}")))?
    {
        let name = field.name().unwrap_or("unknown").to_string();
        let content_type = field.content_type().map(|ct| ct.to_string());
        let filename = field.file_name().map(|f| f.to_string());

        let is_file_field = if config.file_fields.is_empty() {
            filename.is_some()
        } else {
            config.file_fields.contains(&name)
        };

        if !is_file_field {
            let value = field
                .text()
                .await
                .map_err(|e| ShareError::bad_request(format!("Failed to read field '{name}': {e}")))?;
            json_map.insert(name, Value::String(value));
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ShareError::bad_request(format!("Failed to read file field '{name}': {e}")))?;

        if data.is_empty() && filename.as_deref().unwrap_or("").is_empty() {
            tracing::debug!(field = %name, "skipping empty file input");
            continue;
        }

        if let Some(max_size) = config.max_file_size {
            if data.len() > max_size {
                return Err(ShareError::payload_too_large(format!(
                    "File '{name}' exceeds maximum size of {max_size} bytes"
                )));
            }
        }

        if !config.allowed_content_types.is_empty() {
            let allowed = content_type
                .as_ref()
                .is_some_and(|ct| config.allowed_content_types.contains(ct));
            if !allowed {
                return Err(ShareError::bad_request(format!(
                    "Content type '{}' not allowed for file '{name}'",
                    content_type.as_deref().unwrap_or("unknown")
                )));
            }
        }

        tracing::debug!(field = %name, size = data.len(), "encoded file field");
        json_map.insert(
            name,
            json!({
                "filename": filename,
                "contentType": content_type,
                "size": data.len(),
                "data": base64::engine::general_purpose::STANDARD.encode(&data),
            }),
        );
    }

    let json_bytes = serde_json::to_vec(&Value::Object(json_map))
        .map_err(|e| ShareError::general_error(format!("Failed to encode multipart body: {e}")))?;

    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(json_bytes.len()));

    Ok(Request::from_parts(parts, Body::from(json_bytes)))
}
