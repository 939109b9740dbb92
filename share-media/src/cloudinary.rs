use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::{CloudinaryConfig, MediaError, MediaResult, MediaStore, MediaUpload, UploadReceipt};

/// Cloudinary-style media store.
///
/// Uploads are unsigned (upload preset); deletes are signed with the API
/// secret using SHA-256.
pub struct CloudinaryStore {
    client: Client,
    config: CloudinaryConfig,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> MediaResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn with_client(client: Client, config: CloudinaryConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &CloudinaryConfig {
        &self.config
    }
}

/// Signature over `params` as the media store expects it: parameters sorted
/// by name, joined as `k=v&k=v`, the secret appended, SHA-256, lowercase hex.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn error_message(body: &Value) -> String {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or("no error message")
        .to_string()
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, upload: MediaUpload) -> MediaResult<UploadReceipt> {
        if upload.is_empty() {
            return Err(MediaError::invalid("file is empty"));
        }

        let size = upload.bytes.len();
        let mut part = Part::bytes(upload.bytes.to_vec()).file_name(upload.filename.clone());
        if let Some(content_type) = &upload.content_type {
            part = part.mime_str(content_type)?;
        }

        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.config.upload_preset.clone());

        tracing::debug!(filename = %upload.filename, size, "uploading to media store");

        let response = self
            .client
            .post(self.config.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            return Err(MediaError::rejected(status.as_u16(), error_message(&body)));
        }

        let secure_url = body
            .get("secure_url")
            .and_then(Value::as_str)
            .filter(|url| !url.trim().is_empty())
            .ok_or(MediaError::MissingUrl)?;

        let receipt = UploadReceipt {
            secure_url: secure_url.to_string(),
            public_id: body.get("public_id").and_then(Value::as_str).map(str::to_string),
        };

        tracing::info!(url = %receipt.secure_url, "media uploaded");
        Ok(receipt)
    }

    async fn destroy(&self, public_id: &str) -> MediaResult<Value> {
        let public_id = public_id.trim();
        if public_id.is_empty() {
            return Err(MediaError::invalid("public id is empty"));
        }

        let (Some(api_key), Some(api_secret)) = (&self.config.api_key, &self.config.api_secret) else {
            return Err(MediaError::not_configured("api key and secret are required to delete media"));
        };

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(&[("public_id", public_id), ("timestamp", &timestamp)], api_secret);

        let form = [
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
            ("api_key", api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let response = self
            .client
            .post(self.config.destroy_url())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            return Err(MediaError::rejected(status.as_u16(), error_message(&body)));
        }

        tracing::info!(public_id, result = %body, "media destroyed");
        Ok(body)
    }
}
