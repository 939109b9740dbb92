use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use serde_json::Value;
use share_axum::middlewares::MultipartConfig;
use share_core::{ShareApp, ShareConfigSnapshot};
use share_docs::{DocumentStore, FirestoreConfig, FirestoreStore, MemoryDocumentStore};
use share_media::{CloudinaryConfig, CloudinaryStore, MediaStore, MemoryMediaStore};

use crate::routes::chat::DEFAULT_MAX_SESSIONS;
use crate::services::adapters::{GeminiAdapter, GeminiConfig};
use crate::services::ShareParams;
use crate::workflows::chat::DEFAULT_SYSTEM_INSTRUCTION;
use crate::workflows::LanguageModel;

/// Prefix of the generic `CLOUDSHARE__A__B=value` overrides.
pub const ENV_PREFIX: &str = "CLOUDSHARE";

/// Load settings from the process environment, then apply
/// `CLOUDSHARE__*` overrides.
pub fn config(app: &ShareApp<Value, ShareParams>) -> Result<()> {
    config_from(app, |key| std::env::var(key).ok());
    let overrides = app.load_env(ENV_PREFIX);
    if overrides > 0 {
        tracing::debug!(overrides, prefix = ENV_PREFIX, "applied environment overrides");
    }
    Ok(())
}

/// Same as [`config`] with an explicit variable lookup and no overrides.
pub fn config_from<F>(app: &ShareApp<Value, ShareParams>, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let set = |key: &str, env: &str, default: Option<&str>| {
        let value = lookup(env)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| default.map(str::to_string));
        if let Some(value) = value {
            app.set(key, value);
        }
    };

    // HTTP server
    set("http.host", "HTTP_HOST", Some("127.0.0.1"));
    set("http.port", "HTTP_PORT", Some("3030"));

    set("storage.backend", "CLOUDSHARE_BACKEND", Some("remote"));
    set("upstream.timeoutSecs", "UPSTREAM_TIMEOUT_SECS", Some("30"));
    set("upload.maxFileMb", "UPLOAD_MAX_FILE_MB", Some("100"));
    set("submissions.collection", "SUBMISSIONS_COLLECTION", Some("data"));

    // Media store
    set("media.baseUrl", "CLOUDINARY_BASE_URL", Some("https://api.cloudinary.com"));
    set("media.cloudName", "CLOUDINARY_CLOUD_NAME", None);
    set("media.uploadPreset", "CLOUDINARY_UPLOAD_PRESET", None);
    set("media.apiKey", "CLOUDINARY_API_KEY", None);
    set("media.apiSecret", "CLOUDINARY_API_SECRET", None);

    // Document store
    set("docs.baseUrl", "FIRESTORE_BASE_URL", Some("https://firestore.googleapis.com"));
    set("docs.projectId", "FIRESTORE_PROJECT_ID", None);
    set("docs.database", "FIRESTORE_DATABASE", Some("(default)"));
    set("docs.apiKey", "FIRESTORE_API_KEY", None);
    set("docs.accessToken", "FIRESTORE_ACCESS_TOKEN", None);

    // Chat
    set("chat.baseUrl", "GEMINI_BASE_URL", Some("https://generativelanguage.googleapis.com"));
    set("chat.model", "GEMINI_MODEL", Some("gemini-2.0-flash"));
    set("chat.apiKey", "GEMINI_API_KEY", None);
    set("chat.systemInstruction", "CHAT_SYSTEM_INSTRUCTION", Some(DEFAULT_SYSTEM_INSTRUCTION));
    set("chat.maxSessions", "CHAT_MAX_SESSIONS", Some("1000"));
}

fn optional(cfg: &ShareConfigSnapshot, key: &str) -> Option<String> {
    cfg.get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn upstream_timeout(cfg: &ShareConfigSnapshot) -> Duration {
    Duration::from_secs(cfg.get_u64("upstream.timeoutSecs").unwrap_or(30))
}

pub fn collection(cfg: &ShareConfigSnapshot) -> String {
    optional(cfg, "submissions.collection").unwrap_or_else(|| "data".to_string())
}

pub fn system_instruction(cfg: &ShareConfigSnapshot) -> String {
    optional(cfg, "chat.systemInstruction").unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string())
}

pub fn chat_max_sessions(cfg: &ShareConfigSnapshot) -> usize {
    cfg.get_usize("chat.maxSessions").unwrap_or(DEFAULT_MAX_SESSIONS)
}

/// Upload limits for the multipart routes. The whole body may carry one
/// max-size file plus 1 MiB of form fields.
pub fn multipart_config(cfg: &ShareConfigSnapshot) -> MultipartConfig {
    let max_file = cfg
        .get_usize("upload.maxFileMb")
        .unwrap_or(100)
        .saturating_mul(1024 * 1024);
    MultipartConfig::new()
        .max_file_size(max_file)
        .max_total_size(max_file.saturating_add(1024 * 1024))
        .file_field("file")
}

pub fn cloudinary_config(cfg: &ShareConfigSnapshot) -> Result<CloudinaryConfig> {
    let mut config = CloudinaryConfig::new(cfg.require("media.cloudName")?, cfg.require("media.uploadPreset")?)
        .timeout(upstream_timeout(cfg));
    if let Some(base) = optional(cfg, "media.baseUrl") {
        config = config.base_url(base);
    }
    if let (Some(key), Some(secret)) = (optional(cfg, "media.apiKey"), optional(cfg, "media.apiSecret")) {
        config = config.credentials(key, secret);
    }
    Ok(config)
}

pub fn firestore_config(cfg: &ShareConfigSnapshot) -> Result<FirestoreConfig> {
    let mut config = FirestoreConfig::new(cfg.require("docs.projectId")?).timeout(upstream_timeout(cfg));
    if let Some(base) = optional(cfg, "docs.baseUrl") {
        config = config.base_url(base);
    }
    if let Some(database) = optional(cfg, "docs.database") {
        config = config.database(database);
    }
    if let Some(key) = optional(cfg, "docs.apiKey") {
        config = config.api_key(key);
    }
    if let Some(token) = optional(cfg, "docs.accessToken") {
        config = config.access_token(token);
    }
    Ok(config)
}

/// `None` when no API key is configured; chat is then left out.
pub fn gemini_config(cfg: &ShareConfigSnapshot) -> Option<GeminiConfig> {
    let key = optional(cfg, "chat.apiKey")?;
    let mut config = GeminiConfig::new(key).timeout(upstream_timeout(cfg));
    if let Some(base) = optional(cfg, "chat.baseUrl") {
        config = config.base_url(base);
    }
    if let Some(model) = optional(cfg, "chat.model") {
        config = config.model(model);
    }
    Some(config)
}

/// The external collaborators the app talks to.
pub struct Backends {
    pub media: Arc<dyn MediaStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub chat: Option<Arc<dyn LanguageModel>>,
}

impl Backends {
    /// In-process stores and no chat.
    pub fn memory() -> Self {
        Self {
            media: Arc::new(MemoryMediaStore::new()),
            documents: Arc::new(MemoryDocumentStore::new()),
            chat: None,
        }
    }

    pub fn from_config(cfg: &ShareConfigSnapshot) -> Result<Self> {
        let chat = match gemini_config(cfg) {
            Some(c) => Some(Arc::new(GeminiAdapter::new(c)?) as Arc<dyn LanguageModel>),
            None => {
                tracing::warn!("chat.apiKey is not set; chat is disabled");
                None
            }
        };

        let backend = cfg.get("storage.backend").unwrap_or("remote").trim().to_ascii_lowercase();
        let (media, documents): (Arc<dyn MediaStore>, Arc<dyn DocumentStore>) = match backend.as_str() {
            "memory" => {
                tracing::warn!("using in-memory stores; nothing survives a restart");
                (Arc::new(MemoryMediaStore::new()), Arc::new(MemoryDocumentStore::new()))
            }
            "remote" => (
                Arc::new(CloudinaryStore::new(cloudinary_config(cfg)?)?),
                Arc::new(FirestoreStore::new(firestore_config(cfg)?)?),
            ),
            other => bail!("Unknown storage.backend '{other}' (expected 'remote' or 'memory')"),
        };

        Ok(Self { media, documents, chat })
    }
}
