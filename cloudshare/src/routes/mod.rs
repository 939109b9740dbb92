//! Plain axum routers mounted next to the REST services.

pub mod chat;
pub mod media;
pub mod pages;

use axum::extract::DefaultBodyLimit;
use share_axum::middlewares::{MultipartConfig, MultipartToJson};
use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;

pub type UploadLayer = ServiceBuilder<Stack<MultipartToJson, Stack<DefaultBodyLimit, Identity>>>;

/// Body limit plus multipart conversion for routes that accept uploads.
/// axum's default 2 MB limit would cut uploads short, so it is raised to
/// twice the configured total to leave room for multipart framing.
pub fn upload_layer(uploads: &MultipartConfig) -> UploadLayer {
    ServiceBuilder::new()
        .layer(DefaultBodyLimit::max(uploads.max_total_size.saturating_mul(2)))
        .layer(MultipartToJson::with_config(uploads.clone()))
}
