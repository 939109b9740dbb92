use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::services::CloudShareState;

pub fn router(state: Arc<CloudShareState>) -> Router<()> {
    Router::new()
        .route("/api/deleteFile", any(delete_file))
        .with_state(state)
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

/// Destroy a hosted media object by `publicId`. Uses its own flat error
/// bodies rather than the structured REST errors.
async fn delete_file(
    State(state): State<Arc<CloudShareState>>,
    method: Method,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    if method != Method::POST {
        return reply(StatusCode::METHOD_NOT_ALLOWED, json!({"error": "Method not allowed"}));
    }

    let public_id = payload
        .ok()
        .and_then(|Json(body)| body.get("publicId").and_then(Value::as_str).map(str::to_string))
        .filter(|id| !id.trim().is_empty());
    let Some(public_id) = public_id else {
        return reply(StatusCode::BAD_REQUEST, json!({"error": "Missing publicId"}));
    };

    match state.media.destroy(&public_id).await {
        Ok(result) => {
            tracing::info!(public_id = %public_id, "media object destroyed");
            reply(StatusCode::OK, json!({"result": result}))
        }
        Err(e) => {
            tracing::error!(public_id = %public_id, error = %e, "media destroy failed");
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "Failed to delete from Cloudinary", "details": e.to_string()}),
            )
        }
    }
}
