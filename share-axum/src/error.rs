use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use share_core::errors::ShareError;

#[derive(Debug)]
pub struct ShareAxumError(pub anyhow::Error);

impl From<anyhow::Error> for ShareAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<ShareError> for ShareAxumError {
    fn from(e: ShareError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for ShareAxumError {
    fn into_response(self) -> Response {
        // Keep structured fields even when the ShareError is wrapped in context.
        let safe = match ShareError::from_anyhow(&self.0) {
            Some(share) => share.sanitize_for_client(),
            None => {
                tracing::error!(error = %self.0, "unhandled error mapped to GeneralError");
                ShareError::general_error(self.0.to_string())
            }
        };

        if safe.code() >= 500 {
            tracing::warn!(code = safe.code(), message = %safe.message, "request failed");
        }

        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
