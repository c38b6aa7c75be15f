//! Mapping of repository and RPC failures onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::context::Interrupted;
use crate::rpc::RpcError;
use crate::storage::BookNotFound;

/// Error returned by every API handler. Renders as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("missing or malformed bearer token")]
    Unauthorized,
    #[error("user service is not configured")]
    NotConfigured,
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ApiError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotConfigured => StatusCode::NOT_IMPLEMENTED,
            Self::Rpc(err) => err
                .severity()
                .and_then(|s| s.http_status())
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::Store(err) => {
                if let Some(interrupted) = err.downcast_ref::<Interrupted>() {
                    match interrupted {
                        Interrupted::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
                        Interrupted::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                    }
                } else if err.downcast_ref::<BookNotFound>().is_some() {
                    StatusCode::NOT_FOUND
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Opaque store failures are logged in full and reported generically.
        let message = match &self {
            Self::Store(err) if status == StatusCode::INTERNAL_SERVER_ERROR => {
                error!(error = %format!("{err:#}"), "store failure");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
