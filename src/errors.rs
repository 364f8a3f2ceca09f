use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Why an inbound event was dropped at the classification boundary.
///
/// Both variants are local-recovery errors: the event is discarded and the
/// consumer moves on to the next one. Nothing is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),
}

impl ClassifyError {
    /// Short label used for the dropped-events counter.
    pub fn reason(&self) -> &'static str {
        match self {
            ClassifyError::MalformedEvent(_) => "malformed",
            ClassifyError::UnknownEventKind(_) => "unknown_kind",
        }
    }
}

/// Errors surfaced by the dashboard HTTP API.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("dimension not configured: {0}")]
    UnknownDimension(String),

    #[error("dimension rejected: {0}")]
    SelectionRejected(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::UnknownDimension(d) => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "unknown_dimension",
                format!("dimension '{}' is not configured", d),
            ),
            AppError::SelectionRejected(d) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_request_error",
                "selection_rejected",
                format!("cannot select dimension '{}': not in the configured set", d),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
