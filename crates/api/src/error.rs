use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mypoems_core::error::CoreError;
use mypoems_n8n::N8nError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors, [`N8nError`] for the workflow
/// engine, and adds HTTP-specific variants. Implements [`IntoResponse`] to
/// produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `mypoems_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A workflow engine call failed.
    #[error(transparent)]
    N8n(#[from] N8nError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION", core.to_string())
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Store(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal_error()
                }
            },

            // --- Database errors ---
            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                internal_error()
            }

            // --- Workflow engine errors ---
            AppError::N8n(err) => classify_n8n_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal_error() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Classify a workflow engine error into an HTTP status, error code, and message.
///
/// - Missing engine configuration maps to 500 with a sanitized message.
/// - An unusable caller-supplied URL maps to 400.
/// - Network failures and non-2xx engine responses map to 502.
fn classify_n8n_error(err: &N8nError) -> (StatusCode, &'static str, String) {
    match err {
        N8nError::NotConfigured(setting) => {
            tracing::error!(setting, "Workflow engine is not configured");
            internal_error()
        }
        N8nError::InvalidUrl(msg) => (
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
            format!("Invalid URL: {msg}"),
        ),
        N8nError::Request(e) => {
            tracing::error!(error = %e, "Workflow engine unreachable");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "Workflow engine is unreachable".to_string(),
            )
        }
        N8nError::ApiError { status, body } => {
            tracing::error!(status, body = %body, "Workflow engine returned an error");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                format!("Workflow engine returned HTTP {status}"),
            )
        }
    }
}
