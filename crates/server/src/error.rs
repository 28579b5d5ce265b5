//! Unified error handling with Sentry integration.
//!
//! Every route handler returns `Result<T, AppError>`. Failures render as the
//! JSON envelope `{"status": "Error", "error": "<message>"}`; server errors
//! are captured to Sentry first and their detail never reaches the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::CatalogError;

/// Application-level error type for the catalog service.
#[derive(Debug, Error)]
pub enum AppError {
    /// A service operation failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Bad request from client (malformed path, query, or body).
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    error: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(err) => match err {
                CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::InsufficientStock { .. } | CatalogError::AlreadyExists(_) => {
                    StatusCode::CONFLICT
                }
                CatalogError::PasswordHash | CatalogError::Storage { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                error.source = ?std::error::Error::source(&self),
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            _ if status.is_server_error() => "Internal server error".to_string(),
            Self::BadRequest(msg) => msg.clone(),
            _ => self.to_string(),
        };

        let body = ErrorBody {
            status: "Error",
            error: message,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;
    use crate::db::RepositoryError;
    use crate::services::FieldError;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        let cases = [
            (
                AppError::from(CatalogError::Validation(vec![FieldError::required("name")])),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(CatalogError::NotFound("product 1 not found".to_string())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(CatalogError::InsufficientStock {
                    requested: 2,
                    available: 1,
                }),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(CatalogError::AlreadyExists("dup".to_string())),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(CatalogError::storage(
                    "get product",
                    RepositoryError::Database(sqlx::Error::PoolTimedOut),
                )),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::BadRequest("invalid user id".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err}");
        }
    }

    #[tokio::test]
    async fn test_client_error_envelope_carries_message() {
        let (status, body) = render(AppError::from(CatalogError::InsufficientStock {
            requested: 5,
            available: 3,
        }))
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], "Error");
        assert_eq!(
            body["error"],
            "cannot add 5 items, only 3 available in stock"
        );
    }

    #[tokio::test]
    async fn test_server_error_hides_detail() {
        let (status, body) = render(AppError::from(CatalogError::storage(
            "list products",
            RepositoryError::Database(sqlx::Error::PoolTimedOut),
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }
}
