//! Application error types with TRAPI response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::trapi::ValidationError;

/// Application-level errors for the cooccurrence service.
#[derive(Error, Debug)]
pub enum AppError {
    // Store errors
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("Invalid connection string: {0}")]
    Connection(String),

    // Request errors
    #[error("No message in request")]
    MissingMessage,

    #[error("Request body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("Query graph failed validation")]
    Validation(Vec<ValidationError>),

    #[error("Unsupported attribute constraints: {}", .0.join(", "))]
    UnsupportedConstraint(Vec<String>),

    // External service errors
    #[error("Normalizer request failed: {0}")]
    Normalizer(#[from] reqwest::Error),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Wire shape for error payloads that are not validation error lists.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::MissingMessage => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "No message in request"})),
            )
                .into_response(),
            AppError::MalformedBody(detail) => {
                (StatusCode::BAD_REQUEST, Json(json!({"error": detail}))).into_response()
            }
            AppError::Validation(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
            }
            AppError::UnsupportedConstraint(ids) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "errorCode": "UnsupportedConstraint",
                    "constraints": ids,
                })),
            )
                .into_response(),
            other => {
                tracing::error!(error = %other, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: other.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
