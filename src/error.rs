//! Error types and HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Conversation must contain at least one message")]
    EmptyConversation,

    #[error("Generator error: {0}")]
    BackendError(String),

    #[error("Generator request failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("No healthy generator endpoints: {0}")]
    NoHealthyBackends(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Error body returned for every failure produced by this service
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable error message
    pub error: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::EmptyConversation => StatusCode::BAD_REQUEST,
            AppError::BackendError(_) | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::NoHealthyBackends(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
