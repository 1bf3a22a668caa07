//! Application-wide error type. Each route handler returns `AppError` on
//! its error path; `IntoResponse` maps it to a status code and a small
//! JSON body, mirroring the status-code mapping the teacher's webhook
//! handler does inline but centralized here since this crate has more
//! than one handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use platform_clients::{BrokerError, ChatError, LogStoreError, RepoHostError};
use platform_storage::StorageError;
use ratelimit_core::LimiterError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    RepoHost(#[from] RepoHostError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    LogStore(#[from] LogStoreError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Limiter(#[from] LimiterError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(_) | AppError::Storage(StorageError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::InvalidRequest(_) | AppError::Storage(StorageError::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::RepoHost(RepoHostError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::RepoHost(_) | AppError::Chat(_) | AppError::LogStore(_) => {
                error!(error = %self, "external collaborator call failed");
                (StatusCode::BAD_GATEWAY, "upstream dependency unavailable".to_string())
            }
            AppError::Broker(_) => {
                error!(error = %self, "job broker call failed");
                (StatusCode::SERVICE_UNAVAILABLE, "job queue unavailable".to_string())
            }
            AppError::Limiter(_) => {
                error!(error = %self, "rate limiter call failed outside the admission layer");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            AppError::Storage(_) => {
                error!(error = %self, "storage call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
