//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::ServiceError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or unresolvable bearer token
    #[error("Unauthorized")]
    Unauthorized,

    /// Failure reported by a store operation
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Service(err) => match err {
                ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Conflict(_) => StatusCode::CONFLICT,
                ServiceError::Authentication => StatusCode::UNAUTHORIZED,
                ServiceError::Authorization(_) => StatusCode::FORBIDDEN,
                ServiceError::Internal(_) | ServiceError::Database(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::Service(err @ (ServiceError::Internal(_) | ServiceError::Database(_))) => {
                error!("Request failed: {}", err);
                "Internal server error".to_string()
            }
            ApiError::Service(err) => err.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
