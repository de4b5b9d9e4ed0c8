//! API Error Types
//!
//! Every failure leaves the API as `{ "success": false, "error", "code" }`
//! with the status from [`ApiError::status_code`].

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pp_core::CoreError;
use pp_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::bridge::BridgeError;
use crate::metrics::record_error;

/// API-specific errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    /// Resource not found
    #[error("{resource_type} not found: {id}")]
    NotFound { resource_type: String, id: String },

    /// Missing or bad credentials
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Authenticated but not allowed
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// Duplicate or conflicting state
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Optional component switched off or unreachable
    #[error("Service unavailable: {reason}")]
    ServiceUnavailable { reason: String },

    /// Store or rule error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Payment bridge error
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Human readable message
    pub error: String,
    /// Stable error code
    pub code: String,
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Store(err) => match err {
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::Conflict(_) => StatusCode::CONFLICT,
                StoreError::Forbidden(_) => StatusCode::FORBIDDEN,
                StoreError::Validation(_) => StatusCode::BAD_REQUEST,
                StoreError::Rule(rule) => match rule {
                    CoreError::AlreadyCompleted(_) | CoreError::InvalidState(_) => StatusCode::CONFLICT,
                    _ => StatusCode::BAD_REQUEST,
                },
                StoreError::Serialization(_) | StoreError::Database(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Bridge(BridgeError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Bridge(BridgeError::CallFailed(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Unauthorized { .. } => "UNAUTHORIZED",
            ApiError::Forbidden { .. } => "FORBIDDEN",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
            ApiError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            ApiError::Store(err) => match err {
                StoreError::NotFound { .. } => "NOT_FOUND",
                StoreError::Conflict(_) => "CONFLICT",
                StoreError::Forbidden(_) => "FORBIDDEN",
                StoreError::Validation(_) => "VALIDATION_ERROR",
                StoreError::Rule(rule) => match rule {
                    CoreError::InvalidAmount(_) => "INVALID_AMOUNT",
                    CoreError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
                    CoreError::InsufficientEnergy { .. } => "INSUFFICIENT_ENERGY",
                    CoreError::AlreadyCompleted(_) => "ALREADY_COMPLETED",
                    CoreError::SupplyExceeded { .. } => "SUPPLY_EXCEEDED",
                    CoreError::Validation(_) => "VALIDATION_ERROR",
                    CoreError::InvalidState(_) => "INVALID_STATE",
                },
                StoreError::Serialization(_) | StoreError::Database(_) => "STORE_ERROR",
            },
            ApiError::Bridge(BridgeError::Unavailable(_)) => "BRIDGE_UNAVAILABLE",
            ApiError::Bridge(BridgeError::CallFailed(_)) => "BRIDGE_ERROR",
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource_type: impl Into<String>, id: impl ToString) -> Self {
        ApiError::NotFound {
            resource_type: resource_type.into(),
            id: id.to_string(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(reason: impl Into<String>) -> Self {
        ApiError::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable {
            reason: reason.into(),
        }
    }

    /// Message safe to show to clients
    fn public_message(&self) -> String {
        match self {
            ApiError::Internal { .. }
            | ApiError::Store(StoreError::Database(_))
            | ApiError::Store(StoreError::Serialization(_)) => "Internal server error".to_string(),
            ApiError::Bridge(_) => "Payment bridge error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Store(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        if status.is_server_error() {
            error!(error = %self, code, "Request failed");
        }
        record_error(code);

        let body = ErrorResponse {
            success: false,
            error: self.public_message(),
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
