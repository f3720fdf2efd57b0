//! Error type system for the shopping list service
//!
//! This module provides:
//! - The `ShopError` taxonomy shared by every layer
//! - Classification of credential failures (`AuthFailure`)
//! - HTTP status code mapping
//! - JSON error bodies carrying a trace ID
//!
//! Internal failures are logged in full but reach the client only as a
//! generic "Server error" message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generic message returned for every 5xx response
pub const GENERIC_SERVER_ERROR: &str = "Server error";

tokio::task_local! {
    /// Trace ID of the request currently being served
    pub static REQUEST_TRACE_ID: String;
}

/// Trace ID of the current request, or a fresh one outside a request scope
pub fn current_trace_id() -> String {
    REQUEST_TRACE_ID
        .try_with(|id| id.clone())
        .unwrap_or_else(|_| Uuid::new_v4().to_string())
}

/// Why a request failed authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No `Authorization` header at all
    MissingCredential,
    /// Header present but not `Bearer <token>`
    MalformedCredential,
    /// Bad signature, expired, or otherwise undecodable token
    InvalidToken,
    /// Unknown email or wrong password on login
    InvalidCredentials,
}

impl AuthFailure {
    /// Client-facing message for this failure
    pub fn message(&self) -> &'static str {
        match self {
            AuthFailure::MissingCredential => "Authorization header missing",
            AuthFailure::MalformedCredential => "Invalid Authorization header",
            AuthFailure::InvalidToken => "Invalid or expired token",
            AuthFailure::InvalidCredentials => "Invalid credentials",
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Main error type for the shopping list service
#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    // Client errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed: {0}")]
    Authentication(AuthFailure),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Internal errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Password hashing error: {0}")]
    HashingError(#[from] bcrypt::BcryptError),

    #[error("Token encoding error: {0}")]
    TokenError(String),

    #[error("Task error: {0}")]
    TaskError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ShopError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ShopError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ShopError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ShopError::NotFound(_) => StatusCode::NOT_FOUND,
            ShopError::Conflict(_) => StatusCode::CONFLICT,
            ShopError::DatabaseError(_)
            | ShopError::PoolError(_)
            | ShopError::HashingError(_)
            | ShopError::TokenError(_)
            | ShopError::TaskError(_)
            | ShopError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ShopError::InvalidRequest(_) => "InvalidRequest",
            ShopError::Authentication(_) => "Unauthorized",
            ShopError::NotFound(_) => "NotFound",
            ShopError::Conflict(_) => "Conflict",
            ShopError::DatabaseError(_)
            | ShopError::PoolError(_)
            | ShopError::HashingError(_)
            | ShopError::TokenError(_)
            | ShopError::TaskError(_)
            | ShopError::IoError(_) => "Internal",
        }
    }

    /// Message safe to show to the caller
    pub fn public_message(&self) -> String {
        match self {
            ShopError::InvalidRequest(msg)
            | ShopError::NotFound(msg)
            | ShopError::Conflict(msg) => msg.clone(),
            ShopError::Authentication(failure) => failure.message().to_string(),
            _ => GENERIC_SERVER_ERROR.to_string(),
        }
    }

    /// Whether this error is a server-side fault
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<AuthFailure> for ShopError {
    fn from(failure: AuthFailure) -> Self {
        ShopError::Authentication(failure)
    }
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique trace ID for this error
    pub trace_id: String,
}

impl ErrorResponse {
    /// Create a new error response tagged with the current request's trace ID
    pub fn new(error: String, message: String) -> Self {
        Self {
            error,
            message,
            trace_id: current_trace_id(),
        }
    }

    /// Create an error response from a ShopError
    pub fn from_error(error: &ShopError) -> Self {
        Self::new(error.error_type().to_string(), error.public_message())
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (trace_id: {})", self.error, self.message, self.trace_id)
    }
}

/// Implement IntoResponse for ShopError to enable automatic error handling in Axum
impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::from_error(&self);

        if self.is_internal() {
            tracing::error!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::warn!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for operations that can fail with ShopError
pub type Result<T> = std::result::Result<T, ShopError>;
