//! Error taxonomy for the storefront core
//!
//! Repository and codec failures propagate up as [`StoreError`]; the HTTP
//! layer turns them into a small set of caller-facing outcomes via
//! [`IntoResponse`]. Internal details (I/O errors, malformed lines) are
//! logged but never echoed back to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// A record block or line that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

impl DecodeError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Errors produced by repositories and the coordinator
#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing key in any repository
    #[error("{0} not found")]
    NotFound(String),

    /// Duplicate unique key on create
    #[error("{0}")]
    Conflict(String),

    /// A stored record failed to decode
    #[error("malformed record #{record} in {store}: {reason}")]
    MalformedRecord {
        store: &'static str,
        record: usize,
        reason: DecodeError,
    },

    /// Order placement was attempted on an empty cart
    #[error("cart is empty")]
    EmptyCart,

    /// Missing or invalid required field
    #[error("{0}")]
    Validation(String),

    /// Credentials did not match any user
    #[error("invalid credentials")]
    Unauthorized,

    /// Underlying file I/O failed
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Failure to deliver a notification
///
/// Never rolls back the state change that triggered it.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("no recipient address for {0}")]
    NoRecipient(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Configuration errors that can occur during startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    Invalid(String, String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::EmptyCart | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MalformedRecord { .. } | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(json!({
                "success": false,
                "message": message
            })),
        )
            .into_response()
    }
}
