//! Domain-specific error types for ikigai-pathway

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Main error type for the ikigai-pathway service
#[derive(Error, Debug)]
pub enum IkigaiError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Invalid color for '{field}': {value}")]
    InvalidColor { field: String, value: String },

    #[error("Unknown pillar: {key}")]
    UnknownPillar { key: String },

    #[error("Upstream service error: {message}")]
    Upstream { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl IkigaiError {
    /// HTTP status used when the error crosses the API boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            IkigaiError::Validation { .. }
            | IkigaiError::InvalidColor { .. }
            | IkigaiError::UnknownPillar { .. } => StatusCode::BAD_REQUEST,
            IkigaiError::NotFound { .. } => StatusCode::NOT_FOUND,
            IkigaiError::Storage { .. } | IkigaiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            IkigaiError::Config { .. }
            | IkigaiError::Render { .. }
            | IkigaiError::Serialization { .. }
            | IkigaiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        IkigaiError::NotFound { what: what.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        IkigaiError::Validation {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for IkigaiError {
    fn from(err: anyhow::Error) -> Self {
        IkigaiError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for IkigaiError {
    fn from(err: serde_json::Error) -> Self {
        IkigaiError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for IkigaiError {
    fn from(err: reqwest::Error) -> Self {
        IkigaiError::Storage {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

impl From<image::ImageError> for IkigaiError {
    fn from(err: image::ImageError) -> Self {
        IkigaiError::Render {
            message: format!("PNG encoding failed: {}", err),
        }
    }
}

impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for IkigaiError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        IkigaiError::Render {
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for IkigaiError {
    fn from(err: tokio::task::JoinError) -> Self {
        IkigaiError::Internal {
            message: format!("Blocking task failed: {}", err),
        }
    }
}

/// Convert IkigaiError to a JSON error response
impl IntoResponse for IkigaiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "{}", self);
        }
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}

/// Result type alias for Ikigai operations
pub type Result<T> = std::result::Result<T, IkigaiError>;
