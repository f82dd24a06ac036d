//! Application error types for robust error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Command body that does not describe a known command shape.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Missing, malformed, forged or expired bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn missing_token() -> Self {
        AppError::Unauthorized("missing token".to_string())
    }

    pub fn invalid_token() -> Self {
        AppError::Unauthorized("invalid token".to_string())
    }

    /// Message safe to show the caller.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Unauthorized(msg)
            | AppError::InvalidCommand(msg)
            | AppError::Validation(msg) => msg.clone(),
            AppError::Serialization(e) => format!("Invalid payload: {}", e),
            AppError::Relay(e) => e.to_string(),
            AppError::Config(_) | AppError::Internal(_) => "Internal error".to_string(),
        }
    }
}

/// Failures of the content relay. Each maps to its own HTTP status.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Missing url")]
    MissingUrl,

    #[error("Invalid url")]
    InvalidUrl,

    #[error("Only http/https allowed")]
    UnsupportedScheme,

    #[error("Upstream error {0}")]
    Upstream(u16),

    #[error("Payload too large")]
    TooLarge,

    #[error("Relay timeout")]
    Timeout,

    #[error("Relay fetch failed")]
    Fetch(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingUrl | RelayError::InvalidUrl | RelayError::UnsupportedScheme => {
                StatusCode::BAD_REQUEST
            }
            RelayError::Upstream(code) => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Fetch(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RelayError::Timeout
        } else {
            RelayError::Fetch(e.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) | AppError::Validation(_) | AppError::InvalidCommand(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Relay(e) => e.status(),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
