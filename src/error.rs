// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Why a session credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Not authenticated")]
    Missing,

    #[error("Invalid session token")]
    Invalid,

    #[error("Session expired")]
    Expired,
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(#[from] SessionError),

    #[error("GitHub rejected the access token")]
    UpstreamAuth,

    #[error("GitHub rate limit exceeded")]
    UpstreamRateLimited {
        /// Seconds until the limit resets, when GitHub told us.
        retry_after: Option<u64>,
    },

    #[error("GitHub API error: {0}")]
    Upstream(String),

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Invalid request: {message}")]
    Validation {
        field: Option<String>,
        message: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) | AppError::UpstreamAuth => StatusCode::UNAUTHORIZED,
            AppError::UpstreamRateLimited { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::LoginFailed(_) | AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(SessionError::Expired) => "session_expired",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::UpstreamAuth => "github_token_invalid",
            AppError::UpstreamRateLimited { .. } => "github_rate_limited",
            AppError::Upstream(_) => "github_error",
            AppError::LoginFailed(_) => "login_failed",
            AppError::Validation { .. } => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|name| name.to_string());
        AppError::Validation {
            field,
            message: errors.to_string(),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures are logged here and hidden from the client.
        let detail = match &self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                "Database error".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "Internal server error".to_string()
            }
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "GitHub API error");
                self.to_string()
            }
            other => other.to_string(),
        };

        let field = match &self {
            AppError::Validation { field, .. } => field.clone(),
            _ => None,
        };

        let retry_after = match &self {
            AppError::UpstreamRateLimited { retry_after } => *retry_after,
            _ => None,
        };

        let body = ErrorResponse {
            error: self.code(),
            detail,
            field,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
