// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use devdash::error::{AppError, SessionError};

mod common;

#[test]
fn test_status_and_code_mapping() {
    let cases = [
        (
            AppError::Unauthorized(SessionError::Missing),
            StatusCode::UNAUTHORIZED,
            "unauthorized",
        ),
        (
            AppError::Unauthorized(SessionError::Invalid),
            StatusCode::UNAUTHORIZED,
            "unauthorized",
        ),
        (
            AppError::Unauthorized(SessionError::Expired),
            StatusCode::UNAUTHORIZED,
            "session_expired",
        ),
        (
            AppError::UpstreamAuth,
            StatusCode::UNAUTHORIZED,
            "github_token_invalid",
        ),
        (
            AppError::UpstreamRateLimited { retry_after: None },
            StatusCode::SERVICE_UNAVAILABLE,
            "github_rate_limited",
        ),
        (
            AppError::Upstream("HTTP 500".to_string()),
            StatusCode::BAD_GATEWAY,
            "github_error",
        ),
        (
            AppError::LoginFailed("bad code".to_string()),
            StatusCode::BAD_REQUEST,
            "login_failed",
        ),
        (
            AppError::validation("days", "out of range"),
            StatusCode::BAD_REQUEST,
            "validation_error",
        ),
        (
            AppError::NotFound("user".to_string()),
            StatusCode::NOT_FOUND,
            "not_found",
        ),
        (
            AppError::Database("disk I/O error".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "database_error",
        ),
        (
            AppError::Internal(anyhow::anyhow!("boom")),
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
        ),
    ];

    for (err, status, code) in cases {
        assert_eq!(err.status(), status, "{err}");
        assert_eq!(err.code(), code, "{err}");
    }
}

#[tokio::test]
async fn test_validation_error_body_names_field() {
    let response = AppError::validation("limit", "must be between 1 and 100").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = common::body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["field"], "limit");
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("must be between 1 and 100"));
}

#[tokio::test]
async fn test_field_omitted_when_absent() {
    let response = AppError::Unauthorized(SessionError::Missing).into_response();
    let body = common::body_json(response).await;
    assert!(body.get("field").is_none());
    assert_eq!(body["detail"], "Not authenticated");
}

#[tokio::test]
async fn test_rate_limit_sets_retry_after() {
    let response = AppError::UpstreamRateLimited {
        retry_after: Some(42),
    }
    .into_response();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");

    let response = AppError::UpstreamRateLimited { retry_after: None }.into_response();
    assert!(response.headers().get(header::RETRY_AFTER).is_none());
}

#[tokio::test]
async fn test_server_errors_hide_details() {
    let response = AppError::Database("UNIQUE constraint failed: users.id".to_string()).into_response();
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "database_error");
    assert!(!body["detail"].as_str().unwrap().contains("UNIQUE"));

    let response = AppError::Internal(anyhow::anyhow!("secret stack trace")).into_response();
    let body = common::body_json(response).await;
    assert!(!body["detail"].as_str().unwrap().contains("secret"));
}

#[test]
fn test_session_error_converts() {
    let err: AppError = SessionError::Expired.into();
    assert!(matches!(err, AppError::Unauthorized(SessionError::Expired)));
}
