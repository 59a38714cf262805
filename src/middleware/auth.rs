// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session JWT issuing, validation and the authentication middleware.

use crate::error::{AppError, SessionError};
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "devdash_session";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (GitHub user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Authenticated user, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

/// Create a JWT for a user session, valid for `ttl` from `now`.
pub fn create_session_token(
    user_id: u64,
    signing_key: &[u8],
    ttl: Duration,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Validate a session JWT and return the user ID it was issued for.
///
/// No leeway: a token is good up to its `exp` and `Expired` afterwards.
pub fn validate_session_token(token: &str, signing_key: &[u8]) -> Result<u64, SessionError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(signing_key), &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => SessionError::Expired,
            _ => SessionError::Invalid,
        })?;

    token_data
        .claims
        .sub
        .parse()
        .map_err(|_| SessionError::Invalid)
}

/// Session token from the cookie, falling back to `Authorization: Bearer`.
pub fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Resolve the request's credential to a stored user.
pub async fn resolve_user(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<User, AppError> {
    let token = session_token(jar, headers).ok_or(SessionError::Missing)?;
    let user_id = validate_session_token(&token, &state.config.jwt_signing_key)?;

    match state.db.get_user(user_id).await? {
        Some(user) => Ok(user),
        None => {
            tracing::warn!(user_id, "Session for unknown user");
            Err(SessionError::Invalid.into())
        }
    }
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = resolve_user(&state, &jar, request.headers()).await?;
    request.extensions_mut().insert(AuthUser { user });

    Ok(next.run(request).await)
}
