// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub OAuth authentication routes.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::auth::{resolve_user, SESSION_COOKIE};
use crate::models::{AuthStatus, UserResponse};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/github", get(auth_start))
        .route("/auth/callback", get(auth_callback))
        .route("/auth/logout", post(logout))
        .route("/auth/status", get(auth_status))
}

/// Plain acknowledgement body.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/types/generated/")
)]
pub struct MessageResponse {
    pub message: String,
}

/// 302 Found, which is what browsers and the frontend expect here.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Session cookie with the attributes shared by set and clear.
fn session_cookie(config: &Config, value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::minutes(config.session_ttl_minutes))
        .build()
}

/// Start OAuth flow - redirect to GitHub authorization.
async fn auth_start(State(state): State<Arc<AppState>>) -> Result<Response> {
    let auth_url = state.auth.begin_login()?;

    tracing::info!(
        client_id = %state.config.github_client_id,
        "Starting OAuth flow, redirecting to GitHub"
    );

    Ok(found(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth callback - exchange code, store user, set the session cookie.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Response)> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from GitHub");
        return Err(AppError::LoginFailed(
            params.error_description.unwrap_or(error),
        ));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::validation("code", "Missing authorization code"))?;
    let oauth_state = params.state.unwrap_or_default();

    let session_token = state.auth.complete_login(&code, &oauth_state).await?;

    let jar = jar.add(session_cookie(&state.config, session_token));
    let redirect_url = format!("{}/dashboard", state.config.frontend_url);

    Ok((jar, found(&redirect_url)))
}

/// Logout - clear the session cookie. Sessions are stateless, so that's all.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    // Always send the removal, even if this request came in with a Bearer header.
    let mut removal = session_cookie(&state.config, String::new());
    removal.make_removal();
    let jar = jar.add(removal);
    (
        jar,
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

/// Whether the request carries a valid session, and for whom.
async fn auth_status(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<AuthStatus>> {
    match resolve_user(&state, &jar, &headers).await {
        Ok(user) => Ok(Json(AuthStatus {
            authenticated: true,
            user: Some(UserResponse::from(&user)),
        })),
        Err(AppError::Unauthorized(reason)) => {
            tracing::debug!(reason = %reason, "Unauthenticated status check");
            Ok(Json(AuthStatus {
                authenticated: false,
                user: None,
            }))
        }
        Err(e) => Err(e),
    }
}
