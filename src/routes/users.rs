// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Current-user routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::UserResponse;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User routes (require authentication).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/me/refresh", post(refresh_cache))
}

async fn get_me(Extension(auth): Extension<AuthUser>) -> Json<UserResponse> {
    Json(UserResponse::from(&auth.user))
}

/// Response for cache refresh.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/types/generated/")
)]
pub struct RefreshResponse {
    pub message: String,
    /// Number of cache entries removed
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub deleted: u64,
}

/// Drop every cached view for the current user.
async fn refresh_cache(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<RefreshResponse>> {
    let deleted = state.db.invalidate_user_cache(auth.user.id).await?;

    tracing::info!(user_id = auth.user.id, deleted, "Cache invalidated");

    Ok(Json(RefreshResponse {
        message: "Cache cleared".to_string(),
        deleted,
    }))
}
