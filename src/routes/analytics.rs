// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard analytics routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{ContributionPoint, HeatmapPoint, LanguageBreakdown, Repository, UserStats};
use crate::routes::extract::ValidatedQuery;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub const DEFAULT_CONTRIBUTION_DAYS: u32 = 30;
pub const DEFAULT_REPOSITORY_LIMIT: u32 = 10;

/// Analytics routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analytics/stats", get(get_stats))
        .route("/analytics/contributions", get(get_contributions))
        .route("/analytics/languages", get(get_languages))
        .route("/analytics/repositories", get(get_repositories))
        .route("/analytics/heatmap", get(get_heatmap))
}

fn default_days() -> u32 {
    DEFAULT_CONTRIBUTION_DAYS
}

fn default_limit() -> u32 {
    DEFAULT_REPOSITORY_LIMIT
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContributionsQuery {
    #[serde(default = "default_days")]
    #[validate(range(min = 1, max = 90))]
    pub days: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RepositoriesQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
}

async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserStats>> {
    Ok(Json(state.analytics.stats(&auth.user).await?))
}

async fn get_contributions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedQuery(params): ValidatedQuery<ContributionsQuery>,
) -> Result<Json<Vec<ContributionPoint>>> {
    let points = state
        .analytics
        .contributions(&auth.user, params.days)
        .await?;
    Ok(Json(points))
}

async fn get_languages(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<LanguageBreakdown>>> {
    Ok(Json(state.analytics.languages(&auth.user).await?))
}

async fn get_repositories(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedQuery(params): ValidatedQuery<RepositoriesQuery>,
) -> Result<Json<Vec<Repository>>> {
    let repos = state
        .analytics
        .repositories(&auth.user, params.limit)
        .await?;
    Ok(Json(repos))
}

async fn get_heatmap(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<HeatmapPoint>>> {
    Ok(Json(state.analytics.heatmap(&auth.user).await?))
}
