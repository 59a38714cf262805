// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! DevDash: a GitHub analytics dashboard backend.
//!
//! Signs users in with GitHub OAuth, aggregates their repositories and
//! activity into dashboard views, and caches each view per user in SQLite.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{AnalyticsService, AuthService, GitHubClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub auth: AuthService,
    pub analytics: AnalyticsService,
}

impl AppState {
    /// Wire up services over an already-migrated database.
    pub fn new(config: Config, db: Db) -> Result<Self, error::AppError> {
        let github = GitHubClient::new(&config)?;
        let auth = AuthService::new(&config, db.clone(), github.clone());
        let analytics = AnalyticsService::new(db.clone(), github, config.cache_ttl());

        Ok(Self {
            config,
            db,
            auth,
            analytics,
        })
    }
}
