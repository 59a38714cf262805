// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod analytics;
pub mod auth;
pub mod github;

pub use analytics::AnalyticsService;
pub use auth::AuthService;
pub use github::GitHubClient;
