// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User profile stored in the database.
///
/// Deliberately not `Serialize`: API responses go through [`UserResponse`],
/// which has no access token field.
#[derive(Clone, PartialEq)]
pub struct User {
    /// GitHub user ID (also the primary key)
    pub id: u64,
    /// GitHub login
    pub login: String,
    /// Display name
    pub name: Option<String>,
    /// Email (None if private)
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub blog: Option<String>,
    pub public_repos: u32,
    pub followers: u32,
    pub following: u32,
    /// GitHub OAuth access token
    pub access_token: String,
    /// When user first connected
    pub created_at: DateTime<Utc>,
    /// Most recent successful login
    pub last_login_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("login", &self.login)
            .field("access_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Public user profile.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/types/generated/")
)]
pub struct UserResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub blog: Option<String>,
    pub public_repos: u32,
    pub followers: u32,
    pub following: u32,
    pub created_at: String,
    pub last_login_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        use crate::time_utils::format_utc_rfc3339;

        Self {
            id: user.id,
            login: user.login.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            bio: user.bio.clone(),
            company: user.company.clone(),
            location: user.location.clone(),
            blog: user.blog.clone(),
            public_repos: user.public_repos,
            followers: user.followers,
            following: user.following,
            created_at: format_utc_rfc3339(user.created_at),
            last_login_at: format_utc_rfc3339(user.last_login_at),
        }
    }
}

/// Response for `GET /auth/status`.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/types/generated/")
)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub user: Option<UserResponse>,
}
