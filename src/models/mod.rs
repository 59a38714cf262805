// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod analytics;
pub mod cache;
pub mod user;

pub use analytics::{ContributionPoint, HeatmapPoint, LanguageBreakdown, Repository, UserStats};
pub use cache::CacheKind;
pub use user::{AuthStatus, User, UserResponse};
