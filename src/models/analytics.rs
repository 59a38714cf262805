// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Response shapes for the dashboard analytics endpoints.
//!
//! These are also what gets stored in the cache, so changing a field here
//! invalidates old cache rows (they fail to decode and are recomputed).

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Totals across all of a user's repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/types/generated/")
)]
pub struct UserStats {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_stars: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_forks: u64,
    pub public_repos: u32,
    pub private_repos: u32,
    /// Commits authored in the last year (search API total)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_commits: u64,
}

/// Activity on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/types/generated/")
)]
pub struct ContributionPoint {
    /// "YYYY-MM-DD" (UTC)
    pub date: String,
    pub commits: u32,
    pub pull_requests: u32,
    pub issues: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/types/generated/")
)]
pub struct LanguageBreakdown {
    pub language: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub bytes: u64,
    /// 0-100, two decimals
    pub percentage: f64,
    /// Hex colour for charts, e.g. "#dea584"
    pub color: String,
}

/// Repository summary for the top-repositories list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/types/generated/")
)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub language: Option<String>,
    pub stars: u32,
    pub forks: u32,
    pub is_private: bool,
    pub updated_at: String,
}

/// One cell of the day-of-week x hour-of-day grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/types/generated/")
)]
pub struct HeatmapPoint {
    /// 0 = Sunday .. 6 = Saturday
    pub day: u8,
    /// 0..=23 (UTC)
    pub hour: u8,
    pub count: u32,
}
