// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard aggregations over GitHub data, cached per user.
//!
//! Each view is read from the cache when a live entry exists; otherwise it
//! is recomputed from GitHub, written back with the configured TTL, and
//! returned. The reducers are plain functions so they can be tested (and
//! benchmarked) without a network.

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::{
    CacheKind, ContributionPoint, HeatmapPoint, LanguageBreakdown, Repository, User, UserStats,
};
use crate::services::github::{DateWindow, GitHubClient, GitHubRepo, IssueKind};
use crate::time_utils::{format_ymd, parse_github_timestamp};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::future::Future;

/// Upper bound on in-flight `/languages` requests per aggregation.
const MAX_CONCURRENT_LANGUAGE_FETCHES: usize = 8;

/// Commit totals in the stats view cover this many days.
const STATS_COMMIT_WINDOW_DAYS: u32 = 365;

pub const DEFAULT_LANGUAGE_COLOR: &str = "#8b8b8b";

const LANGUAGE_COLORS: &[(&str, &str)] = &[
    ("Python", "#3572A5"),
    ("JavaScript", "#f1e05a"),
    ("TypeScript", "#3178c6"),
    ("Java", "#b07219"),
    ("Go", "#00ADD8"),
    ("Rust", "#dea584"),
    ("Ruby", "#701516"),
    ("PHP", "#4F5D95"),
    ("C#", "#178600"),
    ("C++", "#f34b7d"),
    ("C", "#555555"),
    ("HTML", "#e34c26"),
    ("CSS", "#563d7c"),
    ("Shell", "#89e051"),
    ("Swift", "#F05138"),
    ("Kotlin", "#A97BFF"),
    ("Scala", "#c22d40"),
    ("Vue", "#41b883"),
    ("Dart", "#00B4AB"),
    ("Jupyter Notebook", "#DA5B0B"),
];

/// Chart colour for a language.
pub fn language_color(language: &str) -> &'static str {
    LANGUAGE_COLORS
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_LANGUAGE_COLOR)
}

/// Cached analytics over a user's GitHub account.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Db,
    github: GitHubClient,
    cache_ttl: Duration,
}

impl AnalyticsService {
    pub fn new(db: Db, github: GitHubClient, cache_ttl: Duration) -> Self {
        Self {
            db,
            github,
            cache_ttl,
        }
    }

    /// Star, fork and repository totals plus commits in the last year.
    pub async fn stats(&self, user: &User) -> Result<UserStats> {
        self.cached(user, CacheKind::Stats, move || async move {
            let token = user.access_token.as_str();
            let window =
                DateWindow::last_days(Utc::now().date_naive(), STATS_COMMIT_WINDOW_DAYS);

            let (repos, total_commits) = tokio::try_join!(
                self.github.list_repositories(token),
                self.github.count_commits(token, &user.login, &window),
            )?;

            Ok(summarize_stats(&repos, total_commits))
        })
        .await
    }

    /// Daily commit, PR and issue counts for the last `days` days.
    pub async fn contributions(&self, user: &User, days: u32) -> Result<Vec<ContributionPoint>> {
        self.cached(user, CacheKind::Contributions { days }, move || async move {
            let token = user.access_token.as_str();
            let today = Utc::now().date_naive();
            let window = DateWindow::last_days(today, days);

            let (commits, pull_requests, issues) = tokio::try_join!(
                self.github.search_commits(token, &user.login, &window),
                self.github
                    .search_issues(token, &user.login, IssueKind::PullRequest, &window),
                self.github
                    .search_issues(token, &user.login, IssueKind::Issue, &window),
            )?;

            Ok(build_contribution_timeline(
                today,
                days,
                &commits,
                &pull_requests,
                &issues,
            ))
        })
        .await
    }

    /// Bytes of code per language across the user's own (non-fork) repositories.
    pub async fn languages(&self, user: &User) -> Result<Vec<LanguageBreakdown>> {
        self.cached(user, CacheKind::Languages, move || async move {
            let token = user.access_token.as_str();
            let repos = self.github.list_repositories(token).await?;

            let per_repo: Vec<HashMap<String, u64>> = stream::iter(
                repos
                    .into_iter()
                    .filter(|repo| !repo.fork)
                    .map(|repo| (repo.owner.login, repo.name)),
            )
            .map(|(owner, name)| async move {
                self.github.repository_languages(token, &owner, &name).await
            })
            .buffer_unordered(MAX_CONCURRENT_LANGUAGE_FETCHES)
            .try_collect()
            .await?;

            let mut totals: HashMap<String, u64> = HashMap::new();
            for languages in per_repo {
                for (language, bytes) in languages {
                    *totals.entry(language).or_insert(0) += bytes;
                }
            }

            Ok(build_language_breakdown(totals))
        })
        .await
    }

    /// The `limit` most-starred repositories.
    pub async fn repositories(&self, user: &User, limit: u32) -> Result<Vec<Repository>> {
        self.cached(user, CacheKind::Repositories { limit }, move || async move {
            let repos = self.github.list_repositories(&user.access_token).await?;
            Ok(rank_repositories(repos, limit as usize))
        })
        .await
    }

    /// Activity by weekday and hour over the user's recent events.
    pub async fn heatmap(&self, user: &User) -> Result<Vec<HeatmapPoint>> {
        self.cached(user, CacheKind::Heatmap, move || async move {
            let events = self
                .github
                .list_events(&user.access_token, &user.login)
                .await?;

            Ok(build_heatmap(
                events
                    .iter()
                    .filter_map(|event| parse_github_timestamp(&event.created_at)),
            ))
        })
        .await
    }

    /// Serve `kind` from the cache, or compute and store it.
    ///
    /// Nothing is written unless `compute` succeeds.
    async fn cached<T, F, Fut>(&self, user: &User, kind: CacheKind, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(payload) = self.db.get_cached(user.id, kind, Utc::now()).await? {
            match serde_json::from_value::<T>(payload) {
                Ok(value) => {
                    tracing::debug!(user_id = user.id, kind = %kind, "Cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = user.id,
                        kind = %kind,
                        error = %e,
                        "Cached payload no longer decodes, recomputing"
                    );
                }
            }
        }

        tracing::info!(user_id = user.id, kind = %kind, "Cache miss, fetching from GitHub");
        let value = compute().await?;

        let payload = serde_json::to_value(&value)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Cache serialize failed: {}", e)))?;
        self.db
            .put_cached(user.id, kind, &payload, self.cache_ttl, Utc::now())
            .await?;

        Ok(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reducers
// ─────────────────────────────────────────────────────────────────────────────

/// Totals over every repository the user can see.
pub fn summarize_stats(repos: &[GitHubRepo], total_commits: u64) -> UserStats {
    repos.iter().fold(
        UserStats {
            total_commits,
            ..UserStats::default()
        },
        |mut stats, repo| {
            stats.total_stars += u64::from(repo.stargazers_count);
            stats.total_forks += u64::from(repo.forks_count);
            if repo.private {
                stats.private_repos += 1;
            } else {
                stats.public_repos += 1;
            }
            stats
        },
    )
}

/// One zero-filled point per UTC day in `[today - (days - 1), today]`.
///
/// Timestamps outside the window are dropped.
pub fn build_contribution_timeline(
    today: NaiveDate,
    days: u32,
    commits: &[DateTime<Utc>],
    pull_requests: &[DateTime<Utc>],
    issues: &[DateTime<Utc>],
) -> Vec<ContributionPoint> {
    if days == 0 {
        return Vec::new();
    }

    let start = today - Duration::days(i64::from(days) - 1);
    let slot = |ts: &DateTime<Utc>| {
        let day = ts.date_naive();
        if day < start || day > today {
            None
        } else {
            usize::try_from((day - start).num_days()).ok()
        }
    };

    // [commits, pull requests, issues] per day
    let mut counts = vec![[0u32; 3]; days as usize];
    for (column, timestamps) in [commits, pull_requests, issues].into_iter().enumerate() {
        for index in timestamps.iter().filter_map(slot) {
            counts[index][column] += 1;
        }
    }

    counts
        .into_iter()
        .zip(start.iter_days())
        .map(|([commits, pull_requests, issues], day)| ContributionPoint {
            date: format_ymd(day),
            commits,
            pull_requests,
            issues,
        })
        .collect()
}

/// Percentages and colours for summed language bytes, largest first.
pub fn build_language_breakdown(totals: HashMap<String, u64>) -> Vec<LanguageBreakdown> {
    let total: u64 = totals.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut languages: Vec<(String, u64)> = totals.into_iter().filter(|(_, b)| *b > 0).collect();
    languages.sort_by(|(a_name, a_bytes), (b_name, b_bytes)| {
        b_bytes.cmp(a_bytes).then_with(|| a_name.cmp(b_name))
    });

    languages
        .into_iter()
        .map(|(language, bytes)| {
            let percentage = (bytes as f64 / total as f64 * 10_000.0).round() / 100.0;
            LanguageBreakdown {
                color: language_color(&language).to_string(),
                language,
                bytes,
                percentage,
            }
        })
        .collect()
}

/// Most-starred first (stable for equal stars), truncated to `limit`.
pub fn rank_repositories(mut repos: Vec<GitHubRepo>, limit: usize) -> Vec<Repository> {
    repos.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
    repos
        .into_iter()
        .take(limit)
        .map(|repo| Repository {
            name: repo.name,
            full_name: repo.full_name,
            description: repo.description,
            html_url: repo.html_url,
            language: repo.language,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            is_private: repo.private,
            updated_at: repo.updated_at.unwrap_or_default(),
        })
        .collect()
}

/// Full 7 x 24 grid (Sunday = 0, UTC hours), ordered by day then hour.
pub fn build_heatmap(timestamps: impl IntoIterator<Item = DateTime<Utc>>) -> Vec<HeatmapPoint> {
    let mut grid = [[0u32; 24]; 7];
    for ts in timestamps {
        grid[ts.weekday().num_days_from_sunday() as usize][ts.hour() as usize] += 1;
    }

    (0u8..7)
        .flat_map(|day| (0u8..24).map(move |hour| (day, hour)))
        .map(|(day, hour)| HeatmapPoint {
            day,
            hour,
            count: grid[day as usize][hour as usize],
        })
        .collect()
}
