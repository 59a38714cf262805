// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub API client for OAuth, profile, repository and activity data.
//!
//! Handles:
//! - OAuth authorization URL and code exchange
//! - `Link: rel="next"` pagination, followed to completion (with page caps)
//! - Search API totals and timestamps for commits, PRs and issues
//! - Failure classification (token rejected / rate limited / other)

use crate::config::Config;
use crate::error::AppError;
use crate::time_utils::{format_ymd, parse_github_timestamp};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, LINK, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("devdash/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT_SECS: u64 = 30;
const PER_PAGE: u32 = 100;

/// Safety cap on repository pages (5000 repositories).
const MAX_REPO_PAGES: usize = 50;
/// GitHub keeps at most 300 events per user.
const MAX_EVENT_PAGES: usize = 3;
/// The search API stops at 1000 results.
const MAX_SEARCH_PAGES: usize = 10;

/// Inclusive range of UTC calendar days for search qualifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl DateWindow {
    /// The `days` calendar days ending with (and including) `today`.
    pub fn last_days(today: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self {
            since: today - Duration::days(span),
            until: today,
        }
    }

    fn qualifier(&self) -> String {
        format!("{}..{}", format_ymd(self.since), format_ymd(self.until))
    }
}

/// Which search-issues result type to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    PullRequest,
    Issue,
}

impl IssueKind {
    fn qualifier(self) -> &'static str {
        match self {
            IssueKind::PullRequest => "pr",
            IssueKind::Issue => "issue",
        }
    }
}

/// GitHub API client.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
}

impl GitHubClient {
    /// Create a new GitHub client from the OAuth app configuration.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static(API_VERSION),
        );

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.github_api_url.trim_end_matches('/').to_string(),
            oauth_url: config.github_oauth_url.trim_end_matches('/').to_string(),
            client_id: config.github_client_id.clone(),
            client_secret: config.github_client_secret.clone(),
            redirect_uri: config.github_redirect_uri.clone(),
            scopes: config.github_scopes.clone(),
        })
    }

    // ─── OAuth ───────────────────────────────────────────────────────────────

    /// URL to send the browser to for authorization.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/login/oauth/authorize?\
             client_id={}&\
             redirect_uri={}&\
             scope={}&\
             state={}",
            self.oauth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&self.scopes.join(" ")),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for an access token.
    ///
    /// GitHub answers a bad or expired code with HTTP 200 and an `error`
    /// field, so both that and non-2xx statuses are login failures.
    pub async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let response = self
            .http
            .post(format!("{}/login/oauth/access_token", self.oauth_url))
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::LoginFailed(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "GitHub token exchange failed");
            return Err(AppError::LoginFailed(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        let token: TokenExchangeResponse = response
            .json()
            .await
            .map_err(|e| AppError::LoginFailed(format!("Failed to parse token response: {}", e)))?;

        match token {
            TokenExchangeResponse {
                access_token: Some(access_token),
                ..
            } if !access_token.is_empty() => Ok(access_token),
            TokenExchangeResponse {
                error,
                error_description,
                ..
            } => {
                let reason = error_description
                    .or(error)
                    .unwrap_or_else(|| "no access token in response".to_string());
                tracing::warn!(reason = %reason, "GitHub rejected authorization code");
                Err(AppError::LoginFailed(reason))
            }
        }
    }

    // ─── REST Endpoints ──────────────────────────────────────────────────────

    /// Get the authenticated user's profile.
    pub async fn get_user(&self, access_token: &str) -> Result<GitHubUser, AppError> {
        let url = format!("{}/user", self.api_url);
        let response = self.send(self.http.get(&url).bearer_auth(access_token)).await?;
        decode_json(response).await
    }

    /// All repositories the user owns, collaborates on, or sees through an org.
    pub async fn list_repositories(
        &self,
        access_token: &str,
    ) -> Result<Vec<GitHubRepo>, AppError> {
        let url = format!("{}/user/repos", self.api_url);
        let query = [
            ("per_page", PER_PAGE.to_string()),
            ("visibility", "all".to_string()),
            (
                "affiliation",
                "owner,collaborator,organization_member".to_string(),
            ),
            ("sort", "updated".to_string()),
        ];

        let pages: Vec<Vec<GitHubRepo>> = self
            .fetch_pages(access_token, &url, &query, MAX_REPO_PAGES)
            .await?;
        let repos: Vec<GitHubRepo> = pages.into_iter().flatten().collect();

        tracing::debug!(count = repos.len(), "Fetched repositories");
        Ok(repos)
    }

    /// Bytes of code per language, as attributed by GitHub.
    pub async fn repository_languages(
        &self,
        access_token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<HashMap<String, u64>, AppError> {
        let url = format!(
            "{}/repos/{}/{}/languages",
            self.api_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        let response = self.send(self.http.get(&url).bearer_auth(access_token)).await?;
        decode_json(response).await
    }

    /// The user's recent events (at most 300, at most 90 days old).
    pub async fn list_events(
        &self,
        access_token: &str,
        login: &str,
    ) -> Result<Vec<GitHubEvent>, AppError> {
        let url = format!("{}/users/{}/events", self.api_url, urlencoding::encode(login));
        let query = [("per_page", PER_PAGE.to_string())];

        let pages: Vec<Vec<GitHubEvent>> = self
            .fetch_pages(access_token, &url, &query, MAX_EVENT_PAGES)
            .await?;
        Ok(pages.into_iter().flatten().collect())
    }

    // ─── Search API ──────────────────────────────────────────────────────────

    /// Number of commits authored by `login` in the window.
    pub async fn count_commits(
        &self,
        access_token: &str,
        login: &str,
        window: &DateWindow,
    ) -> Result<u64, AppError> {
        let url = format!("{}/search/commits", self.api_url);
        let query = [
            ("q", commit_query(login, window)),
            ("per_page", "1".to_string()),
        ];

        let pages: Vec<SearchPage<CommitItem>> =
            self.fetch_pages(access_token, &url, &query, 1).await?;
        Ok(pages.first().map(|p| p.total_count).unwrap_or(0))
    }

    /// Committer timestamps of commits authored by `login` in the window.
    pub async fn search_commits(
        &self,
        access_token: &str,
        login: &str,
        window: &DateWindow,
    ) -> Result<Vec<DateTime<Utc>>, AppError> {
        let url = format!("{}/search/commits", self.api_url);
        let query = [
            ("q", commit_query(login, window)),
            ("per_page", PER_PAGE.to_string()),
            ("sort", "committer-date".to_string()),
            ("order", "asc".to_string()),
        ];

        let pages: Vec<SearchPage<CommitItem>> = self
            .fetch_pages(access_token, &url, &query, MAX_SEARCH_PAGES)
            .await?;

        Ok(pages
            .into_iter()
            .flat_map(|p| p.items)
            .filter_map(|item| item.commit.committer?.date)
            .filter_map(|date| parse_github_timestamp(&date))
            .collect())
    }

    /// Creation timestamps of PRs or issues opened by `login` in the window.
    pub async fn search_issues(
        &self,
        access_token: &str,
        login: &str,
        kind: IssueKind,
        window: &DateWindow,
    ) -> Result<Vec<DateTime<Utc>>, AppError> {
        let url = format!("{}/search/issues", self.api_url);
        let query = [
            (
                "q",
                format!(
                    "author:{} type:{} created:{}",
                    login,
                    kind.qualifier(),
                    window.qualifier()
                ),
            ),
            ("per_page", PER_PAGE.to_string()),
        ];

        let pages: Vec<SearchPage<IssueItem>> = self
            .fetch_pages(access_token, &url, &query, MAX_SEARCH_PAGES)
            .await?;

        Ok(pages
            .into_iter()
            .flat_map(|p| p.items)
            .filter_map(|item| parse_github_timestamp(&item.created_at))
            .collect())
    }

    // ─── Plumbing ────────────────────────────────────────────────────────────

    /// GET `url` and every `rel="next"` page after it, up to `max_pages`.
    async fn fetch_pages<P: DeserializeOwned>(
        &self,
        access_token: &str,
        url: &str,
        query: &[(&str, String)],
        max_pages: usize,
    ) -> Result<Vec<P>, AppError> {
        let mut pages = Vec::new();
        let mut request = self.http.get(url).query(query);

        loop {
            let response = self.send(request.bearer_auth(access_token)).await?;
            let next = next_page_url(response.headers());
            pages.push(decode_json(response).await?);

            match next {
                Some(next_url) if pages.len() < max_pages => {
                    request = self.http.get(next_url);
                }
                Some(_) => {
                    tracing::debug!(url, max_pages, "Stopping pagination at page cap");
                    break;
                }
                None => break,
            }
        }

        Ok(pages)
    }

    /// Send a request and turn non-2xx responses into typed errors.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, AppError> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &headers, &body, Utc::now()))
    }
}

fn commit_query(login: &str, window: &DateWindow) -> String {
    format!("author:{} committer-date:{}", login, window.qualifier())
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AppError> {
    response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("JSON parse error: {}", e)))
}

/// Map a failed GitHub response to an [`AppError`].
pub fn classify_failure(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    now: DateTime<Utc>,
) -> AppError {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if status == StatusCode::UNAUTHORIZED {
        return AppError::UpstreamAuth;
    }

    let exhausted = header("x-ratelimit-remaining") == Some("0");
    let retry_after_header = header(RETRY_AFTER.as_str()).and_then(|v| v.trim().parse::<u64>().ok());

    if status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && (exhausted || retry_after_header.is_some()))
    {
        let retry_after = retry_after_header.or_else(|| {
            header("x-ratelimit-reset")
                .and_then(|v| v.trim().parse::<i64>().ok())
                .map(|reset| u64::try_from(reset - now.timestamp()).unwrap_or(0))
        });
        tracing::warn!(status = %status, retry_after = ?retry_after, "GitHub rate limit hit");
        return AppError::UpstreamRateLimited { retry_after };
    }

    tracing::debug!(status = %status, body = %body, "GitHub request failed");
    AppError::Upstream(format!("HTTP {}", status))
}

/// Pull the `rel="next"` URL out of a response's `Link` header.
fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    parse_link_header(link).remove("next")
}

/// Parse `<url>; rel="next", <url>; rel="last"` into `{rel: url}`.
pub fn parse_link_header(value: &str) -> HashMap<String, String> {
    value
        .split(',')
        .filter_map(|part| {
            let mut segments = part.split(';');
            let url = segments
                .next()?
                .trim()
                .strip_prefix('<')?
                .strip_suffix('>')?;
            let rel = segments
                .map(str::trim)
                .find_map(|s| s.strip_prefix("rel="))?
                .trim_matches('"');
            Some((rel.to_string(), url.to_string()))
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Response types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Authenticated user profile (`GET /user`).
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub id: u64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub blog: Option<String>,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
}

/// Repository from `GET /user/repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub fork: bool,
    pub updated_at: Option<String>,
    pub owner: GitHubOwner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
}

/// Event from the user's activity feed.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubEvent {
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
struct SearchPage<T> {
    #[serde(default)]
    total_count: u64,
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: Option<GitActor>,
}

#[derive(Debug, Deserialize)]
struct GitActor {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IssueItem {
    created_at: String,
}
