// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test fixtures: an in-memory database, a fake GitHub API server
//! on a loopback port, and helpers for building requests.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;
use devdash::config::Config;
use devdash::db::Db;
use devdash::middleware::auth::{create_session_token, SESSION_COOKIE};
use devdash::models::User;
use devdash::routes::create_router;
use devdash::AppState;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Access token the fake hands out for [`GOOD_CODE`].
#[allow(dead_code)]
pub const TEST_ACCESS_TOKEN: &str = "gho_test_token";
/// The only authorization code the fake accepts.
#[allow(dead_code)]
pub const GOOD_CODE: &str = "good-code";
#[allow(dead_code)]
pub const TEST_USER_ID: u64 = 583231;
#[allow(dead_code)]
pub const TEST_LOGIN: &str = "octocat";

/// How the fake should fail API calls.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Unauthorized,
    RateLimited,
    ServerError,
}

/// Canned GitHub data served by the fake.
#[derive(Default)]
pub struct FakeGitHub {
    pub repos: Vec<Value>,
    /// `/repos/{owner}/{repo}/languages`, keyed by `owner/repo`
    pub languages: HashMap<String, Value>,
    pub events: Vec<Value>,
    pub commit_dates: Vec<String>,
    pub pr_dates: Vec<String>,
    pub issue_dates: Vec<String>,
    /// Repositories per page (GitHub's is 100)
    pub page_size: usize,
    base_url: String,
    failure: Mutex<Option<Failure>>,
    api_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeGitHub {
    pub fn new() -> Self {
        Self {
            page_size: 100,
            ..Self::default()
        }
    }

    pub fn with_repo(mut self, name: &str, stars: u32, forks: u32, private: bool) -> Self {
        self.repos.push(repo_json(name, stars, forks, private, false));
        self
    }

    pub fn with_fork(mut self, name: &str) -> Self {
        self.repos.push(repo_json(name, 0, 0, false, true));
        self
    }

    pub fn with_languages(mut self, repo: &str, languages: Value) -> Self {
        self.languages
            .insert(format!("{}/{}", TEST_LOGIN, repo), languages);
        self
    }

    pub fn with_events(mut self, created_at: &[&str]) -> Self {
        self.events.extend(
            created_at
                .iter()
                .map(|ts| json!({"id": "1", "type": "PushEvent", "created_at": ts})),
        );
        self
    }

    /// Serve the fake on a loopback port and return it.
    pub async fn spawn(mut self) -> Arc<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake GitHub");
        self.base_url = format!("http://{}", listener.local_addr().unwrap());

        let fake = Arc::new(self);
        let app = Router::new()
            .route("/login/oauth/access_token", post(access_token))
            .route("/user", get(user))
            .route("/user/repos", get(user_repos))
            .route("/repos/{owner}/{repo}/languages", get(languages))
            .route("/users/{login}/events", get(events))
            .route("/search/commits", get(search_commits))
            .route("/search/issues", get(search_issues))
            .with_state(fake.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        fake
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn fail_with(&self, failure: Option<Failure>) {
        *self.failure.lock().unwrap() = failure;
    }

    /// Number of REST/search API requests served (token exchange excluded).
    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::SeqCst)
    }

    /// Count the call, then fail it if a failure mode is set.
    fn enter(&self) -> Result<(), Response> {
        self.api_calls.fetch_add(1, Ordering::SeqCst);

        match *self.failure.lock().unwrap() {
            None => Ok(()),
            Some(Failure::Unauthorized) => Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Bad credentials"})),
            )
                .into_response()),
            Some(Failure::RateLimited) => {
                let reset = (Utc::now().timestamp() + 60).to_string();
                let mut response = (
                    StatusCode::FORBIDDEN,
                    Json(json!({"message": "API rate limit exceeded"})),
                )
                    .into_response();
                let headers = response.headers_mut();
                headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
                headers.insert("x-ratelimit-reset", HeaderValue::from_str(&reset).unwrap());
                Err(response)
            }
            Some(Failure::ServerError) => {
                Err((StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response())
            }
        }
    }
}

fn repo_json(name: &str, stars: u32, forks: u32, private: bool, fork: bool) -> Value {
    json!({
        "id": 1,
        "name": name,
        "full_name": format!("{}/{}", TEST_LOGIN, name),
        "owner": {"login": TEST_LOGIN, "id": TEST_USER_ID},
        "private": private,
        "fork": fork,
        "description": format!("The {} project", name),
        "html_url": format!("https://github.com/{}/{}", TEST_LOGIN, name),
        "language": "Rust",
        "stargazers_count": stars,
        "forks_count": forks,
        "updated_at": "2024-05-01T12:00:00Z",
    })
}

fn profile_json() -> Value {
    json!({
        "id": TEST_USER_ID,
        "login": TEST_LOGIN,
        "name": "The Octocat",
        "email": null,
        "avatar_url": "https://avatars.githubusercontent.com/u/583231",
        "bio": null,
        "company": "@github",
        "location": "San Francisco",
        "blog": "https://github.blog",
        "public_repos": 8,
        "followers": 10,
        "following": 9,
    })
}

async fn access_token(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    // GitHub reports a bad code with 200 OK
    if form.get("code").map(String::as_str) == Some(GOOD_CODE) {
        Json(json!({
            "access_token": TEST_ACCESS_TOKEN,
            "token_type": "bearer",
            "scope": "read:user,repo",
        }))
    } else {
        Json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired.",
        }))
    }
}

async fn user(State(fake): State<Arc<FakeGitHub>>) -> Response {
    if let Err(response) = fake.enter() {
        return response;
    }
    Json(profile_json()).into_response()
}

#[derive(serde::Deserialize)]
struct PageParams {
    page: Option<usize>,
}

async fn user_repos(
    State(fake): State<Arc<FakeGitHub>>,
    Query(params): Query<PageParams>,
) -> Response {
    if let Err(response) = fake.enter() {
        return response;
    }

    let page = params.page.unwrap_or(1).max(1);
    let page_size = fake.page_size.max(1);
    let items: Vec<Value> = fake
        .repos
        .iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .cloned()
        .collect();

    let mut headers = HeaderMap::new();
    if page * page_size < fake.repos.len() {
        let link = format!(
            "<{base}/user/repos?page={next}>; rel=\"next\", <{base}/user/repos?page={last}>; rel=\"last\"",
            base = fake.base_url,
            next = page + 1,
            last = fake.repos.len().div_ceil(page_size),
        );
        headers.insert(header::LINK, HeaderValue::from_str(&link).unwrap());
    }

    (headers, Json(items)).into_response()
}

async fn languages(
    State(fake): State<Arc<FakeGitHub>>,
    Path((owner, repo)): Path<(String, String)>,
) -> Response {
    if let Err(response) = fake.enter() {
        return response;
    }
    let body = fake
        .languages
        .get(&format!("{}/{}", owner, repo))
        .cloned()
        .unwrap_or_else(|| json!({}));
    Json(body).into_response()
}

async fn events(State(fake): State<Arc<FakeGitHub>>, Path(_login): Path<String>) -> Response {
    if let Err(response) = fake.enter() {
        return response;
    }
    Json(fake.events.clone()).into_response()
}

async fn search_commits(State(fake): State<Arc<FakeGitHub>>) -> Response {
    if let Err(response) = fake.enter() {
        return response;
    }
    let items: Vec<Value> = fake
        .commit_dates
        .iter()
        .map(|date| json!({"sha": "abc", "commit": {"committer": {"date": date}}}))
        .collect();
    Json(json!({"total_count": items.len(), "incomplete_results": false, "items": items}))
        .into_response()
}

async fn search_issues(
    State(fake): State<Arc<FakeGitHub>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = fake.enter() {
        return response;
    }
    let query = params.get("q").cloned().unwrap_or_default();
    let dates = if query.contains("type:pr") {
        &fake.pr_dates
    } else {
        &fake.issue_dates
    };
    let items: Vec<Value> = dates
        .iter()
        .map(|date| json!({"number": 1, "created_at": date}))
        .collect();
    Json(json!({"total_count": items.len(), "incomplete_results": false, "items": items}))
        .into_response()
}

// ─── App fixtures ────────────────────────────────────────────

/// Config pointing both GitHub base URLs at the fake.
#[allow(dead_code)]
pub fn test_config(github_base_url: &str) -> Config {
    Config {
        github_api_url: github_base_url.to_string(),
        github_oauth_url: github_base_url.to_string(),
        ..Config::default()
    }
}

/// Create a test app against `config` with a fresh in-memory database.
#[allow(dead_code)]
pub async fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    let db = Db::connect_in_memory()
        .await
        .expect("Failed to open in-memory database");
    let state = Arc::new(AppState::new(config, db).expect("Failed to build app state"));
    (create_router(state.clone()), state)
}

/// Create a test app whose GitHub client talks to `fake`.
#[allow(dead_code)]
pub async fn create_test_app(fake: &FakeGitHub) -> (Router, Arc<AppState>) {
    create_test_app_with_config(test_config(fake.base_url())).await
}

/// Store the octocat user with the fake's access token.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState) -> User {
    let now = Utc::now();
    state
        .db
        .upsert_user(&User {
            id: TEST_USER_ID,
            login: TEST_LOGIN.to_string(),
            name: Some("The Octocat".to_string()),
            email: None,
            avatar_url: None,
            bio: None,
            company: None,
            location: None,
            blog: None,
            public_repos: 8,
            followers: 10,
            following: 9,
            access_token: TEST_ACCESS_TOKEN.to_string(),
            created_at: now,
            last_login_at: now,
        })
        .await
        .expect("Failed to seed user")
}

/// A valid session JWT for `user_id`.
#[allow(dead_code)]
pub fn session_token_for(state: &AppState, user_id: u64) -> String {
    create_session_token(
        user_id,
        &state.config.jwt_signing_key,
        state.config.session_ttl(),
        Utc::now(),
    )
    .unwrap()
}

/// Authenticated GET carrying the session cookie.
#[allow(dead_code)]
pub fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token))
        .body(Body::empty())
        .unwrap()
}

/// Authenticated POST carrying the session cookie.
#[allow(dead_code)]
pub fn authed_post(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token))
        .body(Body::empty())
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
