// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is read first if present, so local development can keep
//! the GitHub OAuth credentials out of the shell environment.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- GitHub OAuth ---
    /// GitHub OAuth app client ID (public)
    pub github_client_id: String,
    /// GitHub OAuth app client secret
    pub github_client_secret: String,
    /// Callback URL registered with the OAuth app
    pub github_redirect_uri: String,
    /// Requested OAuth scopes
    pub github_scopes: Vec<String>,
    /// REST API base URL
    pub github_api_url: String,
    /// OAuth base URL (authorize + token exchange)
    pub github_oauth_url: String,

    // --- Service ---
    /// Frontend URL for CORS and post-login redirects
    pub frontend_url: String,
    /// SQLite connection string
    pub database_url: String,
    /// Server port
    pub port: u16,
    /// How long aggregated analytics stay fresh
    pub cache_ttl_seconds: i64,
    /// Session cookie / JWT lifetime
    pub session_ttl_minutes: i64,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
}

const DEFAULT_SCOPES: &str = "read:user user:email repo";
const DEFAULT_CACHE_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;
const MAX_CACHE_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;
const MAX_SESSION_TTL_MINUTES: i64 = 7 * 24 * 60;

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            github_client_id: "test_client_id".to_string(),
            github_client_secret: "test_secret".to_string(),
            github_redirect_uri: "http://localhost:8080/auth/callback".to_string(),
            github_scopes: parse_scopes(DEFAULT_SCOPES),
            github_api_url: "https://api.github.com".to_string(),
            github_oauth_url: "https://github.com".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            database_url: "sqlite::memory:".to_string(),
            port: 8080,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_signing_key = required("JWT_SIGNING_KEY")?.into_bytes();
        let oauth_state_key = env::var("OAUTH_STATE_KEY")
            .map(String::into_bytes)
            .unwrap_or_else(|_| jwt_signing_key.clone());

        Ok(Self {
            github_client_id: required("GITHUB_CLIENT_ID")?,
            github_client_secret: required("GITHUB_CLIENT_SECRET")?,
            github_redirect_uri: env::var("GITHUB_REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:8080/auth/callback".to_string()),
            github_scopes: parse_scopes(
                &env::var("GITHUB_SCOPES").unwrap_or_else(|_| DEFAULT_SCOPES.to_string()),
            ),
            github_api_url: env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            github_oauth_url: env::var("GITHUB_OAUTH_URL")
                .unwrap_or_else(|_| "https://github.com".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://devdash.db".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            cache_ttl_seconds: parse_bounded(
                "CACHE_TTL_SECONDS",
                DEFAULT_CACHE_TTL_SECONDS,
                MAX_CACHE_TTL_SECONDS,
            )?,
            session_ttl_minutes: parse_bounded(
                "SESSION_TTL_MINUTES",
                DEFAULT_SESSION_TTL_MINUTES,
                MAX_SESSION_TTL_MINUTES,
            )?,
            jwt_signing_key,
            oauth_state_key,
        })
    }

    /// Cookies carry `Secure` only when the frontend is served over HTTPS.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_seconds)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_ttl_minutes)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

fn parse_bounded(name: &'static str, default: i64, max: i64) -> Result<i64, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => bounded(name, raw, max),
    }
}

/// Accepts `1..=max`; anything else is reported against `name`.
fn bounded(name: &'static str, raw: String, max: i64) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(value) if (1..=max).contains(&value) => Ok(value),
        _ => Err(ConfigError::Invalid(name, raw)),
    }
}

fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ' ' || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
