// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub OAuth login flow.

use crate::config::Config;
use crate::db::Db;
use crate::error::{AppError, Result};
use crate::middleware::auth::create_session_token;
use crate::models::User;
use crate::services::github::{GitHubClient, GitHubUser};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// How long a signed OAuth `state` stays valid.
pub const STATE_MAX_AGE_MINUTES: i64 = 10;

/// Starts and completes GitHub logins.
#[derive(Clone)]
pub struct AuthService {
    db: Db,
    github: GitHubClient,
    jwt_signing_key: Vec<u8>,
    oauth_state_key: Vec<u8>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(config: &Config, db: Db, github: GitHubClient) -> Self {
        Self {
            db,
            github,
            jwt_signing_key: config.jwt_signing_key.clone(),
            oauth_state_key: config.oauth_state_key.clone(),
            session_ttl: config.session_ttl(),
        }
    }

    /// GitHub authorization URL carrying a freshly signed `state`.
    pub fn begin_login(&self) -> Result<String> {
        let oauth_state = sign_state(&self.oauth_state_key, Utc::now())?;
        Ok(self.github.authorize_url(&oauth_state))
    }

    /// Verify `state`, exchange `code`, store the user and return a session token.
    pub async fn complete_login(&self, code: &str, oauth_state: &str) -> Result<String> {
        if !verify_state(oauth_state, &self.oauth_state_key, Utc::now()) {
            tracing::warn!("Invalid or expired OAuth state parameter");
            return Err(AppError::LoginFailed(
                "Invalid or expired OAuth state".to_string(),
            ));
        }

        tracing::info!("Exchanging authorization code for access token");
        let access_token = self.github.exchange_code(code).await?;

        let profile = self.github.get_user(&access_token).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch GitHub profile after token exchange");
            AppError::LoginFailed(format!("Could not fetch GitHub profile: {}", e))
        })?;

        let now = Utc::now();
        let user = self
            .db
            .upsert_user(&user_from_profile(profile, access_token, now))
            .await?;

        let session_token =
            create_session_token(user.id, &self.jwt_signing_key, self.session_ttl, now)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

        tracing::info!(user_id = user.id, login = %user.login, "Login successful");

        Ok(session_token)
    }
}

fn user_from_profile(profile: GitHubUser, access_token: String, now: DateTime<Utc>) -> User {
    User {
        id: profile.id,
        login: profile.login,
        name: profile.name,
        email: profile.email,
        avatar_url: profile.avatar_url,
        bio: profile.bio,
        company: profile.company,
        location: profile.location,
        blog: profile.blog,
        public_repos: profile.public_repos,
        followers: profile.followers,
        following: profile.following,
        access_token,
        created_at: now,
        last_login_at: now,
    }
}

// ─── OAuth State ─────────────────────────────────────────────

/// Sign the current time: base64url(`{timestamp_ms_hex}|{hmac_hex}`).
pub fn sign_state(key: &[u8], now: DateTime<Utc>) -> Result<String> {
    let payload = format!("{:x}", now.timestamp_millis());

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Check the signature and age of a `state` produced by [`sign_state`].
pub fn verify_state(state: &str, key: &[u8], now: DateTime<Utc>) -> bool {
    let Some((timestamp_hex, signature_hex)) = URL_SAFE_NO_PAD
        .decode(state)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|decoded| {
            decoded
                .split_once('|')
                .map(|(ts, sig)| (ts.to_string(), sig.to_string()))
        })
    else {
        return false;
    };

    let Ok(signature) = hex::decode(&signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(timestamp_hex.as_bytes());
    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    let Ok(issued_ms) = i64::from_str_radix(&timestamp_hex, 16) else {
        return false;
    };
    let age_ms = now.timestamp_millis() - issued_ms;
    (0..=Duration::minutes(STATE_MAX_AGE_MINUTES).num_milliseconds()).contains(&age_ms)
}
