// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite-backed storage with typed operations.
//!
//! Provides high-level operations for:
//! - Users (GitHub profile + access token)
//! - Cache entries (aggregated analytics with an expiry)

use crate::db::tables;
use crate::error::AppError;
use crate::models::{CacheKind, User};
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

const MAX_CONNECTIONS: u32 = 5;

/// Database client.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

/// Row shape of the `users` table.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
    bio: Option<String>,
    company: Option<String>,
    location: Option<String>,
    blog: Option<String>,
    public_repos: i64,
    followers: i64,
    following: i64,
    access_token: String,
    created_at: DateTime<Utc>,
    last_login_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let count = |value: i64| u32::try_from(value).unwrap_or(0);

        Ok(User {
            id: u64::try_from(row.id)
                .map_err(|_| AppError::Database(format!("Invalid user id {}", row.id)))?,
            login: row.login,
            name: row.name,
            email: row.email,
            avatar_url: row.avatar_url,
            bio: row.bio,
            company: row.company,
            location: row.location,
            blog: row.blog,
            public_repos: count(row.public_repos),
            followers: count(row.followers),
            following: count(row.following),
            access_token: row.access_token,
            created_at: row.created_at,
            last_login_at: row.last_login_at,
        })
    }
}

fn db_id(user_id: u64) -> Result<i64, AppError> {
    i64::try_from(user_id)
        .map_err(|_| AppError::Database(format!("User id {} out of range", user_id)))
}

fn schema() -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {users} (
            id            INTEGER PRIMARY KEY,
            login         TEXT    NOT NULL,
            name          TEXT,
            email         TEXT,
            avatar_url    TEXT,
            bio           TEXT,
            company       TEXT,
            location      TEXT,
            blog          TEXT,
            public_repos  INTEGER NOT NULL DEFAULT 0,
            followers     INTEGER NOT NULL DEFAULT 0,
            following     INTEGER NOT NULL DEFAULT 0,
            access_token  TEXT    NOT NULL,
            created_at    TEXT    NOT NULL,
            last_login_at TEXT    NOT NULL
        );

        CREATE TABLE IF NOT EXISTS {cache} (
            user_id    INTEGER NOT NULL REFERENCES {users}(id) ON DELETE CASCADE,
            kind       TEXT    NOT NULL,
            param      INTEGER NOT NULL DEFAULT 0,
            payload    TEXT    NOT NULL,
            expires_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, kind, param)
        );

        CREATE INDEX IF NOT EXISTS idx_{cache}_expires_at ON {cache}(expires_at);
        "#,
        users = tables::USERS,
        cache = tables::CACHE_ENTRIES,
    )
}

impl Db {
    /// Connect to the database at `url`, creating the file if needed.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Database(format!("Invalid DATABASE_URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        tracing::info!(url = url, "Connected to database");

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Private in-memory database, for tests and local experiments.
    ///
    /// Uses a single connection that is never recycled, because each SQLite
    /// in-memory connection is its own database.
    pub async fn connect_in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::Database(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<std::time::Duration>)
            .max_lifetime(None::<std::time::Duration>)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Create tables if they don't exist yet.
    async fn migrate(&self) -> Result<(), AppError> {
        let ddl = schema();
        sqlx::raw_sql(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by their GitHub user ID.
    pub async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT * FROM {} WHERE id = ?1", tables::USERS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(db_id(user_id)?)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Create or update a user, returning the stored record.
    ///
    /// `created_at` is only written on first insert.
    pub async fn upsert_user(&self, user: &User) -> Result<User, AppError> {
        let sql = format!(
            r#"
            INSERT INTO {users} (
                id, login, name, email, avatar_url, bio, company, location, blog,
                public_repos, followers, following, access_token, created_at, last_login_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(id) DO UPDATE SET
                login         = excluded.login,
                name          = excluded.name,
                email         = excluded.email,
                avatar_url    = excluded.avatar_url,
                bio           = excluded.bio,
                company       = excluded.company,
                location      = excluded.location,
                blog          = excluded.blog,
                public_repos  = excluded.public_repos,
                followers     = excluded.followers,
                following     = excluded.following,
                access_token  = excluded.access_token,
                last_login_at = excluded.last_login_at
            RETURNING *
            "#,
            users = tables::USERS
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(db_id(user.id)?)
            .bind(&user.login)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.avatar_url)
            .bind(&user.bio)
            .bind(&user.company)
            .bind(&user.location)
            .bind(&user.blog)
            .bind(i64::from(user.public_repos))
            .bind(i64::from(user.followers))
            .bind(i64::from(user.following))
            .bind(&user.access_token)
            .bind(user.created_at)
            .bind(user.last_login_at)
            .fetch_one(&self.pool)
            .await?;

        User::try_from(row)
    }

    // ─── Cache Operations ────────────────────────────────────────

    /// Get a cached payload if present and not expired at `now`.
    ///
    /// Expired rows read as a miss and are left for the next write to
    /// overwrite (or for [`Db::purge_expired`]).
    pub async fn get_cached(
        &self,
        user_id: u64,
        kind: CacheKind,
        now: DateTime<Utc>,
    ) -> Result<Option<serde_json::Value>, AppError> {
        let (kind_name, param) = kind.columns();
        let sql = format!(
            "SELECT payload, expires_at FROM {} WHERE user_id = ?1 AND kind = ?2 AND param = ?3",
            tables::CACHE_ENTRIES
        );

        let row: Option<(String, i64)> = sqlx::query_as(&sql)
            .bind(db_id(user_id)?)
            .bind(kind_name)
            .bind(param)
            .fetch_optional(&self.pool)
            .await?;

        let Some((payload, expires_at)) = row else {
            return Ok(None);
        };

        if now.timestamp_millis() > expires_at {
            tracing::debug!(user_id, kind = %kind, "Cache entry expired");
            return Ok(None);
        }

        match serde_json::from_str(&payload) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(
                    user_id,
                    kind = %kind,
                    error = %e,
                    "Corrupt cache payload, treating as miss"
                );
                Ok(None)
            }
        }
    }

    /// Store a payload, replacing any existing entry for the same key.
    pub async fn put_cached(
        &self,
        user_id: u64,
        kind: CacheKind,
        payload: &serde_json::Value,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let (kind_name, param) = kind.columns();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Cache TTL out of range: {}", ttl)))?
            .timestamp_millis();
        let body = serde_json::to_string(payload)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Cache serialize failed: {}", e)))?;

        let sql = format!(
            r#"
            INSERT INTO {} (user_id, kind, param, payload, expires_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id, kind, param) DO UPDATE SET
                payload    = excluded.payload,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
            tables::CACHE_ENTRIES
        );

        sqlx::query(&sql)
            .bind(db_id(user_id)?)
            .bind(kind_name)
            .bind(param)
            .bind(body)
            .bind(expires_at)
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete every cache entry for a user. Returns the number removed.
    pub async fn invalidate_user_cache(&self, user_id: u64) -> Result<u64, AppError> {
        let sql = format!("DELETE FROM {} WHERE user_id = ?1", tables::CACHE_ENTRIES);
        let result = sqlx::query(&sql)
            .bind(db_id(user_id)?)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete all entries that expired before `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let sql = format!("DELETE FROM {} WHERE expires_at < ?1", tables::CACHE_ENTRIES);
        let result = sqlx::query(&sql)
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
