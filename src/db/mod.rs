//! Database layer (SQLite via sqlx).

pub mod sqlite;

pub use sqlite::Db;

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
    /// Aggregated analytics, keyed by (user_id, kind, param)
    pub const CACHE_ENTRIES: &str = "cache_entries";
}
