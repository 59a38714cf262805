// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Cache keys for aggregated analytics.

use std::fmt;

/// Which aggregated view a cache row holds.
///
/// Parameterised kinds carry their parameter as data; it is stored in its
/// own column rather than formatted into the kind name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Stats,
    Languages,
    Heatmap,
    Contributions { days: u32 },
    Repositories { limit: u32 },
}

impl CacheKind {
    /// Column values `(kind, param)` for this key.
    pub fn columns(&self) -> (&'static str, i64) {
        match *self {
            CacheKind::Stats => ("stats", 0),
            CacheKind::Languages => ("languages", 0),
            CacheKind::Heatmap => ("heatmap", 0),
            CacheKind::Contributions { days } => ("contributions", i64::from(days)),
            CacheKind::Repositories { limit } => ("repositories", i64::from(limit)),
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKind::Contributions { days } => write!(f, "contributions(days={days})"),
            CacheKind::Repositories { limit } => write!(f, "repositories(limit={limit})"),
            other => f.write_str(other.columns().0),
        }
    }
}
