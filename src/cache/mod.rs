//! Page cache module
//!
//! This module persists the extracted text of every fetched page, keyed by
//! normalized URL, so later crawls can skip the network for pages already
//! seen. It handles:
//! - SQLite database initialization and schema management
//! - Upsert-by-URL writes with a refreshed timestamp
//! - Exact-URL lookups

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteCache;
pub use traits::{CacheError, CacheResult, PageCache};

use chrono::{DateTime, Utc};

/// One cached page
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub url: String,
    pub text: String,
    pub last_updated: DateTime<Utc>,
}
