//! Cache trait and error types
//!
//! This module defines the narrow interface the crawl engine needs from a
//! page cache, and the associated error type.

use crate::cache::CacheEntry;
use thiserror::Error;

/// Errors that can occur during cache operations
///
/// Every variant is fatal to the crawl that hit it.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache row for {url}: {message}")]
    Corrupt { url: String, message: String },

    #[error("Cache connection poisoned")]
    Poisoned,
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Durable URL → page text store
///
/// Implementations must be safe to share between concurrent fetch tasks;
/// each call is atomic with respect to the others.
pub trait PageCache: Send + Sync {
    /// Returns the cached text for an exact URL match
    fn get(&self, url: &str) -> CacheResult<Option<String>>;

    /// Inserts or replaces the text for a URL
    ///
    /// Calling this repeatedly for the same URL keeps exactly one entry,
    /// holding the most recent text.
    fn put(&self, url: &str, text: &str) -> CacheResult<()>;

    /// Returns the full entry for a URL, including its timestamp
    fn get_entry(&self, url: &str) -> CacheResult<Option<CacheEntry>>;

    /// Counts cached pages
    fn count(&self) -> CacheResult<u64>;

    /// Removes every cached page, returning how many were removed
    fn clear(&self) -> CacheResult<u64>;
}
