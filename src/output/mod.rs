//! Output module for crawl and cache reports
//!
//! This module handles:
//! - Summarizing a finished crawl by page state
//! - Reporting what the page cache holds

pub mod stats;

pub use stats::{
    load_cache_statistics, print_cache_statistics, print_statistics, CacheStatistics,
    CrawlStatistics,
};
