//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with error classification
//! - HTML parsing into visible text and links
//! - Global request pacing
//! - Depth-bounded, cache-first crawl coordination

mod engine;
mod fetcher;
mod parser;
mod rate_limiter;

pub use engine::{CrawlEngine, CrawlResult, PageReport};
pub use fetcher::{build_http_client, FetchError, FetchedPage, PageFetcher};
pub use parser::{parse_html, ParsedPage};
pub use rate_limiter::RateLimiter;
