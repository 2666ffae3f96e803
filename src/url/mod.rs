//! URL handling module for Site-Sage
//!
//! This module provides URL normalization (the cache key and visited-set
//! identity of a page) and the same-origin check that keeps a crawl on its
//! seed site.

mod normalize;
mod origin;

// Re-export main functions
pub use normalize::normalize_url;
pub use origin::{origin_of, same_origin};
