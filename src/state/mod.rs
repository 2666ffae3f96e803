//! State module for tracking crawl progress
//!
//! `PageState` tracks where each admitted URL is in its lifecycle during one
//! crawl, and rejects impossible transitions.

mod page_state;

pub use page_state::PageState;
