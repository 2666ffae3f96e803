//! Statistics for a finished crawl and for the page cache
//!
//! This module provides functionality for summarizing a [`CrawlResult`] and
//! the cache contents, and for printing both for the CLI.

use crate::cache::PageCache;
use crate::crawler::CrawlResult;
use crate::state::PageState;
use crate::SageError;
use std::collections::BTreeMap;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    /// Total number of pages admitted to the crawl
    pub total_pages: u64,

    /// Count of pages by final state
    pub pages_by_state: BTreeMap<PageState, u64>,

    /// Deepest depth reached
    pub max_depth_reached: u32,

    /// Length of the aggregated text, in characters
    pub text_chars: u64,

    pub timed_out: bool,
}

impl CrawlStatistics {
    /// Summarizes a crawl result
    pub fn from_result(result: &CrawlResult) -> Self {
        let mut pages_by_state = BTreeMap::new();
        for page in &result.pages {
            *pages_by_state.entry(page.state).or_insert(0) += 1;
        }

        Self {
            total_pages: result.pages.len() as u64,
            pages_by_state,
            max_depth_reached: result.pages.iter().map(|p| p.depth).max().unwrap_or(0),
            text_chars: result.text.chars().count() as u64,
            timed_out: result.timed_out,
        }
    }

    /// Number of pages that ended in `state`
    pub fn count(&self, state: PageState) -> u64 {
        self.pages_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Share of pages that contributed text, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        let succeeded: u64 = self
            .pages_by_state
            .iter()
            .filter(|(state, _)| state.is_success())
            .map(|(_, count)| count)
            .sum();
        (succeeded as f64 / self.total_pages as f64) * 100.0
    }
}

/// Page cache summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatistics {
    pub database_path: String,
    pub cached_pages: u64,
}

/// Loads statistics from the page cache
pub fn load_cache_statistics(
    cache: &dyn PageCache,
    database_path: &str,
) -> Result<CacheStatistics, SageError> {
    Ok(CacheStatistics {
        database_path: database_path.to_string(),
        cached_pages: cache.count()?,
    })
}

/// Prints crawl statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages visited: {}", stats.total_pages);
    println!("  Deepest level: {}", stats.max_depth_reached);
    println!("  Text extracted: {} chars", stats.text_chars);
    if stats.timed_out {
        println!("  Crawl hit its deadline; results are partial");
    }
    println!();

    println!("Pages by State:");
    let mut state_counts: Vec<_> = stats.pages_by_state.iter().collect();
    state_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (state, count) in state_counts {
        let percentage = if stats.total_pages > 0 {
            (*count as f64 / stats.total_pages as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} cached, {} fetched, {} pages total)",
        stats.success_rate(),
        stats.count(PageState::Cached),
        stats.count(PageState::Processed),
        stats.total_pages
    );
}

/// Prints cache statistics to stdout
pub fn print_cache_statistics(stats: &CacheStatistics) {
    println!("=== Page Cache ===\n");
    println!("  Database: {}", stats.database_path);
    println!("  Cached pages: {}", stats.cached_pages);
}
