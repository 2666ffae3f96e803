//! Robots.txt handling module
//!
//! This module fetches the seed site's robots.txt once per crawl, parses it,
//! and decides per URL whether a fetch may go ahead under the configured
//! [`RobotsPolicy`](crate::config::RobotsPolicy).

mod gate;
mod parser;

pub use gate::{GateDecision, RobotsGate};
pub use parser::ParsedRobots;

use reqwest::Client;
use url::Url;

/// Fetches and parses robots.txt for the origin of `site_root`
///
/// Never fails: any error (network, non-2xx status, unreadable body) yields
/// an allow-all result, logged as a warning. A 404 is the normal "no rules"
/// case and is logged at info.
///
/// # Arguments
///
/// * `client` - The HTTP client (carries the user agent and timeout)
/// * `site_root` - Any URL on the site; only its origin is used
pub async fn fetch_robots(client: &Client, site_root: &Url) -> ParsedRobots {
    let robots_url = match site_root.join("/robots.txt") {
        Ok(u) => u,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL for {}: {}", site_root, e);
            return ParsedRobots::allow_all();
        }
    };

    tracing::debug!("Fetching robots.txt from: {}", robots_url);

    let response = match client.get(robots_url.clone()).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(
                "robots.txt unavailable at {} ({}), allowing all",
                robots_url,
                e
            );
            return ParsedRobots::allow_all();
        }
    };

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        tracing::info!("No robots.txt at {}, allowing all", robots_url);
        return ParsedRobots::allow_all();
    }
    if !status.is_success() {
        tracing::warn!(
            "robots.txt at {} returned HTTP {}, allowing all",
            robots_url,
            status.as_u16()
        );
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            tracing::info!(
                "Fetched robots.txt for {} ({} bytes)",
                crate::url::origin_of(site_root),
                body.len()
            );
            ParsedRobots::from_content(&body)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to read robots.txt body from {} ({}), allowing all",
                robots_url,
                e
            );
            ParsedRobots::allow_all()
        }
    }
}
