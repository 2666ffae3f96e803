//! Policy gate in front of every page fetch

use crate::config::RobotsPolicy;
use crate::robots::{fetch_robots, ParsedRobots};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Longest `Crawl-delay` honored; larger requests are clamped to this
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

/// Outcome of checking one URL against robots.txt and the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// robots.txt allows the URL
    Allowed,
    /// robots.txt disallows the URL and the policy respects that
    Denied,
    /// robots.txt disallows the URL but the policy is log-only
    DisallowedButPermitted,
}

impl GateDecision {
    /// Returns true if the fetch may go ahead
    pub fn may_fetch(&self) -> bool {
        !matches!(self, Self::Denied)
    }
}

/// robots.txt rules for one site plus the policy that applies them
#[derive(Debug, Clone)]
pub struct RobotsGate {
    robots: ParsedRobots,
    policy: RobotsPolicy,
    user_agent: String,
}

impl RobotsGate {
    /// Creates a gate from already-parsed rules
    pub fn new(robots: ParsedRobots, policy: RobotsPolicy, user_agent: impl Into<String>) -> Self {
        Self {
            robots,
            policy,
            user_agent: user_agent.into(),
        }
    }

    /// Fetches the site's robots.txt and builds a gate from it
    ///
    /// An unavailable robots.txt gives an allow-all gate; this never fails.
    pub async fn load(
        client: &Client,
        site_root: &Url,
        policy: RobotsPolicy,
        user_agent: &str,
    ) -> Self {
        let robots = fetch_robots(client, site_root).await;
        if policy == RobotsPolicy::LogOnly {
            tracing::warn!(
                "robots.txt policy is log-only: disallowed pages on {} will be fetched anyway",
                site_root
            );
        }
        Self::new(robots, policy, user_agent)
    }

    /// Answers whether robots.txt lets `user_agent` fetch `url`
    ///
    /// Pure over the loaded rules; the policy is not consulted.
    pub fn can_fetch(&self, user_agent: &str, url: &str) -> bool {
        self.robots.is_allowed(url, user_agent)
    }

    /// Applies the rules and the policy to `url` for the configured user agent
    pub fn check(&self, url: &str) -> GateDecision {
        if self.can_fetch(&self.user_agent, url) {
            return GateDecision::Allowed;
        }

        match self.policy {
            RobotsPolicy::Respect => {
                tracing::info!("robots.txt disallows {}, skipping", url);
                GateDecision::Denied
            }
            RobotsPolicy::LogOnly => {
                tracing::warn!(
                    "robots.txt disallows {}, fetching anyway (log-only policy)",
                    url
                );
                GateDecision::DisallowedButPermitted
            }
        }
    }

    /// The `Crawl-delay` requested for the configured user agent, if any
    ///
    /// Values above [`MAX_CRAWL_DELAY`], including ones too large for a
    /// `Duration`, are clamped with a warning.
    pub fn crawl_delay(&self) -> Option<Duration> {
        let secs = self.robots.crawl_delay(&self.user_agent)?;
        if secs.is_nan() || secs < 0.0 {
            return None;
        }
        match Duration::try_from_secs_f64(secs) {
            Ok(delay) if delay <= MAX_CRAWL_DELAY => Some(delay),
            _ => {
                tracing::warn!(
                    "robots.txt Crawl-delay of {}s exceeds the {}s cap, using the cap",
                    secs,
                    MAX_CRAWL_DELAY.as_secs()
                );
                Some(MAX_CRAWL_DELAY)
            }
        }
    }

    /// The raw robots.txt text (empty when none was found)
    pub fn raw(&self) -> &str {
        self.robots.content()
    }

    pub fn policy(&self) -> RobotsPolicy {
        self.policy
    }
}
