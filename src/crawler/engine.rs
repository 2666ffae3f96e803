//! Crawl engine - depth-bounded, same-origin traversal
//!
//! A single coordinating loop owns every piece of per-crawl state: the
//! visited set, the frontier and the page records. Fetches run as tasks in a
//! [`JoinSet`], never more than `max-concurrent-fetches` at once, and every
//! request first takes a slot from the origin's shared [`RateLimiter`].
//!
//! Per URL the order is: cache lookup, robots.txt gate, rate-limiter slot,
//! fetch (with bounded retry), cache write-through, link expansion.
//!
//! Pages whose fetch ends on another origin are dropped. The one exception
//! is the seed: if it redirects off-site, the crawl moves to the redirect
//! target and that target's origin bounds the rest of the crawl.

use crate::cache::PageCache;
use crate::config::{CrawlerConfig, RobotsPolicy};
use crate::crawler::fetcher::{FetchError, FetchedPage, PageFetcher};
use crate::crawler::rate_limiter::RateLimiter;
use crate::robots::RobotsGate;
use crate::state::PageState;
use crate::url::{normalize_url, origin_of, same_origin};
use crate::SageError;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;
use url::Url;

/// Outcome of one page in a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub url: String,
    pub depth: u32,
    pub state: PageState,
}

/// Everything a crawl produced
#[derive(Debug, Clone, Default)]
pub struct CrawlResult {
    /// Page texts in discovery pre-order, joined with single spaces
    pub text: String,
    /// Every admitted URL, in admission order
    pub visited: Vec<String>,
    /// Final state of every admitted page, in admission order
    pub pages: Vec<PageReport>,
    /// True if the deadline expired before the frontier was exhausted
    pub timed_out: bool,
}

impl CrawlResult {
    /// Returns true if no page contributed any text
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Counts pages that ended in `state`
    pub fn count(&self, state: PageState) -> usize {
        self.pages.iter().filter(|p| p.state == state).count()
    }
}

/// Crawl tuning, taken from `[crawler]`
#[derive(Debug, Clone)]
struct CrawlSettings {
    seed_url: String,
    max_depth: u32,
    max_concurrent_fetches: usize,
    crawl_delay: Duration,
    crawl_timeout: Option<Duration>,
    max_retries: u32,
    retry_backoff: Duration,
    robots_policy: RobotsPolicy,
}

impl From<&CrawlerConfig> for CrawlSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            seed_url: config.seed_url.clone(),
            max_depth: config.max_depth,
            max_concurrent_fetches: config.max_concurrent_fetches.max(1) as usize,
            crawl_delay: Duration::from_millis(config.crawl_delay_ms),
            crawl_timeout: (config.crawl_timeout_secs > 0)
                .then(|| Duration::from_secs(config.crawl_timeout_secs)),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            robots_policy: config.robots_policy,
        }
    }
}

/// Politeness state for one origin, shared by every crawl of that origin
#[derive(Debug)]
struct SitePoliteness {
    gate: RobotsGate,
    limiter: Arc<RateLimiter>,
}

/// One admitted page during a crawl
#[derive(Debug)]
struct PageRecord {
    url: Url,
    depth: u32,
    state: PageState,
    text: String,
    children: Vec<usize>,
}

type FetchOutcome = (usize, Result<FetchedPage, FetchError>);

/// Crawls one site at a time, consulting the page cache first
pub struct CrawlEngine {
    settings: CrawlSettings,
    user_agent: String,
    fetcher: PageFetcher,
    cache: Arc<dyn PageCache>,
    sites: Mutex<HashMap<String, Arc<SitePoliteness>>>,
}

impl CrawlEngine {
    /// Creates an engine
    ///
    /// # Arguments
    ///
    /// * `config` - Crawler settings (seed, depth, pacing, retries)
    /// * `user_agent` - Agent name matched against robots.txt groups
    /// * `fetcher` - Page fetcher; its client also loads robots.txt
    /// * `cache` - Shared page cache
    pub fn new(
        config: &CrawlerConfig,
        user_agent: impl Into<String>,
        fetcher: PageFetcher,
        cache: Arc<dyn PageCache>,
    ) -> Self {
        Self {
            settings: CrawlSettings::from(config),
            user_agent: user_agent.into(),
            fetcher,
            cache,
            sites: Mutex::new(HashMap::new()),
        }
    }

    pub fn fetcher(&self) -> &PageFetcher {
        &self.fetcher
    }

    pub fn cache(&self) -> &Arc<dyn PageCache> {
        &self.cache
    }

    /// The configured seed URL
    pub fn seed_url(&self) -> &str {
        &self.settings.seed_url
    }

    /// Crawls the configured seed to the configured depth, within the
    /// configured crawl timeout
    pub async fn crawl_site(&self) -> Result<CrawlResult, SageError> {
        self.crawl(&self.settings.seed_url, self.settings.max_depth)
            .await
    }

    /// Crawls `seed` to `max_depth`, within the configured crawl timeout
    pub async fn crawl(&self, seed: &str, max_depth: u32) -> Result<CrawlResult, SageError> {
        let deadline = self.settings.crawl_timeout.map(|t| Instant::now() + t);
        self.crawl_until(seed, max_depth, deadline).await
    }

    /// The robots.txt text that applies to `seed` (empty if none)
    pub async fn robots_txt(&self, seed: &str) -> Result<String, SageError> {
        let seed = normalize_url(seed)?;
        Ok(self.site(&seed).await.gate.raw().to_string())
    }

    /// Returns the politeness state for the origin of `url`, loading
    /// robots.txt on first use
    async fn site(&self, url: &Url) -> Arc<SitePoliteness> {
        let origin = origin_of(url);
        let mut sites = self.sites.lock().await;
        if let Some(site) = sites.get(&origin) {
            return Arc::clone(site);
        }

        let gate = RobotsGate::load(
            self.fetcher.client(),
            url,
            self.settings.robots_policy,
            &self.user_agent,
        )
        .await;

        let interval = match gate.crawl_delay() {
            Some(robots_delay) if robots_delay > self.settings.crawl_delay => {
                tracing::info!(
                    "robots.txt requests a crawl delay of {:?} for {}",
                    robots_delay,
                    origin
                );
                robots_delay
            }
            _ => self.settings.crawl_delay,
        };

        let site = Arc::new(SitePoliteness {
            gate,
            limiter: Arc::new(RateLimiter::new(interval)),
        });
        sites.insert(origin, Arc::clone(&site));
        site
    }

    /// Crawls `seed` to `max_depth`, stopping at `deadline` if one is given
    ///
    /// On deadline expiry the in-flight fetches are aborted and the pages
    /// finished so far are returned with `timed_out` set.
    #[tracing::instrument(skip(self, deadline), fields(seed = %seed))]
    pub async fn crawl_until(
        &self,
        seed: &str,
        max_depth: u32,
        deadline: Option<Instant>,
    ) -> Result<CrawlResult, SageError> {
        let seed_url = normalize_url(seed)?;
        let mut root = seed_url.clone();
        let mut site = self.site(&root).await;

        tracing::info!("Starting crawl of {} (max depth {})", seed_url, max_depth);
        let start_time = std::time::Instant::now();

        let mut pages: Vec<PageRecord> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: VecDeque<usize> = VecDeque::new();
        let mut in_flight: JoinSet<FetchOutcome> = JoinSet::new();
        let mut timed_out = false;
        let mut finished = 0usize;

        visited.insert(seed_url.to_string());
        pages.push(PageRecord {
            url: seed_url.clone(),
            depth: 0,
            state: PageState::Discovered,
            text: String::new(),
            children: Vec::new(),
        });
        frontier.push_back(0);

        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                timed_out = true;
                break;
            }

            // Dispatch until the pool is full or the frontier is drained
            while in_flight.len() < self.settings.max_concurrent_fetches {
                let Some(idx) = frontier.pop_front() else {
                    break;
                };
                let page = &mut pages[idx];

                if let Some(text) = self.cache.get(page.url.as_str())?.filter(|t| !t.is_empty()) {
                    tracing::debug!("Using cached text for {}", page.url);
                    page.state = page.state.transition(PageState::Cached)?;
                    page.text = text;
                    finished += 1;
                    continue;
                }

                if !site.gate.check(page.url.as_str()).may_fetch() {
                    page.state = page.state.transition(PageState::Denied)?;
                    finished += 1;
                    continue;
                }

                page.state = page.state.transition(PageState::Fetching)?;
                tracing::debug!("Queueing {} at depth {}", page.url, page.depth);

                let fetcher = self.fetcher.clone();
                let limiter = Arc::clone(&site.limiter);
                let url = page.url.clone();
                let max_retries = self.settings.max_retries;
                let backoff = self.settings.retry_backoff;
                in_flight.spawn(async move {
                    let result =
                        fetch_with_retry(&fetcher, &limiter, &url, max_retries, backoff).await;
                    (idx, result)
                });
            }

            if in_flight.is_empty() {
                tracing::debug!("Frontier is empty, crawl complete");
                break;
            }

            let joined = match deadline {
                Some(d) => tokio::select! {
                    joined = in_flight.join_next() => joined,
                    _ = tokio::time::sleep_until(d) => {
                        timed_out = true;
                        break;
                    }
                },
                None => in_flight.join_next().await,
            };

            let (idx, outcome) = match joined {
                Some(Ok(done)) => done,
                Some(Err(e)) => {
                    tracing::error!("Fetch task failed: {}", e);
                    continue;
                }
                None => continue,
            };

            finished += 1;
            match outcome {
                Ok(fetched) if !same_origin(&root, &fetched.final_url) => {
                    tracing::warn!(
                        "{} ended up on {}, outside {}; dropping it",
                        pages[idx].url,
                        fetched.final_url,
                        origin_of(&root)
                    );
                    pages[idx].state = pages[idx].state.transition(PageState::Failed)?;
                }
                Ok(fetched) => {
                    let url = pages[idx].url.to_string();
                    self.cache.put(&url, &fetched.text)?;

                    let depth = pages[idx].depth;
                    pages[idx].state = pages[idx].state.transition(PageState::Processed)?;
                    pages[idx].text = fetched.text;

                    if depth < max_depth {
                        let children = admit_links(
                            &fetched.links,
                            &root,
                            depth + 1,
                            &mut visited,
                            &mut pages,
                        );
                        tracing::debug!(
                            "Found {} links on {}, {} new",
                            fetched.links.len(),
                            url,
                            children.len()
                        );
                        frontier.extend(children.iter().copied());
                        pages[idx].children = children;
                    }
                }
                Err(FetchError::OffSiteRedirect { location, .. }) if idx == 0 => {
                    match normalize_url(&location) {
                        Ok(target) if visited.insert(target.to_string()) => {
                            tracing::info!(
                                "Seed {} redirects to {}, crawling that site instead",
                                seed_url,
                                target
                            );
                            root = target.clone();
                            site = self.site(&root).await;

                            let child = pages.len();
                            pages.push(PageRecord {
                                url: target,
                                depth: 0,
                                state: PageState::Discovered,
                                text: String::new(),
                                children: Vec::new(),
                            });
                            pages[0].state = pages[0].state.transition(PageState::Processed)?;
                            pages[0].children = vec![child];
                            frontier.push_back(child);
                        }
                        _ => {
                            tracing::warn!("Seed {} redirects to unusable {}", seed_url, location);
                            pages[0].state = pages[0].state.transition(PageState::Failed)?;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Error crawling {}: {}", pages[idx].url, e);
                    pages[idx].state = pages[idx].state.transition(PageState::Failed)?;
                }
            }

            if finished % 10 == 0 {
                let elapsed = start_time.elapsed();
                tracing::info!(
                    "Progress: {} pages done, {} in flight, {} in frontier, {:.2} pages/sec",
                    finished,
                    in_flight.len(),
                    frontier.len(),
                    finished as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
                );
            }
        }

        if timed_out {
            in_flight.abort_all();
            tracing::warn!(
                "Crawl of {} hit its deadline; returning {} finished pages",
                seed_url,
                finished
            );
        }

        let result = assemble(pages, timed_out);
        tracing::info!(
            "Crawl of {} finished: {} pages visited, {} chars of text in {:.2}s",
            seed_url,
            result.visited.len(),
            result.text.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(result)
    }
}

/// Admits the same-origin, unvisited links of one page as new pages
///
/// Returns the indices of the admitted pages, in link order. Admission is
/// the `HashSet::insert` on `visited`; a URL is admitted at most once.
fn admit_links(
    links: &[String],
    seed_url: &Url,
    depth: u32,
    visited: &mut HashSet<String>,
    pages: &mut Vec<PageRecord>,
) -> Vec<usize> {
    let mut admitted = Vec::new();

    for link in links {
        let Ok(url) = normalize_url(link) else {
            continue;
        };
        if !same_origin(seed_url, &url) {
            continue;
        }
        if !visited.insert(url.to_string()) {
            continue;
        }

        admitted.push(pages.len());
        pages.push(PageRecord {
            url,
            depth,
            state: PageState::Discovered,
            text: String::new(),
            children: Vec::new(),
        });
    }

    admitted
}

/// Fetches `url`, retrying transient failures with exponential backoff
///
/// Every attempt waits for its own rate-limiter slot.
async fn fetch_with_retry(
    fetcher: &PageFetcher,
    limiter: &RateLimiter,
    url: &Url,
    max_retries: u32,
    backoff: Duration,
) -> Result<FetchedPage, FetchError> {
    let mut attempt = 0u32;
    loop {
        limiter.acquire().await;
        tracing::info!("Fetching content from: {}", url);

        match fetcher.fetch(url).await {
            Ok(page) => return Ok(page),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = backoff.saturating_mul(1u32 << attempt.min(16));
                attempt += 1;
                tracing::warn!(
                    "{} (attempt {}/{}), retrying in {:?}",
                    e,
                    attempt,
                    max_retries + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Builds the result: text in pre-order over the discovery tree
fn assemble(pages: Vec<PageRecord>, timed_out: bool) -> CrawlResult {
    let mut parts: Vec<&str> = Vec::new();
    let mut stack: Vec<usize> = if pages.is_empty() { Vec::new() } else { vec![0] };

    while let Some(idx) = stack.pop() {
        let page = &pages[idx];
        if !page.text.is_empty() {
            parts.push(&page.text);
        }
        stack.extend(page.children.iter().rev().copied());
    }
    let text = parts.join(" ");

    let visited = pages.iter().map(|p| p.url.to_string()).collect();
    let reports = pages
        .iter()
        .map(|p| PageReport {
            url: p.url.to_string(),
            depth: p.depth,
            state: p.state,
        })
        .collect();

    CrawlResult {
        text,
        visited,
        pages: reports,
        timed_out,
    }
}
