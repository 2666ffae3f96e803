//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests that return extracted text and links
//! - Error classification into retryable and final failures
//!
//! The fetcher performs exactly one request per call; retries belong to the
//! crawl engine.

use crate::config::UserAgentConfig;
use crate::crawler::parser::parse_html;
use crate::url::same_origin;
use reqwest::header::LOCATION;
use reqwest::{redirect, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Reasons a single page fetch can fail
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// DNS failure, refused connection, TLS failure, or other transport error
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("timed out fetching {url}")]
    Timeout { url: String },

    /// The server answered with a non-2xx status
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// The response body could not be read
    #[error("failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    /// The server redirected to another origin; the redirect was not followed
    #[error("{url} redirects off-site to {location}")]
    OffSiteRedirect { url: String, location: String },
}

impl FetchError {
    /// Returns true for failures worth another attempt
    ///
    /// Network errors, timeouts and 5xx statuses are transient; 4xx statuses
    /// and body errors are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => (500..600).contains(status),
            Self::Body { .. } | Self::OffSiteRedirect { .. } => false,
        }
    }

    fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Most redirects followed for one request
pub const MAX_REDIRECTS: usize = 10;

/// A successfully fetched and parsed page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects (links were resolved against this)
    pub final_url: Url,
    pub status: u16,
    /// Visible text of the page
    pub text: String,
    /// Absolute http(s) links in document order, not yet origin-filtered
    pub links: Vec<String>,
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed only while they stay on the origin of the
/// requested URL. A redirect to another origin is returned as-is.
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Whole-request timeout
///
/// # Example
///
/// ```no_run
/// use site_sage::config::UserAgentConfig;
/// use site_sage::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.value.clone())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .redirect(same_origin_redirects())
        .build()
}

fn same_origin_redirects() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if attempt
            .previous()
            .first()
            .is_some_and(|first| !same_origin(first, attempt.url()))
        {
            attempt.stop()
        } else {
            attempt.follow()
        }
    })
}

/// Issues page requests with a shared client
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The underlying client (shared with the robots.txt loader)
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches one page and extracts its text and links
    ///
    /// Never panics; every failure is returned as a [`FetchError`].
    #[tracing::instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        let final_url = response.url().clone();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| final_url.join(value).ok());
            if let Some(location) = location {
                return Err(FetchError::OffSiteRedirect {
                    url: url.to_string(),
                    location: location.to_string(),
                });
            }
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let parsed = parse_html(&body, &final_url);
        tracing::debug!(
            "Fetched {} (HTTP {}, {} chars of text, {} links)",
            final_url,
            status.as_u16(),
            parsed.text.len(),
            parsed.links.len()
        );

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            text: parsed.text,
            links: parsed.links,
        })
    }

    /// Checks that `url` answers, discarding the body
    ///
    /// A 2xx status or an off-site redirect counts as reachable.
    pub async fn probe(&self, url: &Url) -> Result<(), FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        if status.is_success() || status.is_redirection() {
            tracing::info!("Successfully accessed {}", url);
            Ok(())
        } else {
            Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            })
        }
    }
}
