use serde::Deserialize;

/// Main configuration structure for Site-Sage
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Whether a robots.txt disallow stops the fetch or is only logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RobotsPolicy {
    /// Disallowed URLs are skipped
    #[default]
    Respect,
    /// Disallowed URLs are fetched anyway, with a warning per URL
    LogOnly,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// The single site this assistant answers questions about
    pub seed_url: String,

    /// Maximum link depth to crawl from the seed URL
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of fetches in flight at once
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: u32,

    /// Minimum time between the start of two requests (milliseconds)
    #[serde(default = "default_crawl_delay_ms")]
    pub crawl_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Deadline for a whole crawl (seconds, 0 = none)
    #[serde(default = "default_crawl_timeout_secs")]
    pub crawl_timeout_secs: u64,

    /// Extra attempts for network errors and 5xx responses
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before the first retry, doubled for each further retry (milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default)]
    pub robots_policy: RobotsPolicy,
}

/// User agent sent with every request, including robots.txt
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(default = "default_user_agent")]
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: default_user_agent(),
        }
    }
}

/// Page cache configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Hosted language model configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModelConfig {
    /// Base URL of the generative language API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model name used in the generateContent path
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Number of leading characters of the site text sent as context
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Blocking threshold sent for every harm category (e.g. `BLOCK_MEDIUM_AND_ABOVE`)
    #[serde(default = "default_safety_threshold")]
    pub safety_threshold: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_output_tokens: default_max_output_tokens(),
            context_chars: default_context_chars(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            safety_threshold: default_safety_threshold(),
        }
    }
}

/// HTTP API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_max_depth() -> u32 {
    5
}

fn default_max_concurrent_fetches() -> u32 {
    8
}

fn default_crawl_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_crawl_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_database_path() -> String {
    "website_data.db".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_context_chars() -> usize {
    13_000
}

fn default_temperature() -> f32 {
    0.4
}

fn default_top_p() -> f32 {
    0.9
}

fn default_top_k() -> u32 {
    40
}

fn default_safety_threshold() -> String {
    "BLOCK_MEDIUM_AND_ABOVE".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}
