//! Process-wide context, built once at startup and shared by handle

use crate::cache::{PageCache, SqliteCache};
use crate::config::{resolve_api_key, Config};
use crate::crawler::{build_http_client, CrawlEngine, PageFetcher};
use crate::model::{GeminiClient, ModelQuery};
use crate::SageError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Everything request handlers and the CLI need
pub struct AppContext {
    pub config: Config,
    pub engine: CrawlEngine,
    pub model: Arc<dyn ModelQuery>,
}

impl AppContext {
    /// Assembles a context from already-built parts
    pub fn new(
        config: Config,
        cache: Arc<dyn PageCache>,
        model: Arc<dyn ModelQuery>,
    ) -> Result<Self, SageError> {
        let engine = build_engine(&config, cache)?;

        Ok(Self {
            config,
            engine,
            model,
        })
    }

    /// Builds the production context: on-disk cache and a Gemini client
    ///
    /// Fails if the database cannot be opened or the API key is missing.
    pub fn from_config(config: Config) -> Result<Self, SageError> {
        let cache = SqliteCache::new(Path::new(&config.cache.database_path))?;
        let api_key = resolve_api_key(&config.model)?;

        let model_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        let model = GeminiClient::new(model_client, config.model.clone(), api_key);

        Self::new(config, Arc::new(cache), Arc::new(model))
    }
}

/// Builds a crawl engine over `cache` with the configured HTTP client
pub fn build_engine(config: &Config, cache: Arc<dyn PageCache>) -> Result<CrawlEngine, SageError> {
    let client = build_http_client(
        &config.user_agent,
        Duration::from_secs(config.crawler.request_timeout_secs),
    )?;
    Ok(CrawlEngine::new(
        &config.crawler,
        config.user_agent.value.clone(),
        PageFetcher::new(client),
        cache,
    ))
}
