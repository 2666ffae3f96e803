//! Configuration module for Site-Sage
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and resolving the model API key from the environment.
//!
//! # Example
//!
//! ```no_run
//! use site_sage::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CacheConfig, Config, CrawlerConfig, ModelConfig, RobotsPolicy, ServerConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, resolve_api_key,
};
