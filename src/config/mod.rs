//! Configuration module for docs-mirror
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every key has a default matching the command-line defaults, so the
//! file is optional.
//!
//! # Example
//!
//! ```no_run
//! use docs_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Crawling {}", config.scope());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserSettings, Config, CrawlerConfig, Engine, OutputConfig, ScopeConfig,
    DEFAULT_BASE_HOST, DEFAULT_PATH_PREFIX, DEFAULT_START_URL, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{load_config, parse_config_file, parse_config_str};
pub use validation::validate;
