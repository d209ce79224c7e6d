//! Configuration module for Site-Atlas
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use site_atlas::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("atlas.toml")).unwrap();
//! println!("Each crawl requests at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OrchestratorConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
