use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for Site-Atlas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    pub output: OutputConfig,
}

/// Per-crawl limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of pages requested in a single crawl
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Timeout for a single page request (seconds)
    #[serde(rename = "page-timeout-secs", default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Maximum duration of a whole crawl (seconds)
    #[serde(rename = "crawl-timeout-secs", default = "default_crawl_timeout_secs")]
    pub crawl_timeout_secs: u64,

    /// Links whose path ends with one of these are never followed
    #[serde(rename = "excluded-extensions", default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,
}

impl CrawlerConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn crawl_timeout(&self) -> Duration {
        Duration::from_secs(self.crawl_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            page_timeout_secs: default_page_timeout_secs(),
            crawl_timeout_secs: default_crawl_timeout_secs(),
            excluded_extensions: default_excluded_extensions(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Task queue behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Total attempts per task, the first one included
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Tasks untouched for longer than this are swept (seconds)
    #[serde(rename = "retention-secs", default = "default_retention_secs")]
    pub retention_secs: u64,

    /// How often the sweeper runs (seconds)
    #[serde(rename = "sweep-interval-secs", default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl OrchestratorConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory receiving page snapshots
    #[serde(rename = "snapshot-dir")]
    pub snapshot_dir: String,

    /// Directory receiving one JSON site tree per task
    #[serde(rename = "site-tree-dir")]
    pub site_tree_dir: String,
}

fn default_max_pages() -> u32 {
    20
}

fn default_page_timeout_secs() -> u64 {
    30
}

fn default_crawl_timeout_secs() -> u64 {
    600
}

fn default_excluded_extensions() -> Vec<String> {
    vec![".pdf".to_string()]
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_retention_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    60
}
