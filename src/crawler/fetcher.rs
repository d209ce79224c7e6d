//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Error classification

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Maximum redirect hops followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Non-success HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Describes a failed fetch for logs and task error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Success { status_code, .. } => format!("HTTP {}", status_code),
            Self::ContentMismatch { content_type } => {
                format!("unexpected content type '{}'", content_type)
            }
            Self::HttpError { status_code } => format!("HTTP {}", status_code),
            Self::NetworkError { error } => error.clone(),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `page_timeout` - Timeout for a single request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use site_atlas::config::UserAgentConfig;
/// use site_atlas::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "SiteAtlas".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    page_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(page_timeout)
        .connect_timeout(Duration::from_secs(10).min(page_timeout))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page and classifies the outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with `text/html` | `Success` |
/// | 2xx with any other type | `ContentMismatch` |
/// | Any other status | `HttpError` |
/// | Timeout, connection or body failure | `NetworkError` |
pub async fn fetch_page(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else if e.is_redirect() {
                "Too many redirects".to_string()
            } else {
                e.to_string()
            };
            return FetchResult::NetworkError { error };
        }
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.contains("text/html") {
        return FetchResult::ContentMismatch { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(e) => FetchResult::NetworkError {
            error: e.to_string(),
        },
    }
}
