//! Breadth-first same-origin crawler
//!
//! Fetches pages starting at the target, stores a snapshot of each page
//! through the object store, and returns one `PageRecord` per stored page.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchResult};
use crate::crawler::parser::parse_html;
use crate::crawler::records::{MemoryRecordStore, PageRecord, PageRecordStore};
use crate::crawler::{CrawlRequest, CrawlRunner};
use crate::storage::ObjectStore;
use crate::url::{has_excluded_extension, is_same_origin, normalize_url, snapshot_key, snapshot_name};
use crate::CrawlError;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// HTTP implementation of `CrawlRunner`
pub struct HttpCrawlRunner {
    client: Client,
    settings: CrawlerConfig,
    object_store: Arc<dyn ObjectStore>,
}

impl HttpCrawlRunner {
    /// Creates a runner from the loaded configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Crawler limits and user agent come from here
    /// * `object_store` - Receives one snapshot per crawled page
    pub fn new(config: &Config, object_store: Arc<dyn ObjectStore>) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, config.crawler.page_timeout())?;
        Ok(Self::with_client(client, config.crawler.clone(), object_store))
    }

    /// Creates a runner around an existing HTTP client
    pub fn with_client(
        client: Client,
        settings: CrawlerConfig,
        object_store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            client,
            settings,
            object_store,
        }
    }

    /// Crawls without the overall time limit
    async fn crawl(&self, request: &CrawlRequest) -> Result<Vec<PageRecord>, CrawlError> {
        let target = &request.target;
        let max_pages = self.settings.max_pages;
        let records = MemoryRecordStore::new();

        let mut frontier = VecDeque::from([target.clone()]);
        let mut seen = HashSet::from([target.to_string()]);
        let mut requested: u32 = 0;

        tracing::info!("Crawling {} for task {}", target, request.task_id);

        while let Some(page_url) = frontier.pop_front() {
            if requested >= max_pages {
                tracing::debug!("Page limit of {} reached for {}", max_pages, target);
                break;
            }

            if request.is_cancelled() {
                tracing::info!("Crawl of {} cancelled after {} pages", target, records.len());
                return Err(CrawlError::Cancelled);
            }

            let is_seed = requested == 0;
            requested += 1;

            let (final_url, body) = match fetch_page(&self.client, page_url.as_str()).await {
                FetchResult::Success {
                    final_url, body, ..
                } => (final_url, body),
                failure if is_seed => {
                    return Err(CrawlError::Navigation {
                        url: page_url.to_string(),
                        message: failure.describe(),
                    });
                }
                failure => {
                    tracing::warn!("Skipping {}: {}", page_url, failure.describe());
                    continue;
                }
            };

            // Pages are recorded under the address they were served from
            let page_url = match normalize_url(&final_url) {
                Ok(landed) => {
                    if landed != page_url {
                        tracing::debug!("{} redirected to {}", page_url, landed);
                        seen.insert(landed.to_string());
                    }
                    landed
                }
                Err(_) => page_url,
            };
            let parsed = parse_html(&body, &page_url);

            let name = snapshot_name(target.as_str(), page_url.as_str());
            let key = snapshot_key(&request.owner, &page_url, &name);
            let reference = self.object_store.upload(&key, body.into_bytes()).await?;

            tracing::debug!("Stored {} as {}", page_url, reference);
            records.append(PageRecord::new(
                page_url.as_str(),
                parsed.title.unwrap_or_default(),
                reference,
            ));
            request.report_progress(progress_percent(requested, max_pages));

            for link in parsed.links {
                let normalized = match normalize_url(link.as_str()) {
                    Ok(url) => url,
                    Err(e) => {
                        tracing::debug!("Failed to normalize URL {}: {}", link, e);
                        continue;
                    }
                };

                if !is_same_origin(&normalized, target)
                    || has_excluded_extension(&normalized, &self.settings.excluded_extensions)
                {
                    continue;
                }

                if seen.insert(normalized.to_string()) {
                    frontier.push_back(normalized);
                }
            }
        }

        tracing::info!(
            "Crawl of {} finished: {} pages stored, {} requested",
            target,
            records.len(),
            requested
        );

        Ok(records.records())
    }
}

#[async_trait]
impl CrawlRunner for HttpCrawlRunner {
    async fn run(&self, request: &CrawlRequest) -> Result<Vec<PageRecord>, CrawlError> {
        let limit = self.settings.crawl_timeout();
        match tokio::time::timeout(limit, self.crawl(request)).await {
            Ok(result) => result,
            Err(_) => Err(CrawlError::Timeout {
                url: request.target.to_string(),
                seconds: limit.as_secs(),
            }),
        }
    }
}

/// Share of the page budget used so far, kept below 100 until the task completes
fn progress_percent(requested: u32, max_pages: u32) -> u8 {
    let percent = u64::from(requested) * 100 / u64::from(max_pages.max(1));
    percent.min(99) as u8
}
