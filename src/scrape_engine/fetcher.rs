//! Page fetching
//!
//! The pipeline only needs "URL in, HTML out". `PageFetcher` is that seam;
//! `HttpFetcher` is the production implementation over a pooled `reqwest`
//! client.

use std::future::Future;

use reqwest::Client;

use super::scrape_types::{ScrapeError, ScrapeResult};
use crate::config::ScrapeConfig;

/// Source of page bodies
pub trait PageFetcher: Send + Sync + 'static {
    /// Fetch `url` and return its body as text
    ///
    /// The future runs to completion once started; cancellation is only
    /// observed before and after a fetch, never during one.
    fn fetch_page(&self, url: &str) -> impl Future<Output = ScrapeResult<String>> + Send;
}

/// HTTP fetcher with a keep-alive connection pool
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client from the timeout, pool and user agent settings of `config`
    ///
    /// # Errors
    /// Returns `ScrapeError::Config` if the TLS backend cannot be initialised.
    pub fn new(config: &ScrapeConfig) -> ScrapeResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host())
            .pool_idle_timeout(config.pool_idle_timeout())
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| ScrapeError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an already configured client
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> ScrapeResult<String> {
        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| ScrapeError::Network(format!("error fetching {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Network(format!(
                "{url} returned status {status}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ScrapeError::Network(format!("error reading body of {url}: {e}")))
    }
}
