//! Type-safe builder for `ScrapeConfig` using the typestate pattern
//!
//! This module provides a fluent builder interface with compile-time validation
//! ensuring that required fields are set before building a `ScrapeConfig`.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use super::types::ScrapeConfig;
use crate::scrape_engine::scrape_types::{ScrapeError, ScrapeResult};
use crate::utils::normalize_base_url;

// Type states for the builder
pub struct WithOutputPath;
pub struct WithBaseUrl;

pub struct ScrapeConfigBuilder<State = ()> {
    pub(crate) output_path: Option<PathBuf>,
    pub(crate) base_url: Option<String>,
    pub(crate) defaults: ScrapeConfig,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ScrapeConfigBuilder<()> {
    fn default() -> Self {
        Self {
            output_path: None,
            base_url: None,
            defaults: ScrapeConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfig {
    /// Create a builder for configuring a `ScrapeConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder<()> {
        ScrapeConfigBuilder::default()
    }
}

impl<State> ScrapeConfigBuilder<State> {
    fn into_state<Next>(self) -> ScrapeConfigBuilder<Next> {
        ScrapeConfigBuilder {
            output_path: self.output_path,
            base_url: self.base_url,
            defaults: self.defaults,
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfigBuilder<()> {
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> ScrapeConfigBuilder<WithOutputPath> {
        self.output_path = Some(path.into());
        self.into_state()
    }
}

impl ScrapeConfigBuilder<WithOutputPath> {
    /// Set the host serving the pages
    ///
    /// `https://` is prepended when no scheme is given and trailing slashes
    /// are removed.
    pub fn base_url(mut self, url: impl Into<String>) -> ScrapeConfigBuilder<WithBaseUrl> {
        self.base_url = Some(normalize_base_url(&url.into()));
        self.into_state()
    }
}

// Build method only available when all required fields are set
impl ScrapeConfigBuilder<WithBaseUrl> {
    /// Validate and produce the configuration
    ///
    /// # Errors
    /// Returns `ScrapeError::Config` for an empty output path, a base URL
    /// that does not parse or has no host, or a zero concurrency, burst or
    /// batch size.
    pub fn build(self) -> ScrapeResult<ScrapeConfig> {
        let output_path = self
            .output_path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| ScrapeError::Config("output path must not be empty".to_string()))?;

        let base_url = self.base_url.unwrap_or_default();
        let parsed = Url::parse(&base_url)
            .map_err(|e| ScrapeError::Config(format!("invalid base URL '{base_url}': {e}")))?;
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ScrapeError::Config(format!(
                "base URL '{base_url}' has no host"
            )));
        }

        let defaults = self.defaults;
        if defaults.max_concurrency == 0 {
            return Err(ScrapeError::Config(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if defaults.rate_burst == 0 {
            return Err(ScrapeError::Config(
                "rate_burst must be at least 1".to_string(),
            ));
        }
        if defaults.batch_size == 0 {
            return Err(ScrapeError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }

        Ok(ScrapeConfig {
            output_path,
            base_url,
            ..defaults
        })
    }
}

// Optional settings, available at any state
impl<State> ScrapeConfigBuilder<State> {
    /// Maximum number of genres processed at once
    ///
    /// Default is the number of logical CPUs. Concurrency only overlaps
    /// network waits; the rate limiter still spaces the requests themselves.
    #[must_use]
    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.defaults.max_concurrency = limit;
        self
    }

    /// Minimum spacing between outbound requests (zero disables limiting)
    #[must_use]
    pub fn rate_interval(mut self, interval: Duration) -> Self {
        self.defaults.rate_interval = interval;
        self
    }

    #[must_use]
    pub fn rate_burst(mut self, burst: u32) -> Self {
        self.defaults.rate_burst = burst;
        self
    }

    /// Records per flush; also bounds the number of records in flight
    ///
    /// # Example
    /// ```rust
    /// # use genrescrape::config::ScrapeConfig;
    /// # fn main() -> Result<(), genrescrape::ScrapeError> {
    /// let config = ScrapeConfig::builder()
    ///     .output_path("genres.csv")
    ///     .base_url("everynoise.com")
    ///     .batch_size(50)
    ///     .build()?;
    /// assert_eq!(config.base_url(), "https://everynoise.com");
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.defaults.batch_size = size;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.defaults.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.defaults.pool_max_idle_per_host = max;
        self
    }

    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.defaults.pool_idle_timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.defaults.user_agent = agent.into();
        self
    }

    #[must_use]
    pub fn progress_interval(mut self, every: usize) -> Self {
        self.defaults.progress_interval = every;
        self
    }
}
