//! Core configuration types for scraping
//!
//! This module contains the main `ScrapeConfig` struct that defines the
//! parameters of one pipeline run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::{
    DEFAULT_BASE_URL, DEFAULT_BATCH_SIZE, DEFAULT_POOL_IDLE_TIMEOUT, DEFAULT_POOL_MAX_IDLE_PER_HOST,
    DEFAULT_PROGRESS_INTERVAL, DEFAULT_RATE_BURST, DEFAULT_RATE_INTERVAL, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_USER_AGENT,
};

/// Main configuration struct for a scrape run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// CSV file the records are written to (created or truncated)
    pub(crate) output_path: PathBuf,

    /// Scheme and host serving the listing and detail pages.
    ///
    /// **INVARIANT:** Has an `http://` or `https://` scheme and no trailing
    /// slash (normalized in builder).
    pub(crate) base_url: String,

    /// Maximum number of units past the admission gate at once
    ///
    /// Default: number of logical CPUs
    pub(crate) max_concurrency: usize,

    /// Refill interval of the shared token bucket; zero disables limiting
    ///
    /// Default: 50ms
    pub(crate) rate_interval: Duration,

    /// Token bucket capacity
    ///
    /// Default: 1 (strict minimum spacing between requests)
    pub(crate) rate_burst: u32,

    /// Records per flush, and capacity of the result funnel
    ///
    /// Default: 250
    pub(crate) batch_size: usize,

    /// Whole-request timeout of the HTTP client
    ///
    /// Default: 10 seconds
    pub(crate) request_timeout: Duration,

    /// Idle keep-alive connections retained per host
    ///
    /// Default: 100
    pub(crate) pool_max_idle_per_host: usize,

    /// How long an idle connection stays in the pool
    ///
    /// Default: 90 seconds
    pub(crate) pool_idle_timeout: Duration,

    pub(crate) user_agent: String,

    /// Log processed counts every this many genres
    ///
    /// Default: 100
    pub(crate) progress_interval: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("genres.csv"),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrency: num_cpus::get(),
            rate_interval: DEFAULT_RATE_INTERVAL,
            rate_burst: DEFAULT_RATE_BURST,
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            pool_idle_timeout: DEFAULT_POOL_IDLE_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}
