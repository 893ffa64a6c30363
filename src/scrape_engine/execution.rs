//! Simple async scraping execution
//!
//! This module provides the `scrape_impl` API that runs a complete scrape
//! over HTTP with log-based progress reporting.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::fetcher::HttpFetcher;
use super::orchestrator::scrape_pages;
use super::progress::LogProgress;
use super::scrape_types::{RunReport, ScrapeResult};
use crate::config::ScrapeConfig;

/// Scrape over HTTP, logging progress, until done or `cancel` fires
///
/// A thin wrapper around `scrape_pages` with the production fetcher and
/// reporter. The run works on a child of `cancel`, so a first error
/// cancels this run without touching the caller's token.
///
/// # Errors
/// Fatal conditions only; see [`scrape_pages`].
pub async fn scrape_impl(
    config: &ScrapeConfig,
    cancel: &CancellationToken,
) -> ScrapeResult<RunReport> {
    let fetcher = Arc::new(HttpFetcher::new(config)?);
    let progress = Arc::new(LogProgress::new(config.progress_interval()));
    scrape_pages(config, fetcher, progress, cancel.child_token()).await
}
