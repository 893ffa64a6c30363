//! Run orchestration
//!
//! Wires one run together:
//! - opens the sink (fatal on failure)
//! - fetches and parses the listing through the rate limiter (fatal on failure)
//! - starts the batch writer on a blocking thread as the funnel's consumer
//! - dispatches one unit per genre
//! - waits for the writer to drain the closed funnel and reports

use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use tokio_util::sync::CancellationToken;

use super::artist_cache::ArtistWeightCache;
use super::batch_writer::{BatchWriter, CsvSink, RecordSink};
use super::dispatcher::TaskDispatcher;
use super::fetcher::PageFetcher;
use super::funnel::result_funnel;
use super::progress::ProgressReporter;
use super::rate_limiter::RateLimiter;
use super::scrape_types::{RunReport, ScrapeError, ScrapeResult};
use crate::config::ScrapeConfig;
use crate::page_parser::{Record, WorkItem, parse_listing};
use crate::utils::listing_url;

/// Run the full pipeline writing to the CSV file named by `config`
///
/// # Errors
/// Fatal conditions only: the output file cannot be created, or the
/// listing cannot be fetched or parsed. Per-genre failures end up in
/// `RunReport::error`.
pub async fn scrape_pages<F, P>(
    config: &ScrapeConfig,
    fetcher: Arc<F>,
    progress: Arc<P>,
    cancel: CancellationToken,
) -> ScrapeResult<RunReport>
where
    F: PageFetcher,
    P: ProgressReporter + 'static,
{
    let sink = CsvSink::create(config.output_path())?;
    info!("Writing results to {}", config.output_path().display());
    scrape_pages_into(config, sink, fetcher, progress, cancel).await
}

/// Run the full pipeline into an already opened sink
///
/// # Errors
/// Returns an error if the listing cannot be fetched or parsed, or if the
/// writer thread dies.
pub async fn scrape_pages_into<S, F, P>(
    config: &ScrapeConfig,
    sink: S,
    fetcher: Arc<F>,
    progress: Arc<P>,
    cancel: CancellationToken,
) -> ScrapeResult<RunReport>
where
    S: RecordSink + 'static,
    F: PageFetcher,
    P: ProgressReporter + 'static,
{
    let start_time = Instant::now();
    let limiter = Arc::new(RateLimiter::new(config.rate_interval(), config.rate_burst()));
    let cache = Arc::new(ArtistWeightCache::new());

    let items = fetch_listing(config, fetcher.as_ref(), &limiter, &cancel).await?;
    let total_items = items.len();
    progress.report_listing_fetched(total_items);

    let (funnel_tx, funnel_rx) = result_funnel::<Record>(config.batch_size());
    let writer = BatchWriter::new(sink, config.batch_size(), total_items, Arc::clone(&progress));
    let writer_task = tokio::task::spawn_blocking(move || writer.run_blocking(funnel_rx));

    let dispatcher = TaskDispatcher::new(
        fetcher,
        limiter,
        Arc::clone(&cache),
        Arc::clone(&progress),
        config.base_url(),
        config.max_concurrency(),
    );
    let outcome = dispatcher.run(items, funnel_tx, &cancel).await;

    let stats = writer_task
        .await
        .map_err(|e| ScrapeError::TaskPanicked(format!("batch writer: {e}")))?;

    if stats.received != outcome.completed {
        warn!(
            "Writer received {} records but {} units reported completion",
            stats.received, outcome.completed
        );
    }

    let elapsed = start_time.elapsed();
    progress.report_completed(stats.written, total_items, elapsed);
    info!(
        "Scraping finished in {elapsed:.2?}: {}/{total_items} genres, {} distinct artists",
        stats.written,
        cache.len()
    );

    Ok(RunReport {
        total_items,
        records_received: stats.received,
        records_written: stats.written,
        flushes: stats.flushes,
        failed_flushes: stats.failed_flushes,
        peak_admitted: outcome.peak_admitted,
        elapsed,
        error: outcome.first_error,
    })
}

/// Fetch and parse the listing; any failure here is fatal
async fn fetch_listing<F: PageFetcher>(
    config: &ScrapeConfig,
    fetcher: &F,
    limiter: &RateLimiter,
    cancel: &CancellationToken,
) -> ScrapeResult<Vec<WorkItem>> {
    let url = listing_url(config.base_url());
    info!("Fetching genre listing from {url}");

    limiter.acquire(cancel).await?;
    let html = fetcher.fetch_page(&url).await?;
    parse_listing(&html)
}
