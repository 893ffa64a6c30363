//! Progress reporting abstraction for scrape runs
//!
//! Defines the `ProgressReporter` trait for pipeline health events and
//! provides a no-op implementation plus one that writes to the log.

use std::time::Duration;

use log::{error, info, warn};

use super::scrape_types::ScrapeError;

/// Trait for reporting pipeline progress at key points of a run
///
/// Implementations are shared between the dispatched units and the batch
/// writer thread, so every method takes `&self` and must be cheap.
pub trait ProgressReporter: Send + Sync {
    /// The listing was fetched and parsed into `total` genres
    fn report_listing_fetched(&self, total: usize);

    /// A genre's record was handed to the funnel; `processed` counts all so far
    fn report_item_completed(&self, genre: &str, processed: usize, total: usize);

    /// A genre's unit failed; only the first failure aborts the run
    fn report_item_failed(&self, genre: &str, error: &ScrapeError);

    /// A batch reached the sink
    fn report_batch_flushed(&self, batch_len: usize, written: usize, total: usize);

    /// A batch could not be written
    fn report_flush_failed(&self, batch_len: usize, error: &ScrapeError);

    /// The run is over
    fn report_completed(&self, written: usize, total: usize, elapsed: Duration);
}

/// Progress reporter that does nothing
#[derive(Debug, Clone, Copy)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_listing_fetched(&self, _total: usize) {}

    #[inline(always)]
    fn report_item_completed(&self, _genre: &str, _processed: usize, _total: usize) {}

    #[inline(always)]
    fn report_item_failed(&self, _genre: &str, _error: &ScrapeError) {}

    #[inline(always)]
    fn report_batch_flushed(&self, _batch_len: usize, _written: usize, _total: usize) {}

    #[inline(always)]
    fn report_flush_failed(&self, _batch_len: usize, _error: &ScrapeError) {}

    #[inline(always)]
    fn report_completed(&self, _written: usize, _total: usize, _elapsed: Duration) {}
}

/// Progress reporter writing through the `log` facade
///
/// Processed counts are logged every `interval` genres and once more when
/// the last genre is done.
#[derive(Debug, Clone, Copy)]
pub struct LogProgress {
    interval: usize,
}

impl LogProgress {
    #[must_use]
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
        }
    }
}

impl ProgressReporter for LogProgress {
    fn report_listing_fetched(&self, total: usize) {
        info!("Found {total} genres to process");
    }

    fn report_item_completed(&self, _genre: &str, processed: usize, total: usize) {
        if processed % self.interval == 0 || processed == total {
            info!("Processed {processed}/{total} genres");
        }
    }

    fn report_item_failed(&self, genre: &str, error: &ScrapeError) {
        if !error.is_cancelled() {
            warn!("Genre {genre} failed: {error}");
        }
    }

    fn report_batch_flushed(&self, batch_len: usize, written: usize, total: usize) {
        info!("Wrote batch of {batch_len} genres. Total written: {written}/{total}");
    }

    fn report_flush_failed(&self, batch_len: usize, error: &ScrapeError) {
        error!("Dropped batch of {batch_len} genres: {error}");
    }

    fn report_completed(&self, written: usize, total: usize, elapsed: Duration) {
        info!("Wrote {written}/{total} genres to CSV in {elapsed:.2?}");
    }
}
