//! Core types for scrape operations.
//!
//! This module contains the error type shared by every stage of the
//! pipeline and the report returned at the end of a run.

use std::time::Duration;

/// Error type for scrape operations
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request failed, timed out, or returned a non-success status
    #[error("Network error: {0}")]
    Network(String),

    /// Page could not be turned into records
    #[error("Parse error: {0}")]
    Parse(String),

    /// The shared cancellation token fired before the operation could proceed
    #[error("Scrape operation was cancelled")]
    Cancelled,

    /// Output sink could not be opened or written
    #[error("Sink error: {0}")]
    Sink(String),

    /// Failure of one genre's unit of work
    #[error("Error scraping {genre}: {source}")]
    Item {
        genre: String,
        #[source]
        source: Box<ScrapeError>,
    },

    /// A dispatched unit panicked instead of returning
    #[error("Scrape task panicked: {0}")]
    TaskPanicked(String),
}

impl ScrapeError {
    /// Wrap this error with the genre whose unit produced it
    #[must_use]
    pub fn for_genre(self, genre: impl Into<String>) -> Self {
        Self::Item {
            genre: genre.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error (or the error it wraps) is a cancellation
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Item { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

impl From<csv::Error> for ScrapeError {
    fn from(err: csv::Error) -> Self {
        Self::Sink(err.to_string())
    }
}

impl From<std::io::Error> for ScrapeError {
    fn from(err: std::io::Error) -> Self {
        Self::Sink(err.to_string())
    }
}

/// Convenience alias for Result with `ScrapeError`
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// Summary of one pipeline run
///
/// Returned whenever the run got past its fatal startup checks. `error`
/// holds the first per-genre failure, which aborted the remaining work;
/// rows flushed before that point stay in the sink.
#[derive(Debug)]
pub struct RunReport {
    /// Genres found in the listing
    pub total_items: usize,
    /// Records received by the batch writer
    pub records_received: usize,
    /// Records successfully written to the sink
    pub records_written: usize,
    /// Size of every flush, in order, including the final one
    pub flushes: Vec<usize>,
    /// Flushes whose write failed
    pub failed_flushes: usize,
    /// Most genres past the admission gate at the same time
    pub peak_admitted: usize,
    /// Wall time of the whole run
    pub elapsed: Duration,
    /// First per-genre error, if the run was aborted
    pub error: Option<ScrapeError>,
}

impl RunReport {
    /// True when every genre was enriched and handed to the sink
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.records_received == self.total_items
    }
}
