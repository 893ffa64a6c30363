//! Scrape Engine Module
//!
//! The concurrent fetch-aggregate-persist pipeline: a shared rate limiter,
//! bounded-concurrency dispatch with fail-fast cancellation, a bounded
//! result funnel, the batch writer, and the cross-task artist weight cache.

// Sub-modules
pub mod artist_cache;
pub mod batch_writer;
pub mod dispatcher;
pub mod execution;
pub mod fetcher;
pub mod funnel;
pub mod orchestrator;
pub mod progress;
pub mod rate_limiter;
pub mod scrape_types;

// Re-exports for public API
pub use execution::scrape_impl;

// Re-export orchestration and progress types for advanced usage
pub use orchestrator::{scrape_pages, scrape_pages_into};
pub use progress::{LogProgress, NoOpProgress, ProgressReporter};

// Re-export pipeline components
pub use artist_cache::ArtistWeightCache;
pub use batch_writer::{BatchWriter, CsvSink, RecordSink, WriterStats};
pub use dispatcher::{DispatchOutcome, ErrorCollector, TaskDispatcher};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use funnel::{FunnelReceiver, FunnelSender, result_funnel};
pub use rate_limiter::{RateLimitDecision, RateLimiter};

// Re-export scrape types
pub use scrape_types::{RunReport, ScrapeError, ScrapeResult};
