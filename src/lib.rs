pub mod config;
pub mod page_parser;
pub mod scrape_engine;
pub mod utils;

pub use config::ScrapeConfig;
pub use page_parser::{DetailPage, DisplayAttributes, Record, WeightedList, WorkItem};
pub use scrape_engine::{
    ArtistWeightCache, HttpFetcher, PageFetcher, RateLimiter, RunReport, ScrapeError, ScrapeResult,
};
pub use utils::{detail_url, listing_url};

/// Scrape the genre map described by `config` over HTTP
///
/// Uses a fresh cancellation token; see [`scrape_engine::scrape_impl`] to
/// supply one.
pub async fn scrape(config: &ScrapeConfig) -> ScrapeResult<RunReport> {
    scrape_engine::scrape_impl(config, &tokio_util::sync::CancellationToken::new()).await
}
