// Genre map scraper
//
// Fetches the genre listing, enriches every genre from its detail page and
// writes the results to a CSV file. Exits non-zero when the run cannot
// start or is aborted by a failing genre.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use genrescrape::ScrapeConfig;
use genrescrape::scrape_engine::scrape_impl;
use genrescrape::utils::{
    DEFAULT_BASE_URL, DEFAULT_BATCH_SIZE, DEFAULT_PROGRESS_INTERVAL, DEFAULT_RATE_BURST,
    DEFAULT_RATE_INTERVAL, DEFAULT_REQUEST_TIMEOUT,
};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(name = "genrescrape", version, about = "Scrape the genre map into a CSV file")]
struct Args {
    /// Output CSV file
    #[arg(short, long, env = "GENRESCRAPE_OUTPUT", default_value = "genres.csv")]
    output: PathBuf,

    /// Host serving the genre map pages
    #[arg(long, env = "GENRESCRAPE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Genres processed concurrently [default: number of CPUs]
    #[arg(short = 'j', long, env = "GENRESCRAPE_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Minimum milliseconds between requests (0 disables rate limiting)
    #[arg(
        long,
        env = "GENRESCRAPE_RATE_INTERVAL_MS",
        default_value_t = DEFAULT_RATE_INTERVAL.as_millis() as u64
    )]
    rate_interval_ms: u64,

    /// Requests allowed back to back before spacing applies
    #[arg(long, default_value_t = DEFAULT_RATE_BURST)]
    rate_burst: u32,

    /// Records per CSV flush
    #[arg(long, env = "GENRESCRAPE_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Log a progress line every N genres
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    progress_every: usize,
}

impl Args {
    fn into_config(self) -> Result<ScrapeConfig> {
        let mut builder = ScrapeConfig::builder()
            .output_path(self.output)
            .base_url(self.base_url)
            .rate_interval(Duration::from_millis(self.rate_interval_ms))
            .rate_burst(self.rate_burst)
            .batch_size(self.batch_size)
            .request_timeout(Duration::from_secs(self.timeout_secs))
            .progress_interval(self.progress_every);
        if let Some(concurrency) = self.concurrency {
            builder = builder.max_concurrency(concurrency);
        }
        builder.build().context("Invalid configuration")
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = args.into_config()?;
    info!(
        "Starting scrape of {} with concurrency {}",
        config.base_url(),
        config.max_concurrency()
    );

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling outstanding genres");
                shutdown.cancel();
            }
        });
    }

    let report = scrape_impl(&config, &shutdown)
        .await
        .context("Scrape could not start")?;

    if let Some(e) = &report.error {
        error!(
            "Error during scraping: {e} ({}/{} genres written before abort)",
            report.records_written, report.total_items
        );
        return Ok(ExitCode::FAILURE);
    }
    if report.failed_flushes > 0 {
        warn!(
            "{} batch writes failed; output is missing {} genres",
            report.failed_flushes,
            report.records_received - report.records_written
        );
    }

    info!("Scraping completed in {:.2?}", report.elapsed);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_match_library_defaults() {
        let args = Args::try_parse_from(["genrescrape"]).unwrap();
        let config = args.into_config().unwrap();

        assert_eq!(config.rate_interval(), DEFAULT_RATE_INTERVAL);
        assert_eq!(config.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.rate_burst(), DEFAULT_RATE_BURST);
        assert_eq!(config.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(config.progress_interval(), DEFAULT_PROGRESS_INTERVAL);
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::try_parse_from([
            "genrescrape",
            "-j",
            "3",
            "--rate-interval-ms",
            "0",
            "--timeout-secs",
            "2",
        ])
        .unwrap();
        let config = args.into_config().unwrap();

        assert_eq!(config.max_concurrency(), 3);
        assert!(config.rate_interval().is_zero());
        assert_eq!(config.request_timeout(), Duration::from_secs(2));
    }
}
