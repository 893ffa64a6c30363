//! The full pipeline over real HTTP against a mock server

mod common;

use common::{Entry, detail_html, listing_html, read_rows, simple_detail};
use genrescrape::scrape_engine::{HttpFetcher, NoOpProgress, ScrapeError, scrape_pages};
use genrescrape::{PageFetcher, ScrapeConfig, WeightedList};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn config(base_url: &str, output: &std::path::Path) -> ScrapeConfig {
    ScrapeConfig::builder()
        .output_path(output)
        .base_url(base_url)
        .rate_interval(Duration::from_millis(1))
        .max_concurrency(4)
        .request_timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_http_run_writes_every_genre() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("genres.csv");

    let listing = server
        .mock("GET", "/engenremap.html")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(listing_html(&["rock", "deep house", "jazz"]))
        .expect(1)
        .create_async()
        .await;
    let rock = server
        .mock("GET", "/engenremap-rock.html")
        .with_body(detail_html(
            "spotify:playlist:rock",
            &[
                Entry { name: "Band A", weight: "90" },
                Entry { name: "Band B", weight: "40" },
            ],
            &[Entry { name: "hard rock", weight: "70" }],
            &[Entry { name: "ambient", weight: "20" }],
        ))
        .expect(1)
        .create_async()
        .await;
    // Spaces are dropped from the page name
    let house = server
        .mock("GET", "/engenremap-deephouse.html")
        .with_body(simple_detail("deep house"))
        .expect(1)
        .create_async()
        .await;
    let jazz = server
        .mock("GET", "/engenremap-jazz.html")
        .with_body(simple_detail("jazz"))
        .expect(1)
        .create_async()
        .await;

    let config = config(&server.url(), &output);
    let fetcher = Arc::new(HttpFetcher::new(&config).unwrap());
    let report = scrape_pages(&config, fetcher, Arc::new(NoOpProgress), CancellationToken::new())
        .await
        .unwrap();

    listing.assert_async().await;
    rock.assert_async().await;
    house.assert_async().await;
    jazz.assert_async().await;

    assert!(report.is_success());
    assert_eq!(report.records_written, 3);
    assert_eq!(report.flushes, vec![3]);

    let (_, rows) = read_rows(&output);
    let rock_row = rows.iter().find(|r| &r[0] == "rock").unwrap();
    assert_eq!(&rock_row[1], "spotify:playlist:rock");
    let artists = WeightedList::from_joined(&rock_row[7], &rock_row[8]).unwrap();
    assert_eq!(artists.names(), ["Band A", "Band B"]);
    assert_eq!(&rock_row[9], "70");
    assert_eq!(&rock_row[10], "hard rock");
    assert_eq!(&rock_row[11], "20");
    assert_eq!(&rock_row[12], "ambient");
    assert!(rows.iter().any(|r| &r[0] == "deep house"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_http_error_status_aborts_run() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("genres.csv");

    server
        .mock("GET", "/engenremap.html")
        .with_body(listing_html(&["good", "broken"]))
        .create_async()
        .await;
    server
        .mock("GET", "/engenremap-good.html")
        .with_body(simple_detail("good"))
        .create_async()
        .await;
    server
        .mock("GET", "/engenremap-broken.html")
        .with_status(500)
        .create_async()
        .await;

    let config = ScrapeConfig::builder()
        .output_path(&output)
        .base_url(server.url())
        .rate_interval(Duration::ZERO)
        .max_concurrency(1)
        .build()
        .unwrap();
    let fetcher = Arc::new(HttpFetcher::new(&config).unwrap());
    let report = scrape_pages(&config, fetcher, Arc::new(NoOpProgress), CancellationToken::new())
        .await
        .unwrap();

    match &report.error {
        Some(ScrapeError::Item { genre, source }) => {
            assert_eq!(genre, "broken");
            assert!(source.to_string().contains("500"));
        }
        other => panic!("expected an item error, got {other:?}"),
    }
    let (_, rows) = read_rows(&output);
    assert!(rows.iter().all(|r| &r[0] != "broken"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_http_listing_error_is_fatal() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();

    server
        .mock("GET", "/engenremap.html")
        .with_status(503)
        .create_async()
        .await;

    let config = config(&server.url(), &dir.path().join("genres.csv"));
    let fetcher = Arc::new(HttpFetcher::new(&config).unwrap());
    let result =
        scrape_pages(&config, fetcher, Arc::new(NoOpProgress), CancellationToken::new()).await;

    assert!(matches!(result, Err(ScrapeError::Network(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_http_fetcher_sends_user_agent() {
    let mut server = mockito::Server::new_async().await;
    let page = server
        .mock("GET", "/page.html")
        .match_header("user-agent", "genre-test/2.0")
        .with_body("<html></html>")
        .create_async()
        .await;

    let config = ScrapeConfig::builder()
        .output_path("unused.csv")
        .base_url(server.url())
        .user_agent("genre-test/2.0")
        .build()
        .unwrap();
    let fetcher = HttpFetcher::new(&config).unwrap();
    let body = fetcher
        .fetch_page(&format!("{}/page.html", server.url()))
        .await
        .unwrap();

    assert_eq!(body, "<html></html>");
    page.assert_async().await;
}
