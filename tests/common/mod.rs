//! Test utilities and helper functions for the genrescrape test suite

use genrescrape::scrape_engine::{PageFetcher, ScrapeError, ScrapeResult};
use genrescrape::{detail_url, listing_url};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub const BASE_URL: &str = "https://genres.test";

/// One artist or related-genre entry on a detail page
#[allow(dead_code)]
pub struct Entry<'a> {
    pub name: &'a str,
    pub weight: &'a str,
}

/// Creates a listing page with one map entry per genre
#[allow(dead_code)]
pub fn listing_html(genres: &[&str]) -> String {
    let entries: String = genres
        .iter()
        .enumerate()
        .map(|(i, genre)| {
            format!(
                r##"<div id="item{i}" class="genre scanme" style="color: #ff8000; top: {top}px; left: {left}px; font-size: 1{i:02}%">{genre}<a class="navlink" href="engenremap-{genre}.html">»</a></div>"##,
                top = 100 + i,
                left = 200 + i,
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Genre map</title></head>
<body>
<div class="canvas">{entries}</div>
</body>
</html>"#
    )
}

/// Creates a detail page with artists, similar and opposite genres
#[allow(dead_code)]
pub fn detail_html(playlist: &str, artists: &[Entry], similar: &[Entry], opposite: &[Entry]) -> String {
    let mut body = format!(r#"<a href="{playlist}">playlist</a>"#);
    for (i, a) in artists.iter().enumerate() {
        body.push_str(&format!(
            r#"<div id="item{i}" class="genre scanme" style="top: {i}px; font-size: {}%">{}»</div>"#,
            a.weight, a.name
        ));
    }
    for (i, g) in similar.iter().enumerate() {
        body.push_str(&format!(
            r#"<div id="nearby{i}" class="genre" style="font-size: {}%">{}»</div>"#,
            g.weight, g.name
        ));
    }
    for (i, g) in opposite.iter().enumerate() {
        body.push_str(&format!(
            r#"<div id="mirror{i}" class="genre" style="font-size: {}%">{}»</div>"#,
            g.weight, g.name
        ));
    }

    format!("<!DOCTYPE html>\n<html><body>{body}</body></html>")
}

/// Detail page with one artist named after the genre
#[allow(dead_code)]
pub fn simple_detail(genre: &str) -> String {
    detail_html(
        &format!("spotify:playlist:{genre}"),
        &[Entry {
            name: &format!("{genre} artist"),
            weight: "50",
        }],
        &[],
        &[],
    )
}

enum Response {
    Html(String),
    Fail(String),
}

/// In-memory `PageFetcher` with scripted responses
///
/// Records every request and the highest number of fetches in flight at
/// once.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, Response>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<(String, Instant)>>,
}

#[allow(dead_code)]
impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listing of `genres`, each with a one-artist detail page
    pub fn with_genres(genres: &[&str]) -> Self {
        let mut fetcher = Self::new().listing(genres);
        for genre in genres {
            fetcher = fetcher.detail(genre, simple_detail(genre));
        }
        fetcher
    }

    pub fn listing(mut self, genres: &[&str]) -> Self {
        self.pages
            .insert(listing_url(BASE_URL), Response::Html(listing_html(genres)));
        self
    }

    pub fn listing_failure(mut self, message: &str) -> Self {
        self.pages
            .insert(listing_url(BASE_URL), Response::Fail(message.to_string()));
        self
    }

    pub fn raw_listing(mut self, html: &str) -> Self {
        self.pages
            .insert(listing_url(BASE_URL), Response::Html(html.to_string()));
        self
    }

    pub fn detail(mut self, genre: &str, html: String) -> Self {
        self.pages
            .insert(detail_url(BASE_URL, genre), Response::Html(html));
        self
    }

    pub fn failing_detail(mut self, genre: &str, message: &str) -> Self {
        self.pages.insert(
            detail_url(BASE_URL, genre),
            Response::Fail(message.to_string()),
        );
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn detail_delay(mut self, genre: &str, delay: Duration) -> Self {
        self.delays.insert(detail_url(BASE_URL, genre), delay);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requested(&self, url: &str) -> bool {
        self.requests.lock().iter().any(|(u, _)| u == url)
    }

    pub fn request_times(&self) -> Vec<Instant> {
        self.requests.lock().iter().map(|(_, t)| *t).collect()
    }
}

impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(&self, url: &str) -> ScrapeResult<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.requests.lock().push((url.to_string(), Instant::now()));

        let delay = self.delays.get(url).copied().unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.pages.get(url) {
            Some(Response::Html(html)) => Ok(html.clone()),
            Some(Response::Fail(message)) => Err(ScrapeError::Network(message.clone())),
            None => Err(ScrapeError::Network(format!("{url} returned status 404"))),
        }
    }
}

/// Data rows of a CSV file written by the pipeline, keyed by genre
#[allow(dead_code)]
pub fn read_rows(path: &Path) -> (Vec<String>, Vec<csv::StringRecord>) {
    let mut reader = csv::Reader::from_path(path).expect("output CSV should be readable");
    let headers = reader
        .headers()
        .expect("output CSV should have a header row")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .expect("output CSV rows should parse");
    (headers, rows)
}

/// Genre names, one per generated item
#[allow(dead_code)]
pub fn genre_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("genre{i:03}")).collect()
}
