//! Shared configuration constants for genrescrape
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

use std::time::Duration;

/// Default remote host serving the genre map pages
pub const DEFAULT_BASE_URL: &str = "https://everynoise.com";

/// Path of the index listing, relative to the base URL
pub const LISTING_PATH: &str = "engenremap.html";

/// Prefix and suffix of a per-genre detail page path
///
/// The detail path is `{DETAIL_PATH_PREFIX}{escaped genre}{DETAIL_PATH_SUFFIX}`.
pub const DETAIL_PATH_PREFIX: &str = "engenremap-";
pub const DETAIL_PATH_SUFFIX: &str = ".html";

/// Minimum spacing between two outbound requests: 50ms
///
/// Shared by every concurrent unit, so the whole run stays at or below
/// 20 requests per second no matter how many units are waiting.
pub const DEFAULT_RATE_INTERVAL: Duration = Duration::from_millis(50);

/// Token bucket burst capacity
///
/// With a burst of 1 the limiter degenerates to a strict minimum
/// inter-request spacing.
pub const DEFAULT_RATE_BURST: u32 = 1;

/// Batch size: 250 records
///
/// Records are flushed to the CSV sink each time this many have
/// accumulated. The result funnel uses the same value as its capacity, so
/// peak memory stays at a few hundred records regardless of run size.
pub const DEFAULT_BATCH_SIZE: usize = 250;

/// HTTP client request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Idle keep-alive connections retained per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 100;

/// How long an idle keep-alive connection is kept
pub const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Log a progress line every this many processed genres
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// User agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Delimiter joining the elements of a weighted list inside one CSV cell
pub const LIST_DELIMITER: &str = "|";

/// Header row of the output CSV, in column order
pub const CSV_HEADERS: [&str; 13] = [
    "Genre",
    "Playlist",
    "FontSize",
    "ColorHex",
    "ColorRGB",
    "Top",
    "Left",
    "ArtistWeights",
    "Artists",
    "SimWeights",
    "SimGenres",
    "OppWeights",
    "OppGenres",
];
