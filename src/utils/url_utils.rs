//! URL construction utilities.
//!
//! All pages live under one base URL; the listing has a fixed path and each
//! genre's detail page is addressed by its escaped name.

use super::constants::{DETAIL_PATH_PREFIX, DETAIL_PATH_SUFFIX, LISTING_PATH};

/// Normalize a user-supplied base URL
///
/// Adds `https://` when no scheme is present and strips trailing slashes.
#[must_use]
pub fn normalize_base_url(url: &str) -> String {
    let url = url.trim();
    let with_scheme = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    with_scheme.trim_end_matches('/').to_string()
}

/// URL of the index listing page
#[must_use]
pub fn listing_url(base_url: &str) -> String {
    format!("{base_url}/{LISTING_PATH}")
}

/// Path segment identifying a genre's detail page
///
/// Spaces are removed first, then the rest is query-escaped: ASCII
/// alphanumerics and `-_.~` pass through, every other byte is
/// percent-encoded.
#[must_use]
pub fn genre_page_id(genre: &str) -> String {
    let compact: String = genre.chars().filter(|c| *c != ' ').collect();
    urlencoding::encode(&compact).into_owned()
}

/// URL of a genre's detail page
#[must_use]
pub fn detail_url(base_url: &str, genre: &str) -> String {
    format!(
        "{base_url}/{DETAIL_PATH_PREFIX}{}{DETAIL_PATH_SUFFIX}",
        genre_page_id(genre)
    )
}
