pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{detail_url, genre_page_id, listing_url, normalize_base_url};
