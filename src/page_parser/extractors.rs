//! Extraction of genre records from the map pages
//!
//! Both page kinds share the same markup: every genre or artist is a
//! `div.genre` whose inline `style` positions and sizes it on the map.
//! These functions are synchronous and pure; the pipeline calls them from
//! inside a dispatched unit once the page body is in memory.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::schema::{DetailPage, DisplayAttributes, WeightedList, WorkItem};
use crate::scrape_engine::scrape_types::{ScrapeError, ScrapeResult};

lazy_static! {
    // These selectors are hardcoded and syntactically valid CSS selectors.
    static ref SCANME_SELECTOR: Selector =
        Selector::parse("div.genre.scanme")
            .expect("BUG: hardcoded CSS selector 'div.genre.scanme' is invalid");

    static ref RELATED_SELECTOR: Selector =
        Selector::parse("div.genre:not(.scanme)")
            .expect("BUG: hardcoded CSS selector 'div.genre:not(.scanme)' is invalid");

    static ref ANCHOR_SELECTOR: Selector =
        Selector::parse("a")
            .expect("BUG: hardcoded CSS selector 'a' is invalid");

    static ref FONT_SIZE_RE: Regex =
        Regex::new(r"font-size:([^;]+)").expect("BUG: hardcoded font-size regex is invalid");

    static ref COLOR_RE: Regex =
        Regex::new(r"color:([^;]+)").expect("BUG: hardcoded color regex is invalid");

    static ref TOP_RE: Regex =
        Regex::new(r"top:([^;]+)").expect("BUG: hardcoded top regex is invalid");

    static ref LEFT_RE: Regex =
        Regex::new(r"left:([^;]+)").expect("BUG: hardcoded left regex is invalid");
}

/// Parse the index listing into work items
///
/// # Errors
/// Returns `ScrapeError::Parse` when the page holds no genre entries; a run
/// cannot start without them.
pub fn parse_listing(html: &str) -> ScrapeResult<Vec<WorkItem>> {
    let document = Html::parse_document(html);

    let items: Vec<WorkItem> = document
        .select(&SCANME_SELECTOR)
        .map(|element| {
            let playlist = element
                .select(&ANCHOR_SELECTOR)
                .next()
                .and_then(|a| a.value().attr("href"))
                .unwrap_or_default()
                .to_string();
            let style = element.value().attr("style").unwrap_or_default();

            WorkItem {
                name: entry_name(&element),
                playlist,
                display: extract_style_attributes(style),
            }
        })
        .collect();

    if items.is_empty() {
        return Err(ScrapeError::Parse(
            "listing contains no genre entries".to_string(),
        ));
    }
    Ok(items)
}

/// Parse a genre's detail page
///
/// Artists are the `scanme` entries. The remaining `div.genre` entries are
/// related genres: ids containing `nearby` are similar, ids containing
/// `mirror` are opposite, anything else is skipped. Artist weights are
/// returned as found on this page; reconciling them with the run-wide
/// cache is the caller's job.
///
/// # Errors
/// Returns `ScrapeError::Parse` for a blank document.
pub fn parse_detail(html: &str) -> ScrapeResult<DetailPage> {
    if html.trim().is_empty() {
        return Err(ScrapeError::Parse("detail page is empty".to_string()));
    }
    let document = Html::parse_document(html);

    // The last matching anchor wins
    let playlist = document
        .select(&ANCHOR_SELECTOR)
        .filter(|a| a.text().collect::<String>() == "playlist")
        .filter_map(|a| a.value().attr("href"))
        .last()
        .map(str::to_string);

    let mut artists = WeightedList::new();
    for element in document.select(&SCANME_SELECTOR) {
        let style = element.value().attr("style").unwrap_or_default();
        artists.push(extract_weight(style), entry_name(&element));
    }

    let mut similar = WeightedList::new();
    let mut opposite = WeightedList::new();
    for element in document.select(&RELATED_SELECTOR) {
        let id = element.value().attr("id").unwrap_or_default();
        let style = element.value().attr("style").unwrap_or_default();
        if id.contains("nearby") {
            similar.push(extract_weight(style), entry_name(&element));
        } else if id.contains("mirror") {
            opposite.push(extract_weight(style), entry_name(&element));
        }
    }

    Ok(DetailPage {
        playlist,
        artists,
        similar,
        opposite,
    })
}

/// Visible name of a map entry: trimmed text without the trailing `»` link marker
fn entry_name(element: &ElementRef<'_>) -> String {
    let text = element.text().collect::<String>();
    let trimmed = text.trim();
    trimmed.strip_suffix('»').unwrap_or(trimmed).to_string()
}

fn capture(re: &Regex, style: &str) -> Option<String> {
    re.captures(style)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Pull size, color and position out of an inline style
///
/// Missing properties come back as empty strings. The RGB rendering is only
/// filled in when a color is present.
#[must_use]
pub fn extract_style_attributes(style: &str) -> DisplayAttributes {
    let mut attrs = DisplayAttributes {
        font_size: capture(&FONT_SIZE_RE, style).unwrap_or_default(),
        top: capture(&TOP_RE, style).unwrap_or_default(),
        left: capture(&LEFT_RE, style).unwrap_or_default(),
        ..DisplayAttributes::default()
    };

    if let Some(color) = capture(&COLOR_RE, style) {
        let (r, g, b) = hex_to_rgb(&color);
        attrs.color_rgb = format!("rgb({r}, {g}, {b})");
        attrs.color_hex = color;
    }
    attrs
}

/// Convert `#rrggbb` to its components
///
/// Each component takes up to two hex digits, left to right, so short forms
/// like `#abc` give `(171, 12, 0)`. Reading stops at the first component
/// with no digits and the rest stay 0.
#[must_use]
pub fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
    let mut rgb = [0u8; 3];
    let Some(mut rest) = hex.strip_prefix('#') else {
        return (0, 0, 0);
    };

    for slot in &mut rgb {
        let width = rest
            .bytes()
            .take(2)
            .take_while(u8::is_ascii_hexdigit)
            .count();
        if width == 0 {
            break;
        }
        let (digits, tail) = rest.split_at(width);
        match u8::from_str_radix(digits, 16) {
            Ok(value) => *slot = value,
            Err(_) => break,
        }
        rest = tail;
    }
    (rgb[0], rgb[1], rgb[2])
}

/// Relative weight of an entry: its font size without the percent sign
#[must_use]
pub fn extract_weight(style: &str) -> String {
    capture(&FONT_SIZE_RE, style)
        .map(|size| size.strip_suffix('%').unwrap_or(&size).to_string())
        .unwrap_or_default()
}
