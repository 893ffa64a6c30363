//! Page parsing for the genre map.
//!
//! Turns the listing page into work items and a detail page into the
//! weighted lists that enrich one record.

// Sub-modules
pub mod extractors;
pub mod schema;

// Re-exports for public API
pub use extractors::{extract_style_attributes, extract_weight, hex_to_rgb, parse_detail, parse_listing};
pub use schema::{DetailPage, DisplayAttributes, Record, WeightedList, WorkItem};
