//! Configuration module for scraping
//!
//! This module provides the `ScrapeConfig` struct and its type-safe builder
//! for configuring a run with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{ScrapeConfigBuilder, WithBaseUrl, WithOutputPath};
pub use types::ScrapeConfig;
