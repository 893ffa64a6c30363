//! Record types produced by the page parser and carried through the pipeline.

use serde::{Deserialize, Serialize};

use crate::scrape_engine::ArtistWeightCache;
use crate::scrape_engine::scrape_types::{ScrapeError, ScrapeResult};
use crate::utils::LIST_DELIMITER;

/// Display attributes of a genre on the index map, taken from its inline style
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayAttributes {
    pub font_size: String,
    pub color_hex: String,
    pub color_rgb: String,
    pub top: String,
    pub left: String,
}

/// One genre found in the index listing, awaiting enrichment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub name: String,
    pub playlist: String,
    pub display: DisplayAttributes,
}

/// Two positionally aligned lists: a weight per name
///
/// The lists only grow through [`WeightedList::push`], so they are always
/// the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedList {
    weights: Vec<String>,
    names: Vec<String>,
}

impl WeightedList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, weight: impl Into<String>, name: impl Into<String>) {
        self.weights.push(weight.into());
        self.names.push(name.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn weights(&self) -> &[String] {
        &self.weights
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate `(weight, name)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.weights
            .iter()
            .zip(&self.names)
            .map(|(w, n)| (w.as_str(), n.as_str()))
    }

    /// Weights joined into a single CSV cell
    #[must_use]
    pub fn joined_weights(&self) -> String {
        self.weights.join(LIST_DELIMITER)
    }

    /// Names joined into a single CSV cell
    #[must_use]
    pub fn joined_names(&self) -> String {
        self.names.join(LIST_DELIMITER)
    }

    /// Rebuild a list from its two joined cells
    ///
    /// Two empty cells decode to an empty list. Cells that split into a
    /// different number of elements are rejected.
    pub fn from_joined(weights: &str, names: &str) -> ScrapeResult<Self> {
        if weights.is_empty() && names.is_empty() {
            return Ok(Self::default());
        }
        let weights: Vec<String> = weights.split(LIST_DELIMITER).map(str::to_string).collect();
        let names: Vec<String> = names.split(LIST_DELIMITER).map(str::to_string).collect();
        if weights.len() != names.len() {
            return Err(ScrapeError::Parse(format!(
                "weighted list misaligned: {} weights for {} names",
                weights.len(),
                names.len()
            )));
        }
        Ok(Self { weights, names })
    }
}

/// Everything a genre's detail page contributes, before artist weights are
/// reconciled against the run-wide cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailPage {
    pub playlist: Option<String>,
    pub artists: WeightedList,
    pub similar: WeightedList,
    pub opposite: WeightedList,
}

/// A fully enriched genre, ready for the output sink
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub playlist: String,
    pub display: DisplayAttributes,
    pub artists: WeightedList,
    pub similar: WeightedList,
    pub opposite: WeightedList,
}

impl Record {
    /// Merge a listing entry with its detail page
    ///
    /// Every artist weight goes through the cache, so an artist seen on
    /// several genre pages carries the weight it was first recorded with.
    #[must_use]
    pub fn enrich(item: WorkItem, detail: DetailPage, cache: &ArtistWeightCache) -> Self {
        let mut artists = WeightedList::new();
        for (weight, artist) in detail.artists.iter() {
            let weight = cache.get_or_set(artist, weight);
            artists.push(weight, artist);
        }

        Self {
            name: item.name,
            playlist: detail.playlist.unwrap_or_default(),
            display: item.display,
            artists,
            similar: detail.similar,
            opposite: detail.opposite,
        }
    }

    /// CSV row in header order
    #[must_use]
    pub fn to_row(&self) -> [String; 13] {
        [
            self.name.clone(),
            self.playlist.clone(),
            self.display.font_size.clone(),
            self.display.color_hex.clone(),
            self.display.color_rgb.clone(),
            self.display.top.clone(),
            self.display.left.clone(),
            self.artists.joined_weights(),
            self.artists.joined_names(),
            self.similar.joined_weights(),
            self.similar.joined_names(),
            self.opposite.joined_weights(),
            self.opposite.joined_names(),
        ]
    }
}
