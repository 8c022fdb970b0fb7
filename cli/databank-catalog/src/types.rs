//! Catalog interaction types.
//!
//! The public types are the normalized domain model handed to consumers.
//! The `Raw*` types mirror the JSON documents served by the catalog and
//! never leave this crate.

use std::fmt::Display;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Identity of a catalog record.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    pub fn get(self) -> i64 {
        self.0
    }
}

/// A single normalized record of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub image_ref: String,
}

/// One page of the unfiltered collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<CatalogItem>,
    pub has_next_page: bool,
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// 1-based page index of the unfiltered collection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct PageNumber(NonZeroU32);

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(NonZeroU32::MIN);

    /// Returns `None` for `0`, pages are counted from 1.
    pub fn new(page: u32) -> Option<Self> {
        NonZeroU32::new(page).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// The collections exposed by the catalog.
///
/// Serialized as the lowercase collection name,
/// deserialized case-insensitively like [`FromStr`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Category {
    #[default]
    Characters,
    Creatures,
    Droids,
    Locations,
    Organizations,
    Species,
    Vehicles,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Characters,
        Category::Creatures,
        Category::Droids,
        Category::Locations,
        Category::Organizations,
        Category::Species,
        Category::Vehicles,
    ];

    /// The url path segment of this collection.
    pub fn path_segment(self) -> &'static str {
        match self {
            Category::Characters => "characters",
            Category::Creatures => "creatures",
            Category::Droids => "droids",
            Category::Locations => "locations",
            Category::Organizations => "organizations",
            Category::Species => "species",
            Category::Vehicles => "vehicles",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_segment())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown category '{0}', expected one of: characters, creatures, droids, locations, organizations, species, vehicles")]
pub struct ParseCategoryError(String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.path_segment().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

impl TryFrom<String> for Category {
    type Error = ParseCategoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// A record as served by the catalog.
#[derive(Debug, Deserialize)]
pub(crate) struct RawItem {
    #[serde(rename = "_id")]
    id: ItemId,
    name: String,
    image: String,
}

impl From<RawItem> for CatalogItem {
    fn from(raw: RawItem) -> Self {
        CatalogItem {
            id: raw.id,
            name: raw.name,
            image_ref: raw.image,
        }
    }
}

/// Response document of `/{category}?page={n}`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawPage {
    data: Vec<RawItem>,
    info: RawPageInfo,
}

#[derive(Debug, Deserialize)]
struct RawPageInfo {
    next: Option<String>,
}

impl From<RawPage> for Page {
    fn from(raw: RawPage) -> Self {
        Page {
            has_next_page: raw.info.next.is_some(),
            items: raw.data.into_iter().map(CatalogItem::from).collect(),
        }
    }
}
