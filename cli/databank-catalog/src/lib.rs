//! HTTP client for the databank catalog service.
//!
//! This crate provides:
//! - HTTP client construction with default headers and transport timeouts
//! - The [`ClientTrait`] seam used by the list state manager
//! - Wire types for paginated and name-filtered catalog queries
//! - Error handling for catalog requests
//!
//! ## Usage
//!
//! ```ignore
//! use databank_catalog::{CatalogClient, CatalogClientConfig, Category, ClientTrait, PageNumber};
//!
//! let client = CatalogClient::new(CatalogClientConfig::default())?;
//! let page = client.fetch_page(Category::Characters, PageNumber::FIRST).await?;
//! ```

mod client;
mod config;
mod error;
mod types;

pub use client::{CatalogClient, ClientTrait};
pub use config::{CatalogClientConfig, DEFAULT_CATALOG_URL};
pub use error::{CatalogClientError, FetchError};
pub use types::{CatalogItem, Category, ItemId, Page, PageNumber, ParseCategoryError};
