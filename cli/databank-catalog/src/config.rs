//! Configuration types for catalog client construction.

use std::collections::BTreeMap;

/// Base URL of the public databank service.
pub const DEFAULT_CATALOG_URL: &str = "https://starwars-databank-server.vercel.app/api/v1";

/// Configuration for catalog client construction.
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// Base URL for the catalog API.
    pub catalog_url: String,
    /// Optional user agent sent with every request.
    pub user_agent: Option<String>,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
        }
    }
}
