use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use databank_sdk::providers::catalog::{
    CatalogClient,
    CatalogClientConfig,
    Client,
    DATABANK_CATALOG_MOCK_VAR,
    MockClient,
};
use tracing::debug;

use crate::config::Config;

/// User agent sent to the catalog unless configured otherwise
pub const DEFAULT_USER_AGENT: &str = concat!("databank-cli/", env!("CARGO_PKG_VERSION"));

/// Initialize the catalog client
///
/// - Initialize a mock client if `$DATABANK_CATALOG_MOCK` points to a file of mock responses
/// - Initialize a real client otherwise
pub fn init_catalog_client(config: &Config) -> Result<Client> {
    if let Ok(path_str) = std::env::var(DATABANK_CATALOG_MOCK_VAR) {
        let path = PathBuf::from(path_str);
        if !path.exists() {
            bail!("path to mock data file doesn't exist: {}", path.display());
        }

        debug!(mock_data_path = %path.display(), "using mock catalog client");
        let client = MockClient::from_file(&path).context("could not load mock responses")?;
        return Ok(client.into());
    }

    let client_config = CatalogClientConfig {
        catalog_url: config.catalog_url.clone(),
        user_agent: Some(
            config
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        ),
        extra_headers: config.extra_headers.clone(),
    };

    debug!(catalog_url = %client_config.catalog_url, "using catalog client");
    let client = CatalogClient::new(client_config).context("could not create catalog client")?;
    Ok(client.into())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn uses_configured_catalog_url() {
        let config = Config {
            catalog_url: "http://localhost:8080/api/v1".to_string(),
            ..Config::default()
        };

        let client = temp_env::with_var_unset(DATABANK_CATALOG_MOCK_VAR, || {
            init_catalog_client(&config)
        })
        .unwrap();

        match client {
            Client::Catalog(client) => assert_eq!(client.catalog_url(), config.catalog_url),
            Client::Mock(_) => panic!("expected catalog client"),
        }
    }

    #[test]
    fn invalid_catalog_url_is_an_error() {
        let config = Config {
            catalog_url: "not a url".to_string(),
            ..Config::default()
        };

        let result = temp_env::with_var_unset(DATABANK_CATALOG_MOCK_VAR, || {
            init_catalog_client(&config)
        });
        assert!(result.is_err());
    }

    #[test]
    fn mock_var_selects_mock_client() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("responses.json");
        fs::write(&path, r#"[{ "kind": "search", "items": [] }]"#).unwrap();

        let client = temp_env::with_var(DATABANK_CATALOG_MOCK_VAR, Some(&path), || {
            init_catalog_client(&Config::default())
        })
        .unwrap();

        match client {
            Client::Mock(client) => assert_eq!(client.remaining_responses(), 1),
            Client::Catalog(_) => panic!("expected mock client"),
        }
    }

    #[test]
    fn missing_mock_file_is_an_error() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("missing.json");

        let result = temp_env::with_var(DATABANK_CATALOG_MOCK_VAR, Some(&path), || {
            init_catalog_client(&Config::default())
        });
        assert!(result.is_err());
    }
}
