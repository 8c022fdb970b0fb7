use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use databank_sdk::catalog::{Category, DEFAULT_CATALOG_URL};
use log::debug;
use serde::Deserialize;

/// Name of the databank config directory
const DATABANK_DIR_NAME: &str = "databank";
const DATABANK_CONFIG_DIR_VAR: &str = "DATABANK_CONFIG_DIR";
pub const DATABANK_CONFIG_FILE: &str = "databank.toml";

/// Prefix of environment variables overriding config values
const DATABANK_ENV_PREFIX: &str = "DATABANK_";

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// The URL of the catalog instance to use
    // Using a URL here adds an extra trailing slash,
    // so just use a String.
    pub catalog_url: String,

    /// Collection used when a command doesn't name one
    pub default_category: Category,

    /// Value of the `User-Agent` header sent to the catalog
    pub user_agent: Option<String>,

    /// How many pages `databank list` loads by default
    pub page_limit: u32,

    /// Additional headers sent with every catalog request
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            default_category: Category::default(),
            user_agent: None,
            page_limit: 1,
            extra_headers: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The directory `databank.toml` is read from.
    ///
    /// `$DATABANK_CONFIG_DIR` if set, the platform config directory otherwise.
    fn config_dir() -> Option<PathBuf> {
        match env::var(DATABANK_CONFIG_DIR_VAR) {
            Ok(dir) => {
                debug!("`${DATABANK_CONFIG_DIR_VAR}` set: {dir}");
                Some(dir.into())
            },
            Err(_) => {
                let dir = dirs::config_dir().map(|dir| dir.join(DATABANK_DIR_NAME));
                debug!("`${DATABANK_CONFIG_DIR_VAR}` not set, using {dir:?}");
                dir
            },
        }
    }

    fn read_raw_config() -> Result<HierarchicalConfig> {
        let defaults = Config::default();
        let mut builder = HierarchicalConfig::builder()
            .set_default("catalog_url", defaults.catalog_url)?
            .set_default("default_category", defaults.default_category.to_string())?
            .set_default("page_limit", i64::from(defaults.page_limit))?;

        if let Some(config_dir) = Self::config_dir() {
            builder = builder.add_source(
                config::File::from(config_dir.join(DATABANK_CONFIG_FILE))
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        // override via env variables
        let databank_envs = env::vars()
            .filter_map(|(k, v)| {
                k.strip_prefix(DATABANK_ENV_PREFIX)
                    .map(|k| (k.to_owned(), v))
            })
            .collect::<HashMap<_, _>>();

        let final_config = builder
            .add_source(
                Environment::default()
                    .source(Some(databank_envs))
                    .try_parsing(true),
            )
            .build()?;
        Ok(final_config)
    }

    /// Creates a [Config] from defaults, the config file and the environment
    pub fn parse() -> Result<Config> {
        let final_config = Self::read_raw_config()?;
        let cli_config: Config = final_config
            .try_deserialize()
            .context("Could not parse config")?;
        Ok(cli_config)
    }
}
