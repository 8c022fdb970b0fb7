use anyhow::{Context, Result, bail};
use bpaf::Bpaf;
use databank_sdk::catalog::{CatalogItem, Category, ClientTrait};
use databank_sdk::models::list_manager::ListStateManager;
use databank_sdk::providers::catalog::Client;
use tracing::instrument;

use crate::config::Config;
use crate::utils::{message, render};

/// Search a collection by name
#[derive(Bpaf, Clone, Debug)]
pub struct Search {
    /// Collection to search
    #[bpaf(short, long, argument("CATEGORY"))]
    pub(super) category: Option<Category>,

    /// Display the results as a JSON array
    #[bpaf(long)]
    pub(super) json: bool,

    /// Name, or part of a name, to search for
    #[bpaf(positional("QUERY"))]
    pub(super) query: String,
}

impl Search {
    #[instrument(name = "search", skip_all, fields(query = %self.query))]
    pub async fn handle(self, config: &Config, client: Client) -> Result<()> {
        let category = self.category.unwrap_or(config.default_category);
        let query = self.query.trim();

        let manager = ListStateManager::with_category(client, category);
        let results = run_search(&manager, query).await?;

        if self.json {
            println!("{}", render::items_json(&results)?);
        } else if results.is_empty() {
            message::plain(format!("No {category} found matching '{query}'."));
        } else {
            println!("{}", render::items_table(&results));
        }
        Ok(())
    }
}

/// Search the manager's category for `query` and wait for the results.
pub(crate) async fn run_search<C>(
    manager: &ListStateManager<C>,
    query: &str,
) -> Result<Vec<CatalogItem>>
where
    C: ClientTrait + Send + Sync + 'static,
{
    let Some(request) = manager.set_search_query(query) else {
        bail!("search term must not be empty");
    };
    request.await.context("search request did not complete")?;

    let state = manager.state();
    if let Some(err) = state.search_status().error() {
        bail!("search for '{query}' failed: {err}");
    }
    Ok(state.search_results().to_vec())
}
