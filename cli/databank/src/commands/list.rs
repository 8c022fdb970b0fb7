use std::num::NonZeroU32;

use anyhow::{Context, Result, bail};
use bpaf::Bpaf;
use databank_sdk::catalog::{Category, ClientTrait};
use databank_sdk::models::list_manager::ListStateManager;
use databank_sdk::providers::catalog::Client;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::utils::{message, render};

/// List the items of a collection
#[derive(Bpaf, Clone, Debug)]
pub struct List {
    /// Collection to list
    #[bpaf(short, long, argument("CATEGORY"))]
    pub(super) category: Option<Category>,

    /// Number of pages to load (default: 'page_limit' config value)
    #[bpaf(long, argument("N"))]
    pub(super) pages: Option<NonZeroU32>,

    /// Display the items as a JSON array
    #[bpaf(long)]
    pub(super) json: bool,
}

impl List {
    #[instrument(name = "list", skip_all)]
    pub async fn handle(self, config: &Config, client: Client) -> Result<()> {
        let category = self.category.unwrap_or(config.default_category);
        let pages = self
            .pages
            .map_or(config.page_limit.max(1), NonZeroU32::get);

        let manager = ListStateManager::with_category(client, category);
        let loaded = load_pages(&manager, pages).await;

        // Render what we have no matter what, then indicate whether loading failed
        let state = manager.state();
        if self.json {
            println!("{}", render::items_json(state.items())?);
        } else if state.items().is_empty() {
            if loaded.is_ok() {
                message::plain(format!("No {category} found."));
            }
        } else {
            println!("{}", render::items_table(state.items()));
            if loaded.is_ok() && state.can_load_more() {
                message::plain(format!(
                    "More {category} are available, use '--pages {}' to see them.",
                    pages.saturating_add(1)
                ));
            }
        }

        loaded
    }
}

/// Load up to `pages` pages into `manager`.
///
/// Stops early once the collection is exhausted.
/// A failed page ends loading with the fetch error,
/// items of earlier pages stay in the state.
pub(crate) async fn load_pages<C>(manager: &ListStateManager<C>, pages: u32) -> Result<()>
where
    C: ClientTrait + Send + Sync + 'static,
{
    for _ in 0..pages {
        let Some(request) = manager.load_next_page() else {
            debug!("no more pages to load");
            break;
        };
        request.await.context("page request did not complete")?;

        let state = manager.state();
        if let Some(err) = state.feed_status().error() {
            bail!("failed to load {}: {err}", state.category());
        }
    }
    Ok(())
}
