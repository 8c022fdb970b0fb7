use anyhow::{Context, Result, bail};
use bpaf::Bpaf;
use databank_sdk::catalog::{Category, ClientTrait};
use databank_sdk::models::list_manager::ListStateManager;
use databank_sdk::providers::catalog::Client;
use indoc::indoc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, instrument};

use crate::config::Config;
use crate::utils::{message, render};

const BROWSE_HELP: &str = indoc! {"
    Commands:
      more, <enter>     load the next page
      /TEXT             search the collection for TEXT
      /                 leave search mode
      reset             reload the collection from the first page
      category NAME     switch to another collection
      show              show the current list again
      state             print the list state as JSON
      help              show this message
      quit              leave"
};

/// Browse a collection interactively
#[derive(Bpaf, Clone, Debug)]
pub struct Browse {
    /// Collection to start with
    #[bpaf(short, long, argument("CATEGORY"))]
    pub(super) category: Option<Category>,
}

impl Browse {
    #[instrument(name = "browse", skip_all)]
    pub async fn handle(self, config: &Config, client: Client) -> Result<()> {
        let category = self.category.unwrap_or(config.default_category);
        let session = Session::new(ListStateManager::with_category(client, category));

        let mut updates = session.manager.subscribe();
        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let state = updates.borrow_and_update();
                debug!(
                    category = %state.category(),
                    items = state.items().len(),
                    feed = ?state.feed_status(),
                    search = ?state.search_status(),
                    "list state changed"
                );
            }
        });

        session.load_more().await?;
        println!("{}", render::list_view(&session.manager.state()));
        message::plain("Type 'help' for a list of commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            eprint!("databank> ");
            let Some(line) = lines.next_line().await.context("failed to read input")? else {
                break;
            };

            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(e) => {
                    message::error(e);
                    continue;
                },
            };

            match session.execute(command).await? {
                Flow::Quit => break,
                Flow::Continue => {},
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum BrowseCommand {
    More,
    Search(String),
    ClearSearch,
    Reset,
    SwitchCategory(Category),
    Show,
    State,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<BrowseCommand> {
    let line = line.trim();

    if let Some(query) = line.strip_prefix('/') {
        let query = query.trim();
        if query.is_empty() {
            return Ok(BrowseCommand::ClearSearch);
        }
        return Ok(BrowseCommand::Search(query.to_string()));
    }

    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    };

    let command = match (command, argument) {
        ("" | "more" | "m", "") => BrowseCommand::More,
        ("reset", "") => BrowseCommand::Reset,
        ("category" | "c", "") => bail!("missing category name, e.g. 'category droids'"),
        ("category" | "c", name) => BrowseCommand::SwitchCategory(name.parse()?),
        ("show" | "s", "") => BrowseCommand::Show,
        ("state", "") => BrowseCommand::State,
        ("help" | "?", "") => BrowseCommand::Help,
        ("quit" | "q" | "exit", "") => BrowseCommand::Quit,
        _ => bail!("unknown command '{line}', type 'help' for a list of commands"),
    };
    Ok(command)
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

struct Session<C> {
    manager: ListStateManager<C>,
}

impl<C> Session<C>
where
    C: ClientTrait + Send + Sync + 'static,
{
    fn new(manager: ListStateManager<C>) -> Self {
        Self { manager }
    }

    /// Load the next page if possible, explaining why not otherwise.
    ///
    /// Fetch failures end up in the list state rather than in the result.
    async fn load_more(&self) -> Result<()> {
        match self.manager.load_next_page() {
            Some(request) => request.await.context("page request did not complete")?,
            None => {
                let state = self.manager.state();
                if state.is_searching() {
                    message::warning("Leave search mode with '/' to load more items.");
                } else if state.feed_status().is_loading() {
                    message::warning("Still loading the previous page.");
                } else {
                    message::warning(format!("All {} are loaded.", state.category()));
                }
            },
        }
        Ok(())
    }

    async fn execute(&self, command: BrowseCommand) -> Result<Flow> {
        debug!(?command, "executing browse command");
        match command {
            BrowseCommand::More => self.load_more().await?,
            BrowseCommand::Search(query) => {
                if let Some(request) = self.manager.set_search_query(&query) {
                    request.await.context("search request did not complete")?;
                }
            },
            BrowseCommand::ClearSearch => {
                self.manager.set_search_query("");
            },
            BrowseCommand::Reset => {
                self.manager.reset();
                self.load_more().await?;
            },
            BrowseCommand::SwitchCategory(category) => {
                self.manager.switch_category(category);
                self.load_more().await?;
            },
            BrowseCommand::Show => {},
            BrowseCommand::State => {
                let state = serde_json::to_string_pretty(&self.manager.state())?;
                println!("{state}");
                return Ok(Flow::Continue);
            },
            BrowseCommand::Help => {
                message::plain(BROWSE_HELP);
                return Ok(Flow::Continue);
            },
            BrowseCommand::Quit => return Ok(Flow::Quit),
        }

        println!("{}", render::list_view(&self.manager.state()));
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use databank_sdk::catalog::{CatalogItem, ItemId, Page};
    use databank_sdk::models::list_state::RequestStatus;
    use databank_sdk::providers::catalog::MockClient;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;

    use super::*;

    fn item(id: i64) -> CatalogItem {
        CatalogItem {
            id: ItemId::from(id),
            name: format!("Item {id}"),
            image_ref: format!("https://example.com/{id}.png"),
        }
    }

    fn page(ids: impl IntoIterator<Item = i64>, has_next_page: bool) -> Page {
        Page {
            items: ids.into_iter().map(item).collect(),
            has_next_page,
        }
    }

    fn session(client: &MockClient) -> Session<MockClient> {
        Session::new(ListStateManager::new(client.clone()))
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("").unwrap(), BrowseCommand::More);
        assert_eq!(parse_command(" more ").unwrap(), BrowseCommand::More);
        assert_eq!(
            parse_command("/ luke sky").unwrap(),
            BrowseCommand::Search("luke sky".to_string())
        );
        assert_eq!(parse_command("/").unwrap(), BrowseCommand::ClearSearch);
        assert_eq!(
            parse_command("category Droids").unwrap(),
            BrowseCommand::SwitchCategory(Category::Droids)
        );
        assert_eq!(parse_command("reset").unwrap(), BrowseCommand::Reset);
        assert_eq!(parse_command("q").unwrap(), BrowseCommand::Quit);
    }

    #[test]
    fn rejects_unknown_commands() {
        assert!(parse_command("jump").is_err());
        assert!(parse_command("more please").is_err());
        assert!(parse_command("category").is_err());
        assert!(parse_command("category starships").is_err());
    }

    #[tokio::test]
    async fn more_appends_pages() {
        let client = MockClient::new();
        client.push_page_response(page([1, 2], true));
        client.push_page_response(page([3], false));

        let session = session(&client);
        session.execute(BrowseCommand::More).await.unwrap();
        session.execute(BrowseCommand::More).await.unwrap();
        // exhausted, no further request
        session.execute(BrowseCommand::More).await.unwrap();

        let state = session.manager.state();
        assert_eq!(state.items().len(), 3);
        assert!(!state.cursor().has_more);
        assert_eq!(client.request_count(), 2);
    }

    #[tokio::test]
    async fn search_and_clear_keep_feed() {
        let client = MockClient::new();
        client.push_page_response(page([1, 2], true));
        client.push_search_response(vec![item(2)]);

        let session = session(&client);
        session.execute(BrowseCommand::More).await.unwrap();
        session
            .execute(BrowseCommand::Search("Item 2".to_string()))
            .await
            .unwrap();

        let state = session.manager.state();
        assert_eq!(state.displayed_items(), &[item(2)]);
        assert_eq!(state.items().len(), 2);

        // no request while searching
        session.execute(BrowseCommand::More).await.unwrap();
        assert_eq!(client.request_count(), 2);

        session.execute(BrowseCommand::ClearSearch).await.unwrap();
        let state = session.manager.state();
        assert!(!state.is_searching());
        assert_eq!(state.displayed_items().len(), 2);
    }

    #[tokio::test]
    async fn switching_category_reloads_first_page() {
        let client = MockClient::new();
        client.push_page_response(page([1], true));
        client.push_page_response(page([10, 11], false));

        let session = session(&client);
        session.execute(BrowseCommand::More).await.unwrap();
        session
            .execute(BrowseCommand::SwitchCategory(Category::Vehicles))
            .await
            .unwrap();

        let state = session.manager.state();
        assert_eq!(state.category(), Category::Vehicles);
        assert_eq!(state.items(), &[item(10), item(11)]);
        assert_eq!(state.cursor().current_page.get(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_does_not_end_session() {
        let client = MockClient::new();
        client.push_error_response(StatusCode::BAD_GATEWAY);
        client.push_page_response(page([1], false));

        let session = session(&client);
        let flow = session.execute(BrowseCommand::More).await.unwrap();
        assert_eq!(flow, Flow::Continue);
        assert!(matches!(
            session.manager.state().feed_status(),
            RequestStatus::Failed { .. }
        ));

        session.execute(BrowseCommand::More).await.unwrap();
        let state = session.manager.state();
        assert_eq!(state.feed_status(), &RequestStatus::Succeeded);
        assert_eq!(state.items(), &[item(1)]);
    }

    #[tokio::test]
    async fn quit_ends_session() {
        let session = session(&MockClient::new());
        assert_eq!(
            session.execute(BrowseCommand::Quit).await.unwrap(),
            Flow::Quit
        );
    }
}
