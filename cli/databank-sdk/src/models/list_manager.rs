//! Owner of a [`ListState`] that runs its requests against a catalog client.
//!
//! Commands never block: requests run on spawned tokio tasks and their results
//! are folded into the state as they arrive. Consumers read snapshots with
//! [`ListStateManager::state`] or get notified of every change through
//! [`ListStateManager::subscribe`].

use std::sync::Arc;

use databank_catalog::{Category, ClientTrait};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use super::list_state::ListState;

pub struct ListStateManager<C> {
    client: Arc<C>,
    state: Arc<watch::Sender<ListState>>,
}

impl<C> std::fmt::Debug for ListStateManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListStateManager")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<C> ListStateManager<C>
where
    C: ClientTrait + Send + Sync + 'static,
{
    /// Create a manager for the default category.
    pub fn new(client: C) -> Self {
        Self::with_category(client, Category::default())
    }

    pub fn with_category(client: C, category: Category) -> Self {
        let (state, _) = watch::channel(ListState::new(category));
        Self {
            client: Arc::new(client),
            state: Arc::new(state),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> ListState {
        self.state.borrow().clone()
    }

    /// A receiver that is notified whenever the state changes.
    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.state.subscribe()
    }

    /// Request the next page of the feed.
    ///
    /// Returns `None` if no request was issued,
    /// see [`ListState::begin_page_fetch`].
    /// The returned handle completes once the response has been applied.
    #[instrument(skip_all)]
    pub fn load_next_page(&self) -> Option<JoinHandle<()>> {
        let mut request = None;
        self.state.send_if_modified(|state| {
            request = state.begin_page_fetch();
            request.is_some()
        });
        let request = request?;
        debug!(
            category = %request.category(),
            page = request.page().get(),
            "loading next page"
        );

        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        Some(tokio::spawn(async move {
            let result = client.fetch_page(request.category(), request.page()).await;
            state.send_if_modified(|state| state.complete_page_fetch(request, result));
        }))
    }

    /// Search the current category for `query`, or leave search mode if
    /// `query` is empty.
    ///
    /// Returns `None` if no request was issued.
    /// A newer query supersedes the response of any earlier one.
    #[instrument(skip(self))]
    pub fn set_search_query(&self, query: &str) -> Option<JoinHandle<()>> {
        let request = update_state(&self.state, |state| state.begin_search(query))?;
        debug!(category = %request.category(), "searching");

        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        Some(tokio::spawn(async move {
            let result = client
                .search_by_name(request.category(), request.query())
                .await;
            state.send_if_modified(|state| state.complete_search(request, result));
        }))
    }

    /// Clear all loaded data without issuing a request.
    pub fn reset(&self) {
        debug!("resetting list state");
        update_state(&self.state, ListState::reset);
    }

    /// Clear all loaded data and point the feed at another collection.
    pub fn switch_category(&self, category: Category) {
        debug!(%category, "switching category");
        update_state(&self.state, |state| state.switch_category(category));
    }
}

/// Apply `f` to the state and notify subscribers if it changed anything.
fn update_state<R: Default>(
    state: &watch::Sender<ListState>,
    f: impl FnOnce(&mut ListState) -> R,
) -> R {
    let mut output = R::default();
    state.send_if_modified(|state| {
        let before = state.clone();
        output = f(state);
        *state != before
    });
    output
}
