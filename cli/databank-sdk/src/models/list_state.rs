//! State of a paginated catalog feed with an independent search overlay.
//!
//! [`ListState`] is a plain value that only changes through its transition
//! methods. Every request is split into a `begin_*` call, which decides whether
//! a request should be issued at all and hands out a tagged ticket, and a
//! `complete_*` call, which folds the response into the state if the ticket is
//! still current.
//!
//! A ticket is current if its generation matches the state's generation for
//! that feed and the state still waits for exactly that page or query.
//! Responses for outdated tickets are dropped without touching the state.

use std::collections::HashSet;

use databank_catalog::{CatalogItem, Category, FetchError, Page, PageNumber};
use serde::Serialize;
use tracing::{debug, warn};

/// Progress of the most recent request of a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed {
        message: String,
    },
}

impl RequestStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestStatus::Loading)
    }

    /// The error message of a failed request.
    pub fn error(&self) -> Option<&str> {
        match self {
            RequestStatus::Failed { message } => Some(message),
            _ => None,
        }
    }

    fn failed(err: &FetchError) -> Self {
        RequestStatus::Failed {
            message: err.to_string(),
        }
    }
}

/// How far the unfiltered collection has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationCursor {
    /// The next page to request.
    pub current_page: PageNumber,
    /// `false` once the catalog reported the last page.
    pub has_more: bool,
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self {
            current_page: PageNumber::FIRST,
            has_more: true,
        }
    }
}

/// Ticket for an outstanding page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    category: Category,
    page: PageNumber,
    generation: u64,
}

impl PageRequest {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn page(&self) -> PageNumber {
        self.page
    }
}

/// Ticket for an outstanding search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    category: Category,
    query: String,
    generation: u64,
}

impl SearchRequest {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListState {
    category: Category,
    items: Vec<CatalogItem>,
    search_results: Vec<CatalogItem>,
    cursor: PaginationCursor,
    feed_status: RequestStatus,
    search_status: RequestStatus,
    active_query: String,

    #[serde(skip)]
    feed_generation: u64,
    #[serde(skip)]
    search_generation: u64,
}

impl Default for ListState {
    fn default() -> Self {
        Self::new(Category::default())
    }
}

impl ListState {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            items: Vec::new(),
            search_results: Vec::new(),
            cursor: PaginationCursor::default(),
            feed_status: RequestStatus::Idle,
            search_status: RequestStatus::Idle,
            active_query: String::new(),
            feed_generation: 0,
            search_generation: 0,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// All items of the unfiltered feed, in the order they were received.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Results of the last successful search.
    pub fn search_results(&self) -> &[CatalogItem] {
        &self.search_results
    }

    pub fn cursor(&self) -> PaginationCursor {
        self.cursor
    }

    pub fn feed_status(&self) -> &RequestStatus {
        &self.feed_status
    }

    pub fn search_status(&self) -> &RequestStatus {
        &self.search_status
    }

    /// The current search query, empty if not searching.
    pub fn active_query(&self) -> &str {
        &self.active_query
    }

    pub fn is_searching(&self) -> bool {
        !self.active_query.is_empty()
    }

    /// The list a view should show:
    /// search results while a query is active, the feed otherwise.
    pub fn displayed_items(&self) -> &[CatalogItem] {
        if self.is_searching() {
            &self.search_results
        } else {
            &self.items
        }
    }

    /// Whether [`Self::begin_page_fetch`] would issue a request.
    pub fn can_load_more(&self) -> bool {
        !self.is_searching() && self.cursor.has_more && !self.feed_status.is_loading()
    }

    // region: feed

    /// Start loading the page the cursor points at.
    ///
    /// Returns `None` without changing the state if a page is already loading,
    /// the last page was reached or a search query is active.
    pub fn begin_page_fetch(&mut self) -> Option<PageRequest> {
        if !self.can_load_more() {
            debug!(
                feed_status = ?self.feed_status,
                has_more = self.cursor.has_more,
                searching = self.is_searching(),
                "not loading next page"
            );
            return None;
        }

        self.feed_status = RequestStatus::Loading;
        Some(PageRequest {
            category: self.category,
            page: self.cursor.current_page,
            generation: self.feed_generation,
        })
    }

    /// Fold the response of a page request into the feed.
    ///
    /// Returns `false` if the request is outdated and the response was dropped.
    pub fn complete_page_fetch(
        &mut self,
        request: PageRequest,
        result: Result<Page, FetchError>,
    ) -> bool {
        let is_current = request.generation == self.feed_generation
            && request.page == self.cursor.current_page
            && self.feed_status.is_loading();
        if !is_current {
            debug!(page = request.page.get(), "discarding outdated page response");
            return false;
        }

        match result {
            Ok(page) => {
                self.append_items(page.items);
                self.cursor = PaginationCursor {
                    current_page: self.cursor.current_page.next(),
                    has_more: page.has_next_page,
                };
                self.feed_status = RequestStatus::Succeeded;
            },
            Err(err) => {
                debug!(page = request.page.get(), %err, "page request failed");
                self.feed_status = RequestStatus::failed(&err);
            },
        }
        true
    }

    /// Append items, skipping ids the feed already contains.
    fn append_items(&mut self, new_items: Vec<CatalogItem>) {
        let mut seen = self.items.iter().map(|item| item.id).collect::<HashSet<_>>();
        self.items.reserve(new_items.len());
        for item in new_items {
            if seen.insert(item.id) {
                self.items.push(item);
            } else {
                warn!(id = %item.id, "catalog returned a duplicate item, skipping");
            }
        }
    }

    // endregion

    // region: search

    /// Activate `query` and start searching for it.
    ///
    /// An empty query leaves search mode and returns `None`.
    pub fn begin_search(&mut self, query: &str) -> Option<SearchRequest> {
        if query.is_empty() {
            self.clear_search();
            return None;
        }

        self.search_generation = self.search_generation.wrapping_add(1);
        self.active_query = query.to_string();
        self.search_status = RequestStatus::Loading;
        Some(SearchRequest {
            category: self.category,
            query: self.active_query.clone(),
            generation: self.search_generation,
        })
    }

    /// Fold the response of a search request into the overlay.
    ///
    /// On failure the previous results stay visible next to the error.
    /// Returns `false` if the request is outdated and the response was dropped.
    pub fn complete_search(
        &mut self,
        request: SearchRequest,
        result: Result<Vec<CatalogItem>, FetchError>,
    ) -> bool {
        let is_current = request.generation == self.search_generation
            && request.query == self.active_query
            && self.search_status.is_loading();
        if !is_current {
            debug!(query = %request.query, "discarding outdated search response");
            return false;
        }

        match result {
            Ok(results) => {
                self.search_results = results;
                self.search_status = RequestStatus::Succeeded;
            },
            Err(err) => {
                debug!(query = %request.query, %err, "search request failed");
                self.search_status = RequestStatus::failed(&err);
            },
        }
        true
    }

    fn clear_search(&mut self) {
        if self.search_status.is_loading() {
            self.search_generation = self.search_generation.wrapping_add(1);
        }
        self.active_query.clear();
        self.search_results.clear();
        self.search_status = RequestStatus::Idle;
    }

    // endregion

    /// Return to the initial state of the current category.
    ///
    /// Does not issue a request.
    /// Responses to requests that are still outstanding will be dropped.
    pub fn reset(&mut self) {
        // Only a loading feed can have an outstanding request of the current generation.
        if self.feed_status.is_loading() {
            self.feed_generation = self.feed_generation.wrapping_add(1);
        }
        self.items.clear();
        self.cursor = PaginationCursor::default();
        self.feed_status = RequestStatus::Idle;
        self.clear_search();
    }

    /// Reset the state and point it at another collection.
    pub fn switch_category(&mut self, category: Category) {
        self.reset();
        self.category = category;
    }
}
