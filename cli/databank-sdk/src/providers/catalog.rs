//! Catalog clients usable by the list state manager.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub use databank_catalog::{
    CatalogClient,
    CatalogClientConfig,
    CatalogItem,
    Category,
    ClientTrait,
    FetchError,
    Page,
    PageNumber,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming a JSON file of [`MockResponse`]s.
///
/// If set, consumers should use a [`MockClient`] seeded from that file
/// instead of talking to the catalog.
pub const DATABANK_CATALOG_MOCK_VAR: &str = "DATABANK_CATALOG_MOCK";

/// Either a client for the actual catalog service,
/// or a mock client for testing.
#[derive(Debug)]
pub enum Client {
    Catalog(CatalogClient),
    Mock(MockClient),
}

impl From<CatalogClient> for Client {
    fn from(client: CatalogClient) -> Self {
        Client::Catalog(client)
    }
}

impl From<MockClient> for Client {
    fn from(client: MockClient) -> Self {
        Client::Mock(client)
    }
}

impl ClientTrait for Client {
    async fn fetch_page(&self, category: Category, page: PageNumber) -> Result<Page, FetchError> {
        match self {
            Client::Catalog(client) => client.fetch_page(category, page).await,
            Client::Mock(client) => client.fetch_page(category, page).await,
        }
    }

    async fn search_by_name(
        &self,
        category: Category,
        query: &str,
    ) -> Result<Vec<CatalogItem>, FetchError> {
        match self {
            Client::Catalog(client) => client.search_by_name(category, query).await,
            Client::Mock(client) => client.search_by_name(category, query).await,
        }
    }
}

/// A canned catalog response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MockResponse {
    Page {
        items: Vec<CatalogItem>,
        has_next_page: bool,
    },
    Search {
        items: Vec<CatalogItem>,
    },
    Error {
        status: u16,
    },
}

#[derive(Debug, Error)]
pub enum MockDataError {
    /// Failed to read the JSON file pointed at by [`DATABANK_CATALOG_MOCK_VAR`]
    #[error("failed to read mock response file")]
    ReadMockFile(#[source] std::io::Error),
    /// Failed to parse the contents of the mock data file as JSON
    #[error("failed to parse mock data as JSON")]
    ParseJson(#[source] serde_json::Error),
    /// The data was parsed as JSON but it wasn't semantically valid
    #[error("invalid mocked data: {0}")]
    InvalidData(String),
}

/// Reads a list of mock responses from disk.
fn read_mock_responses(path: impl AsRef<Path>) -> Result<VecDeque<MockResponse>, MockDataError> {
    let contents = std::fs::read_to_string(path).map_err(MockDataError::ReadMockFile)?;
    let responses: VecDeque<MockResponse> =
        serde_json::from_str(&contents).map_err(MockDataError::ParseJson)?;

    for response in &responses {
        if let MockResponse::Error { status } = response {
            StatusCode::from_u16(*status)
                .map_err(|_| MockDataError::InvalidData(format!("invalid status code {status}")))?;
        }
    }
    Ok(responses)
}

/// A catalog client that can be seeded with mock responses.
///
/// Responses are handed out in the order they were pushed,
/// regardless of the requested category, page or query.
/// Requests after the last response fail, a response of the wrong kind panics.
/// Clones share the same queue.
#[derive(Debug, Default, Clone)]
pub struct MockClient {
    mock_responses: Arc<Mutex<VecDeque<MockResponse>>>,
    requests: Arc<AtomicUsize>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock client seeded with responses read from `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MockDataError> {
        let responses = read_mock_responses(&path)?;
        debug!(
            path = %path.as_ref().display(),
            n_responses = responses.len(),
            "loaded mock catalog responses"
        );
        Ok(Self {
            mock_responses: Arc::new(Mutex::new(responses)),
            requests: Arc::default(),
        })
    }

    fn push(&self, response: MockResponse) {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(response);
    }

    /// Push a new page into the list of mock responses
    pub fn push_page_response(&self, page: Page) {
        self.push(MockResponse::Page {
            items: page.items,
            has_next_page: page.has_next_page,
        });
    }

    /// Push a new search result into the list of mock responses
    pub fn push_search_response(&self, items: Vec<CatalogItem>) {
        self.push(MockResponse::Search { items });
    }

    /// Push an error status into the list of mock responses
    pub fn push_error_response(&self, status: StatusCode) {
        self.push(MockResponse::Error {
            status: status.as_u16(),
        });
    }

    /// Number of requests served so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of responses not yet handed out.
    pub fn remaining_responses(&self) -> usize {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .len()
    }

    fn next_response(&self) -> Option<MockResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .pop_front()
    }
}

fn exhausted_error() -> FetchError {
    FetchError::InvalidRequest("no mock responses left".to_string())
}

fn mock_error(status: u16) -> FetchError {
    FetchError::UnexpectedStatus {
        status: StatusCode::from_u16(status).expect("mock status codes are validated"),
    }
}

impl ClientTrait for MockClient {
    async fn fetch_page(&self, _category: Category, _page: PageNumber) -> Result<Page, FetchError> {
        let mock_resp = self.next_response();
        match mock_resp {
            Some(MockResponse::Page {
                items,
                has_next_page,
            }) => Ok(Page {
                items,
                has_next_page,
            }),
            Some(MockResponse::Error { status }) => Err(mock_error(status)),
            None => Err(exhausted_error()),
            _ => panic!("expected page response, found {:?}", &mock_resp),
        }
    }

    async fn search_by_name(
        &self,
        _category: Category,
        _query: &str,
    ) -> Result<Vec<CatalogItem>, FetchError> {
        let mock_resp = self.next_response();
        match mock_resp {
            Some(MockResponse::Search { items }) => Ok(items),
            Some(MockResponse::Error { status }) => Err(mock_error(status)),
            None => Err(exhausted_error()),
            _ => panic!("expected search response, found {:?}", &mock_resp),
        }
    }
}
