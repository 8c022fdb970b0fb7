//! Catalog client wrapper around a configured [`reqwest::Client`].

use std::fmt::Debug;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{self, HeaderMap};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::{CatalogClientError, FetchError};
use crate::types::{CatalogItem, Category, Page, PageNumber, RawItem, RawPage};

/// A client for the catalog service.
///
/// Wraps a [`reqwest::Client`] that handles:
/// - default and user supplied headers
/// - connect and request timeouts
///
/// Requests are never retried.
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: Url,
    config: CatalogClientConfig,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let base_url = parse_base_url(&config.catalog_url)?;
        let client = build_http_client(&config)?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Get the configured catalog URL.
    pub fn catalog_url(&self) -> &str {
        &self.config.catalog_url
    }

    /// Send a `GET` request and decode the full body as `T`.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!(%url, "sending catalog request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "catalog request failed");
            return Err(FetchError::UnexpectedStatus { status });
        }

        let body = response.bytes().await.map_err(FetchError::Network)?;
        debug!(%status, bytes = body.len(), "received catalog response");
        serde_json::from_slice(&body).map_err(FetchError::MalformedResponse)
    }
}

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// The read-only catalog interface.
///
/// This trait enables alternate implementations:
/// - **HTTP**: REST calls to the catalog via [`CatalogClient`]
/// - **Mock**: canned responses without HTTP
///
/// The returned futures are `Send` so that callers can run them on spawned tasks.
pub trait ClientTrait {
    /// Get one page of the unfiltered collection.
    fn fetch_page(
        &self,
        category: Category,
        page: PageNumber,
    ) -> impl Future<Output = Result<Page, FetchError>> + Send;

    /// Get every record of the collection whose name matches `query`.
    fn search_by_name(
        &self,
        category: Category,
        query: &str,
    ) -> impl Future<Output = Result<Vec<CatalogItem>, FetchError>> + Send;
}

impl ClientTrait for CatalogClient {
    #[instrument(skip(self, page), fields(page = page.get()))]
    async fn fetch_page(&self, category: Category, page: PageNumber) -> Result<Page, FetchError> {
        let url = page_url(&self.base_url, category, page)?;
        let raw: RawPage = self.get_json(url).await?;
        let page = Page::from(raw);

        debug!(
            n_items = page.items.len(),
            has_next_page = page.has_next_page,
            "received page"
        );
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn search_by_name(
        &self,
        category: Category,
        query: &str,
    ) -> Result<Vec<CatalogItem>, FetchError> {
        let url = search_url(&self.base_url, category, query)?;
        let raw: Vec<RawItem> = self.get_json(url).await?;
        let items = raw.into_iter().map(CatalogItem::from).collect::<Vec<_>>();

        debug!(n_items = items.len(), "received search results");
        Ok(items)
    }
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn parse_base_url(catalog_url: &str) -> Result<Url, CatalogClientError> {
    let url = Url::parse(catalog_url).map_err(|err| CatalogClientError::InvalidUrl {
        url: catalog_url.to_string(),
        err,
    })?;
    if url.cannot_be_a_base() {
        return Err(CatalogClientError::CannotBeABase(catalog_url.to_string()));
    }
    Ok(url)
}

/// Append path segments to the base url, dropping a trailing empty segment.
///
/// Each segment is percent-encoded individually.
fn with_segments<'a>(
    base: &Url,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<Url, FetchError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidRequest(format!("'{base}' cannot be a base url")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `{base}/{category}?page={n}`
fn page_url(base: &Url, category: Category, page: PageNumber) -> Result<Url, FetchError> {
    let mut url = with_segments(base, [category.path_segment()])?;
    url.query_pairs_mut()
        .append_pair("page", &page.get().to_string());
    Ok(url)
}

/// `{base}/{category}/name/{query}`
///
/// `.` and `..` are rejected, urls normalize them away instead of encoding them.
fn search_url(base: &Url, category: Category, query: &str) -> Result<Url, FetchError> {
    if matches!(query, "." | "..") {
        return Err(FetchError::InvalidRequest(format!(
            "'{query}' is not a searchable name"
        )));
    }
    with_segments(base, [category.path_segment(), "name", query])
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

/// Build HTTP client with default headers for the catalog API.
fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| {
                    CatalogClientError::InvalidHeader(format!("{key}: {e}"))
                },
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| {
                    CatalogClientError::InvalidHeader(format!("{key}: {e}"))
                },
            )?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(60));

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder.build().map_err(CatalogClientError::Build)
}

#[cfg(test)]
pub mod tests {
    use std::collections::BTreeMap;

    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::types::ItemId;

    fn client_config(url: &str) -> CatalogClientConfig {
        CatalogClientConfig {
            catalog_url: url.to_string(),
            user_agent: None,
            extra_headers: Default::default(),
        }
    }

    fn luke() -> CatalogItem {
        CatalogItem {
            id: ItemId::from(1),
            name: "Luke".to_string(),
            image_ref: "x".to_string(),
        }
    }

    #[test]
    fn page_url_appends_category_and_page() {
        let base = Url::parse("https://example.com/api/v1").unwrap();
        let url = page_url(&base, Category::Droids, PageNumber::new(3).unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v1/droids?page=3");
    }

    #[test]
    fn trailing_slash_in_base_url_is_tolerated() {
        let base = Url::parse("https://example.com/api/v1/").unwrap();
        let url = page_url(&base, Category::Characters, PageNumber::FIRST).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v1/characters?page=1");
    }

    #[test]
    fn search_query_is_encoded_as_one_segment() {
        let base = Url::parse("https://example.com/api/v1").unwrap();
        let url = search_url(&base, Category::Characters, "Luke Sky/walker").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/api/v1/characters/name/Luke%20Sky%2Fwalker"
        );
    }

    #[test]
    fn dot_segment_queries_are_rejected() {
        let base = Url::parse("https://example.com/api/v1").unwrap();
        for query in [".", ".."] {
            let result = search_url(&base, Category::Characters, query);
            assert!(
                matches!(result, Err(FetchError::InvalidRequest(_))),
                "expected InvalidRequest for {query:?}, found: {result:?}"
            );
        }

        let url = search_url(&base, Category::Characters, "...").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v1/characters/name/...");
    }

    #[tokio::test]
    async fn dot_segment_search_sends_no_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!([]));
            })
            .await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let result = client.search_by_name(Category::Characters, "..").await;

        assert!(
            matches!(result, Err(FetchError::InvalidRequest(_))),
            "expected InvalidRequest, found: {result:?}"
        );
        mock.assert_hits_async(0).await;
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = CatalogClient::new(client_config("not a url"));
        assert!(
            matches!(result, Err(CatalogClientError::InvalidUrl { .. })),
            "expected InvalidUrl, found: {result:?}"
        );

        let result = CatalogClient::new(client_config("mailto:someone@example.com"));
        assert!(
            matches!(result, Err(CatalogClientError::CannotBeABase(_))),
            "expected CannotBeABase, found: {result:?}"
        );
    }

    #[test]
    fn invalid_extra_header_is_rejected() {
        let config = CatalogClientConfig {
            extra_headers: BTreeMap::from([("bad header".to_string(), "value".to_string())]),
            ..client_config("https://example.com")
        };
        let result = CatalogClient::new(config);
        assert!(
            matches!(result, Err(CatalogClientError::InvalidHeader(_))),
            "expected InvalidHeader, found: {result:?}"
        );
    }

    #[tokio::test]
    async fn fetch_page_normalizes_response() {
        let server = MockServer::start_async().await;
        let mock = server.mock_async(|when, then| {
            when.method(GET)
                .path("/characters")
                .query_param("page", "1");
            then.status(200).json_body(json!({
                "data": [{ "_id": 1, "name": "Luke", "image": "x" }],
                "info": { "next": "page2" }
            }));
        }).await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let page = client
            .fetch_page(Category::Characters, PageNumber::FIRST)
            .await
            .unwrap();

        assert_eq!(page, Page {
            items: vec![luke()],
            has_next_page: true,
        });
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_page_uses_category_and_base_path() {
        let server = MockServer::start_async().await;
        let mock = server.mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/vehicles")
                .query_param("page", "4");
            then.status(200).json_body(json!({
                "data": [],
                "info": { "next": null }
            }));
        }).await;

        let client = CatalogClient::new(client_config(&server.url("/api/v1"))).unwrap();
        let page = client
            .fetch_page(Category::Vehicles, PageNumber::new(4).unwrap())
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(!page.has_next_page);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn search_by_name_returns_records() {
        let server = MockServer::start_async().await;
        let mock = server.mock_async(|when, then| {
            when.method(GET).path("/characters/name/Luke");
            then.status(200)
                .json_body(json!([{ "_id": 1, "name": "Luke", "image": "x" }]));
        }).await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let results = client
            .search_by_name(Category::Characters, "Luke")
            .await
            .unwrap();

        assert_eq!(results, vec![luke()]);
        mock.assert_async().await;
    }

    // region: Error response handling

    #[tokio::test]
    async fn non_success_status_is_unexpected_status() {
        let server = MockServer::start_async().await;
        let mock = server.mock_async(|_, then| {
            then.status(500).body("oops");
        }).await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let result = client
            .fetch_page(Category::Characters, PageNumber::FIRST)
            .await;

        assert!(
            matches!(
                result,
                Err(FetchError::UnexpectedStatus { status }) if status.as_u16() == 500
            ),
            "expected UnexpectedStatus, found: {result:?}"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn search_response_that_is_not_a_list_is_malformed() {
        let server = MockServer::start_async().await;
        let mock = server.mock_async(|_, then| {
            then.status(200)
                .json_body(json!({ "message": "no character found" }));
        }).await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let result = client.search_by_name(Category::Characters, "Nobody").await;

        assert!(
            matches!(result, Err(FetchError::MalformedResponse(_))),
            "expected MalformedResponse, found: {result:?}"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn page_without_info_is_malformed() {
        let server = MockServer::start_async().await;
        let mock = server.mock_async(|_, then| {
            then.status(200).json_body(json!({ "data": [] }));
        }).await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let result = client
            .fetch_page(Category::Characters, PageNumber::FIRST)
            .await;

        assert!(
            matches!(result, Err(FetchError::MalformedResponse(_))),
            "expected MalformedResponse, found: {result:?}"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start_async().await;
        let mock = server.mock_async(|_, then| {
            then.status(200).body("<html>gateway</html>");
        }).await;

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let result = client
            .fetch_page(Category::Characters, PageNumber::FIRST)
            .await;

        assert!(
            matches!(result, Err(FetchError::MalformedResponse(_))),
            "expected MalformedResponse, found: {result:?}"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_catalog_is_network_error() {
        // Nothing listens on the discard port.
        let client = CatalogClient::new(client_config("http://127.0.0.1:9")).unwrap();
        let result = client
            .fetch_page(Category::Characters, PageNumber::FIRST)
            .await;

        assert!(
            matches!(result, Err(FetchError::Network(_))),
            "expected Network, found: {result:?}"
        );
    }

    // endregion

    #[tokio::test]
    async fn extra_headers_set_on_all_requests() {
        let mut extra_headers: BTreeMap<String, String> = BTreeMap::new();
        extra_headers.insert("databank-test".to_string(), "test-value".to_string());
        extra_headers.insert("databank-test2".to_string(), "test-value2".to_string());

        let server = MockServer::start_async().await;
        let mock = server.mock_async(|when, then| {
            when.header("databank-test", "test-value")
                .header("databank-test2", "test-value2");
            then.status(200).json_body(json!([]));
        }).await;

        let config = CatalogClientConfig {
            extra_headers,
            ..client_config(&server.base_url())
        };

        let client = CatalogClient::new(config).unwrap();
        let _ = client.search_by_name(Category::Droids, "R2").await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn user_agent_set_on_all_requests() {
        let expected_agent = "my-custom-user-agent";

        let server = MockServer::start_async().await;
        let mock = server.mock_async(|when, then| {
            when.header("user-agent", expected_agent);
            then.status(200).json_body(json!([]));
        }).await;

        let config = CatalogClientConfig {
            user_agent: Some(expected_agent.to_owned()),
            ..client_config(&server.base_url())
        };

        let client = CatalogClient::new(config).unwrap();
        let _ = client.search_by_name(Category::Droids, "R2").await;
        mock.assert_async().await;
    }
}
