//! Error handling for catalog API operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while constructing a [`crate::CatalogClient`].
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("invalid catalog url '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        err: url::ParseError,
    },
    #[error("catalog url '{0}' cannot be used as a base url")]
    CannotBeABase(String),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("failed to build http client")]
    Build(#[source] reqwest::Error),
}

/// Failure of a single catalog request.
///
/// The list state only keeps the rendered message,
/// so every variant has to carry enough context in its `Display` form.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the response could not be received.
    #[error("failed to reach catalog: {0}")]
    Network(#[source] reqwest::Error),
    /// The catalog answered with a non-success status.
    #[error("catalog responded with status {status}")]
    UnexpectedStatus { status: StatusCode },
    /// The response body did not have the expected shape.
    #[error("invalid catalog response: {0}")]
    MalformedResponse(#[source] serde_json::Error),
    /// The request url could not be assembled.
    #[error("invalid catalog request: {0}")]
    InvalidRequest(String),
}
