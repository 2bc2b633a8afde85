use sparql_facets_model::ConfigError;
use sparql_facets_query::BuildError;
use thiserror::Error;

/// A failure to execute a query against a SPARQL endpoint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    /// The endpoint could not be reached or did not answer in time.
    #[error("Unable to connect to the SPARQL endpoint: {0}")]
    Connection(String),
    /// The endpoint rejected the query.
    #[error("The SPARQL endpoint rejected the query: {message}")]
    InvalidQuery { query: String, message: String },
    /// Any other failure of the endpoint, including unparsable responses.
    #[error("The SPARQL endpoint failed: {0}")]
    Server(String),
}

/// A failed search.
///
/// A search fails as a whole. There are no partial responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SearchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A single-id lookup did not yield a document.
    #[error("No record found for {0}")]
    NotFound(String),
    #[error("Unable to frame the documents: {0}")]
    Framing(String),
}

impl SearchError {
    /// Whether repeating the request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::Transport(TransportError::Connection(_)))
    }

    /// Whether the error is a lookup of a missing record rather than a failure of the system.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SearchError::NotFound(_))
    }

    /// A message that can be shown to end users. It never contains query text.
    pub fn user_message(&self) -> &'static str {
        if self.is_not_found() {
            "record not found"
        } else {
            "search unavailable"
        }
    }
}
