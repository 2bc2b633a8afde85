use crate::results::{parse_json_solutions, parse_n_triples};
use crate::transport::SparqlTransport;
use crate::{QueryResults, TransportError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use sparql_facets_query::{Query, QueryKind};
use std::fmt;
use std::time::Duration;
use tracing::debug;

const SPARQL_QUERY: &str = "application/sparql-query";
const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";
const N_TRIPLES: &str = "application/n-triples";

/// Sends queries to a remote endpoint using the SPARQL 1.1 protocol (query via POST directly).
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    /// Creates a transport with a default client.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    /// Creates a transport with a client whose requests fail after `timeout`.
    pub fn with_timeout(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(format!("unable to create client: {e}")))?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Creates a transport that uses an existing (pooled) client.
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SparqlTransport for HttpTransport {
    async fn execute(&self, query: &Query) -> Result<QueryResults, TransportError> {
        let text = query.to_string();
        let accept = match query.kind() {
            QueryKind::Select => SPARQL_RESULTS_JSON,
            QueryKind::Construct => N_TRIPLES,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, SPARQL_QUERY)
            .header(ACCEPT, accept)
            .body(text.clone())
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        debug!(endpoint = %self.endpoint, %status, "Received response");
        if status.is_client_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::InvalidQuery {
                query: text,
                message: format!("{status}: {message}"),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Server(format!("{status}: {message}")));
        }

        let body = response.bytes().await.map_err(map_request_error)?;
        match query.kind() {
            QueryKind::Select => parse_json_solutions(&body).map(QueryResults::Solutions),
            QueryKind::Construct => parse_n_triples(&body).map(QueryResults::Graph),
        }
    }
}

fn map_request_error(error: reqwest::Error) -> TransportError {
    if error.is_connect() || error.is_timeout() || error.is_request() {
        TransportError::Connection(error.to_string())
    } else {
        TransportError::Server(error.to_string())
    }
}
