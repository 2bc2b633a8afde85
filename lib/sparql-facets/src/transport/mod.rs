//! Execution of queries against SPARQL endpoints.
//!
//! [`HttpTransport`] talks to a remote endpoint using the SPARQL protocol and [`StoreTransport`]
//! evaluates queries on an embedded Oxigraph store.

mod http;
mod store;

pub use http::HttpTransport;
pub use store::StoreTransport;

use crate::{QueryResults, TransportError};
use async_trait::async_trait;
use sparql_facets_query::Query;
use std::sync::Arc;

/// Executes queries against a SPARQL endpoint.
///
/// The shape of the result is decided by the [kind](Query::kind) of the query. Implementations do
/// not retry failed queries.
#[async_trait]
pub trait SparqlTransport: Send + Sync {
    async fn execute(&self, query: &Query) -> Result<QueryResults, TransportError>;
}

#[async_trait]
impl<T: SparqlTransport + ?Sized> SparqlTransport for Arc<T> {
    async fn execute(&self, query: &Query) -> Result<QueryResults, TransportError> {
        self.as_ref().execute(query).await
    }
}
