use crate::transport::SparqlTransport;
use crate::{QueryResults, TransportError};
use async_trait::async_trait;
use oxigraph::sparql::{self, EvaluationError};
use oxigraph::store::Store;
use sparql_facets_query::{Query, QueryKind};
use std::fmt;

/// Evaluates queries on an embedded Oxigraph store.
///
/// Evaluation is blocking and runs on Tokio's blocking thread pool.
#[derive(Clone)]
pub struct StoreTransport {
    store: Store,
}

impl fmt::Debug for StoreTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreTransport").finish_non_exhaustive()
    }
}

impl StoreTransport {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

#[async_trait]
impl SparqlTransport for StoreTransport {
    async fn execute(&self, query: &Query) -> Result<QueryResults, TransportError> {
        let store = self.store.clone();
        let kind = query.kind();
        let text = query.to_string();
        tokio::task::spawn_blocking(move || evaluate(&store, kind, text))
            .await
            .map_err(|e| TransportError::Server(format!("evaluation was aborted: {e}")))?
    }
}

fn evaluate(store: &Store, kind: QueryKind, text: String) -> Result<QueryResults, TransportError> {
    let results = match store.query(text.as_str()) {
        Ok(results) => results,
        Err(EvaluationError::Parsing(error)) => {
            return Err(TransportError::InvalidQuery {
                query: text,
                message: error.to_string(),
            })
        }
        Err(error) => return Err(TransportError::Server(error.to_string())),
    };

    match (kind, results) {
        (QueryKind::Select, sparql::QueryResults::Solutions(solutions)) => solutions
            .collect::<Result<Vec<_>, _>>()
            .map(QueryResults::Solutions)
            .map_err(|e| TransportError::Server(e.to_string())),
        (QueryKind::Construct, sparql::QueryResults::Graph(triples)) => triples
            .collect::<Result<Vec<_>, _>>()
            .map(QueryResults::Graph)
            .map_err(|e| TransportError::Server(e.to_string())),
        (kind, _) => Err(TransportError::Server(format!(
            "the store returned an unexpected result for a {kind} query"
        ))),
    }
}
