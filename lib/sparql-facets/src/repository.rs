use crate::framer::Framer;
use crate::response::parse_count;
use crate::transport::SparqlTransport;
use crate::{
    Document, FacetAggregation, QueryResults, SearchError, SearchResponse, TransportError,
};
use futures::{stream, StreamExt, TryStreamExt};
use sparql_facets_model::{
    FacetRequest, FacetSort, NamedNode, SearchConfig, SearchRequest, SearchRequestBuilder, Term,
};
use sparql_facets_query::{
    build_count, build_entity_construct, build_facet_aggregate, build_id_page, id_variable,
    CountPlan, Query, QueryKind, COUNT_VARIABLE,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// The default timeout of a single query.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// The default number of facet queries that run at the same time.
pub const DEFAULT_MAX_CONCURRENT_FACETS: usize = 4;

/// Limits for the execution of queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    /// A query that does not finish within this duration fails with a connection error.
    pub timeout: Duration,
    /// The number of facet queries of one search that run at the same time.
    pub max_concurrent_facets: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_concurrent_facets: DEFAULT_MAX_CONCURRENT_FACETS,
        }
    }
}

/// Answers search requests by issuing count, id page, entity, and facet queries against a
/// [`SparqlTransport`].
///
/// The repository is stateless. Every search re-executes all of its queries.
#[derive(Clone)]
pub struct Repository {
    transport: Arc<dyn SparqlTransport>,
    config: TransportConfig,
}

impl Repository {
    pub fn new(transport: impl SparqlTransport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            config: TransportConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Executes a search.
    ///
    /// The phases run in order: count, id page, entities, facets. The id page and the entities
    /// are skipped if no rows are requested or nothing matches. A failure in any phase fails the
    /// whole search.
    #[instrument(skip_all, fields(rows = request.page.rows, start = request.page.start))]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        let total = match build_count(request) {
            CountPlan::Known(total) => total,
            CountPlan::Query(query) => self.count(&query).await?,
        };
        debug!(total, "Counted entities");

        let documents = if request.page.rows == 0 || total == 0 {
            Vec::new()
        } else {
            self.documents(request).await?
        };

        let facets = self.facets(request).await?;
        Ok(SearchResponse::new(
            total,
            request.page.start,
            request.page.rows,
            documents,
            facets,
        ))
    }

    /// Looks up a single entity with the detail fields of `config`.
    pub async fn find(
        &self,
        config: &SearchConfig,
        id: &str,
        language: Option<&str>,
    ) -> Result<Document, SearchError> {
        let mut builder = SearchRequest::builder(config).id(id);
        if let Some(language) = language {
            builder = builder.language(language);
        }
        let request = builder.build()?;
        self.search(&request)
            .await?
            .into_documents()
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::NotFound(id.to_owned()))
    }

    /// Pages through the values of the facet `name`, restricted by the other parameters of
    /// `builder`.
    pub async fn facet_page(
        &self,
        builder: SearchRequestBuilder<'_>,
        name: &str,
        page: u64,
        sort: Option<FacetSort>,
        prefix: Option<String>,
    ) -> Result<FacetAggregation, SearchError> {
        let request = builder.facet_page(name, page, sort, prefix).build()?;
        self.search(&request)
            .await?
            .facets()
            .first()
            .cloned()
            .ok_or_else(|| SearchError::Framing(format!("no aggregation for facet '{name}'")))
    }

    async fn count(&self, query: &Query) -> Result<u64, SearchError> {
        let solutions = self.execute(query).await?.into_solutions()?;
        let count = solutions.first().and_then(|s| s.get(COUNT_VARIABLE));
        Ok(parse_count(count)?)
    }

    async fn documents(&self, request: &SearchRequest) -> Result<Vec<Document>, SearchError> {
        let ids = match &request.id {
            Some(id) => vec![id.clone()],
            None => self.page_ids(request).await?,
        };
        if ids.is_empty() {
            // The requested page is beyond the last entity.
            return Ok(Vec::new());
        }

        let frame = request
            .frame
            .as_ref()
            .ok_or_else(|| SearchError::Framing("no frame is configured".to_owned()))?;
        let query = build_entity_construct(request, &ids)?;
        let triples = self.execute(&query).await?.into_graph()?;

        let language_predicates = request
            .fields
            .iter()
            .filter(|f| f.language_filter())
            .filter_map(|f| f.value_predicate())
            .filter_map(|p| frame.prefixes().expand(p).ok());
        let documents = Framer::new(frame, request.language.as_str())
            .with_language_predicates(language_predicates)
            .frame(&triples);
        let documents = in_page_order(documents, &ids);
        debug!(
            triples = triples.len(),
            documents = documents.len(),
            "Framed entities"
        );

        if documents.is_empty() {
            return Err(match &request.id {
                Some(id) => SearchError::NotFound(id.as_str().to_owned()),
                None => SearchError::Framing(format!(
                    "framing {} entities produced no documents",
                    ids.len()
                )),
            });
        }
        Ok(documents)
    }

    async fn page_ids(&self, request: &SearchRequest) -> Result<Vec<NamedNode>, SearchError> {
        let query = build_id_page(request)?;
        let solutions = self.execute(&query).await?.into_solutions()?;
        let id = id_variable();
        let ids = solutions
            .iter()
            .filter_map(|solution| match solution.get(&id) {
                Some(Term::NamedNode(node)) => Some(node.clone()),
                Some(term) => {
                    warn!(%term, "Skipping entity without an IRI");
                    None
                }
                None => None,
            })
            .collect::<Vec<_>>();
        debug!(ids = ids.len(), "Fetched id page");
        Ok(ids)
    }

    async fn facets(&self, request: &SearchRequest) -> Result<Vec<FacetAggregation>, SearchError> {
        // `buffered` keeps the request order and drops the outstanding queries on the first error.
        stream::iter(request.facets.iter().map(|facet| self.facet(request, facet)))
            .buffered(self.config.max_concurrent_facets.max(1))
            .try_collect()
            .await
    }

    async fn facet(
        &self,
        request: &SearchRequest,
        facet: &FacetRequest,
    ) -> Result<FacetAggregation, SearchError> {
        let query = build_facet_aggregate(request, facet);
        let solutions = self.execute(&query).await?.into_solutions()?;
        let aggregation = FacetAggregation::from_solutions(facet, &solutions)?;
        debug!(
            facet = %facet.name,
            items = aggregation.items().len(),
            "Aggregated facet"
        );
        Ok(aggregation)
    }

    async fn execute(&self, query: &Query) -> Result<QueryResults, SearchError> {
        debug!(kind = %query.kind(), %query, "Executing query");
        let result = tokio::time::timeout(self.config.timeout, self.transport.execute(query))
            .await
            .unwrap_or_else(|_| {
                Err(TransportError::Connection(format!(
                    "no response within {:?}",
                    self.config.timeout
                )))
            });
        if let Err(TransportError::InvalidQuery { query, message }) = &result {
            error!(%query, %message, "The endpoint rejected a generated query");
        }
        let results = result?;
        match (query.kind(), &results) {
            (QueryKind::Select, QueryResults::Solutions(_))
            | (QueryKind::Construct, QueryResults::Graph(_)) => Ok(results),
            (kind, _) => Err(TransportError::Server(format!(
                "the endpoint returned an unexpected result for a {kind} query"
            ))
            .into()),
        }
    }
}

/// Orders the documents like the ids of the page.
fn in_page_order(mut documents: Vec<Document>, ids: &[NamedNode]) -> Vec<Document> {
    let positions = ids
        .iter()
        .enumerate()
        .map(|(position, id)| (id.as_str(), position))
        .collect::<HashMap<_, _>>();
    documents.sort_by_key(|document| {
        document
            .id()
            .and_then(|id| positions.get(id).copied())
            .unwrap_or(usize::MAX)
    });
    documents
}
