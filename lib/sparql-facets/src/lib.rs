//! Faceted search over SPARQL endpoints.
//!
//! A [`Repository`] answers a [`SearchRequest`](sparql_facets_model::SearchRequest) by issuing a
//! handful of SPARQL queries through a [`SparqlTransport`](transport::SparqlTransport):
//!
//! - a count of all matching entities,
//! - a page of entity ids,
//! - a `CONSTRUCT` query for the entities on the page, which is framed into [`Document`]s,
//! - an aggregate query per requested facet.
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use sparql_facets::transport::HttpTransport;
//! use sparql_facets::Repository;
//! use sparql_facets_model::{SearchConfig, SearchRequest};
//!
//! let config = SearchConfig::from_path("denominations.json")?;
//! let repository = Repository::new(HttpTransport::new("http://localhost:7878/query"));
//! let request = SearchRequest::builder(&config).query("drachm").build()?;
//! let response = repository.search(&request).await?;
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! # Ok(())
//! # }
//! ```

mod document;
mod error;
mod framer;
mod repository;
mod response;
mod results;
pub mod transport;

pub use document::Document;
pub use error::{SearchError, TransportError};
pub use framer::{language_matches, Framer};
pub use repository::{
    Repository, TransportConfig, DEFAULT_MAX_CONCURRENT_FACETS, DEFAULT_TIMEOUT,
};
pub use response::{FacetAggregation, FacetItem, SearchResponse};
pub use results::{parse_json_solutions, parse_n_triples, QueryResults, QuerySolution};
