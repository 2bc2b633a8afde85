use crate::TransportError;
use oxrdfio::{RdfFormat, RdfParser};
use sparesults::{QueryResultsFormat, QueryResultsParser, ReaderQueryResultsParserOutput};
use sparql_facets_model::{Term, Triple};

pub use sparesults::QuerySolution;

/// The raw result of a query.
#[derive(Debug, PartialEq)]
pub enum QueryResults {
    /// The solutions of a `SELECT` query.
    Solutions(Vec<QuerySolution>),
    /// The triples of a `CONSTRUCT` query, in the order returned by the endpoint.
    Graph(Vec<Triple>),
}

impl QueryResults {
    pub fn into_solutions(self) -> Result<Vec<QuerySolution>, TransportError> {
        match self {
            QueryResults::Solutions(solutions) => Ok(solutions),
            QueryResults::Graph(_) => Err(TransportError::Server(
                "expected solutions but received a graph".to_owned(),
            )),
        }
    }

    pub fn into_graph(self) -> Result<Vec<Triple>, TransportError> {
        match self {
            QueryResults::Graph(triples) => Ok(triples),
            QueryResults::Solutions(_) => Err(TransportError::Server(
                "expected a graph but received solutions".to_owned(),
            )),
        }
    }
}

/// Parses a `application/sparql-results+json` document.
pub fn parse_json_solutions(body: &[u8]) -> Result<Vec<QuerySolution>, TransportError> {
    let parser = QueryResultsParser::from_format(QueryResultsFormat::Json)
        .for_reader(body)
        .map_err(|e| TransportError::Server(format!("invalid query results: {e}")))?;
    match parser {
        ReaderQueryResultsParserOutput::Solutions(solutions) => solutions
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TransportError::Server(format!("invalid query results: {e}"))),
        ReaderQueryResultsParserOutput::Boolean(_) => Err(TransportError::Server(
            "expected solutions but received a boolean".to_owned(),
        )),
    }
}

/// Parses a `application/n-triples` document.
pub fn parse_n_triples(body: &[u8]) -> Result<Vec<Triple>, TransportError> {
    RdfParser::from_format(RdfFormat::NTriples)
        .for_reader(body)
        .map(|quad| quad.map(Triple::from))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TransportError::Server(format!("invalid N-Triples: {e}")))
}

/// The lexical value of a term: the value of a literal, the IRI of a named node, or the id of a
/// blank node.
pub(crate) fn term_value(term: &Term) -> String {
    match term {
        Term::Literal(literal) => literal.value().to_owned(),
        Term::NamedNode(node) => node.as_str().to_owned(),
        Term::BlankNode(node) => node.as_str().to_owned(),
        #[allow(unreachable_patterns, reason = "Quoted triples only exist with rdf-star")]
        other => other.to_string(),
    }
}
