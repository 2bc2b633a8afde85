use crate::results::{term_value, QuerySolution};
use crate::{Document, TransportError};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use sparql_facets_model::{FacetRequest, FacetSort, Term};
use sparql_facets_query::COUNT_VARIABLE;
use std::cmp::Reverse;
use std::collections::HashMap;

/// A value of a facet and the number of entities that have it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FacetItem {
    pub value: String,
    pub hits: u64,
}

impl FacetItem {
    pub fn new(value: impl Into<String>, hits: u64) -> Self {
        Self {
            value: value.into(),
            hits,
        }
    }
}

/// The aggregated values of one facet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FacetAggregation {
    #[serde(skip)]
    name: String,
    items: Vec<FacetItem>,
    sort: FacetSort,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
    has_more: bool,
}

impl FacetAggregation {
    /// Collects the items of `facet` from the solutions of its aggregate query.
    ///
    /// Solutions without a value for the facet variable are skipped. Terms with the same lexical
    /// value (e.g., `"Greek"@en` and `"Greek"`) are merged into one item whose hits are the sum of
    /// their counts. If the request asks for a page size, the query fetched one more item than
    /// shown, which is removed here.
    pub fn from_solutions(
        facet: &FacetRequest,
        solutions: &[QuerySolution],
    ) -> Result<Self, TransportError> {
        let mut items: Vec<FacetItem> = Vec::with_capacity(solutions.len());
        let mut positions: HashMap<String, usize> = HashMap::new();
        for solution in solutions {
            let Some(value) = solution.get(facet.variable()) else {
                continue;
            };
            let hits = parse_count(solution.get(COUNT_VARIABLE))?;
            let value = term_value(value);
            if let Some(item) = positions.get(&value).and_then(|&p| items.get_mut(p)) {
                item.hits = item.hits.saturating_add(hits);
            } else {
                positions.insert(value.clone(), items.len());
                items.push(FacetItem::new(value, hits));
            }
        }
        if facet.sort == FacetSort::Count && positions.len() < solutions.len() {
            items.sort_by_key(|item| Reverse(item.hits));
        }

        let mut has_more = false;
        if let Some(page_size) = facet.page_size {
            let page_size = usize::try_from(page_size).unwrap_or(usize::MAX);
            if items.len() > page_size {
                items.truncate(page_size);
                has_more = true;
            }
        }

        Ok(Self {
            name: facet.name.clone(),
            items,
            sort: facet.sort,
            limit: facet.page_size,
            offset: facet.offset,
            prefix: facet.prefix.clone(),
            has_more,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The items in the order of the facet's sort.
    pub fn items(&self) -> &[FacetItem] {
        &self.items
    }

    pub fn sort(&self) -> FacetSort {
        self.sort
    }

    /// The number of items per page, if the facet is paged.
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Whether there are more items after the shown ones.
    pub fn has_more(&self) -> bool {
        self.has_more
    }
}

/// Parses a `?__count__` binding. A missing binding counts as zero.
pub(crate) fn parse_count(term: Option<&Term>) -> Result<u64, TransportError> {
    match term {
        None => Ok(0),
        Some(Term::Literal(literal)) => literal
            .value()
            .parse()
            .map_err(|_| TransportError::Server(format!("invalid count {literal}"))),
        Some(term) => Err(TransportError::Server(format!("invalid count {term}"))),
    }
}

/// The result of a search.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchResponse {
    total: u64,
    start: u64,
    rows: u64,
    documents: Vec<Document>,
    facets: Vec<FacetAggregation>,
}

impl SearchResponse {
    pub fn new(
        total: u64,
        start: u64,
        rows: u64,
        documents: Vec<Document>,
        facets: Vec<FacetAggregation>,
    ) -> Self {
        Self {
            total,
            start,
            rows,
            documents,
            facets,
        }
    }

    /// The number of entities that match the request.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// The documents on the requested page, in page order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    /// The facets in the order in which they were requested.
    pub fn facets(&self) -> &[FacetAggregation] {
        &self.facets
    }

    pub fn facet(&self, name: &str) -> Option<&FacetAggregation> {
        self.facets.iter().find(|f| f.name == name)
    }

    /// The current page, starting at 1.
    pub fn current_page(&self) -> u64 {
        if self.rows == 0 {
            1
        } else {
            (self.start / self.rows).saturating_add(1)
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.rows == 0 {
            0
        } else {
            self.total.div_ceil(self.rows)
        }
    }

    pub fn next_page(&self) -> Option<u64> {
        (self.current_page() < self.total_pages()).then(|| self.current_page() + 1)
    }

    pub fn prev_page(&self) -> Option<u64> {
        (self.current_page() > 1).then(|| self.current_page() - 1)
    }

    pub fn is_first_page(&self) -> bool {
        self.current_page() == 1
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page() >= self.total_pages()
    }

    /// Spelling suggestions are not supported. Always empty.
    pub fn spelling_suggestions(&self) -> &[String] {
        &[]
    }

    /// Grouping is not supported. Always `false`.
    pub fn is_grouped(&self) -> bool {
        false
    }

    /// Result groups are not supported. Always empty.
    pub fn groups(&self) -> &[Document] {
        &[]
    }

    /// "More like this" is not supported. Always empty.
    pub fn more_like_this(&self, _id: &str) -> &[Document] {
        &[]
    }
}

/// Serializes the facets as an object keyed by facet name, in request order.
struct FacetMap<'a>(&'a [FacetAggregation]);

impl Serialize for FacetMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for facet in self.0 {
            map.serialize_entry(&facet.name, facet)?;
        }
        map.end()
    }
}

impl Serialize for SearchResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut response = serializer.serialize_struct("SearchResponse", 5)?;
        response.serialize_field("total", &self.total)?;
        response.serialize_field("start", &self.start)?;
        response.serialize_field("rows", &self.rows)?;
        response.serialize_field("documents", &self.documents)?;
        response.serialize_field("facets", &FacetMap(&self.facets))?;
        response.end()
    }
}
