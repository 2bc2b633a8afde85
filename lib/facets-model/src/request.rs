use crate::{
    ConfigError, FacetDefinition, FacetSort, FieldDefinition, Frame, OrderCondition, Prefixes,
    SearchConfig, SearchFieldDefinition, DEFAULT_LANGUAGE, DEFAULT_ROWS,
};
use oxrdf::{NamedNode, Variable};

/// An abstract search request that is translated into SPARQL queries.
///
/// Requests are usually created from a [`SearchConfig`] with [`SearchRequest::builder`].
#[derive(Clone, Debug, PartialEq)]
pub struct SearchRequest {
    /// The class of the entities.
    pub entity_class: NamedNode,
    /// The prefixes declared in every query.
    pub prefixes: Prefixes,
    /// The fields that are fetched for every entity.
    pub fields: Vec<FieldDefinition>,
    /// The free-text search, if any.
    pub free_text: Option<FreeText>,
    /// Facets that are restricted to specific values.
    pub bound_facets: Vec<BoundFacet>,
    /// Facets whose values are aggregated, in display order.
    pub facets: Vec<FacetRequest>,
    /// The window of entities to return.
    pub page: Page,
    /// The order of the entities.
    pub sort: Vec<OrderCondition>,
    /// If set, only the entity with this IRI is returned.
    pub id: Option<NamedNode>,
    /// The active language for language filters.
    pub language: String,
    /// The frame used to nest the documents.
    pub frame: Option<Frame>,
}

impl SearchRequest {
    /// Creates a request for entities of `entity_class` without fields, filters, or facets.
    pub fn new(entity_class: NamedNode, prefixes: Prefixes) -> Self {
        Self {
            entity_class,
            prefixes,
            fields: Vec::new(),
            free_text: None,
            bound_facets: Vec::new(),
            facets: Vec::new(),
            page: Page::new(DEFAULT_ROWS, 0),
            sort: Vec::new(),
            id: None,
            language: DEFAULT_LANGUAGE.to_owned(),
            frame: None,
        }
    }

    /// Creates a builder that resolves user parameters against `config`.
    pub fn builder(config: &SearchConfig) -> SearchRequestBuilder<'_> {
        SearchRequestBuilder::new(config)
    }

    /// Whether only facet counts are requested.
    pub fn is_facet_only(&self) -> bool {
        self.page.rows == 0
    }
}

/// The window of entities to return.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Page {
    /// The number of entities. `0` requests facet counts only.
    pub rows: u64,
    /// The offset of the first entity.
    pub start: u64,
}

impl Page {
    pub fn new(rows: u64, start: u64) -> Self {
        Self { rows, start }
    }
}

/// A free-text search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FreeText {
    /// The variables whose string values are searched.
    pub variables: Vec<Variable>,
    /// Custom filter templates that replace the default `CONTAINS` filter.
    pub filters: Option<Vec<String>>,
    /// The search term, as entered by the user.
    pub term: String,
}

impl FreeText {
    pub fn new(variables: Vec<Variable>, term: impl Into<String>) -> Self {
        Self {
            variables,
            filters: None,
            term: term.into(),
        }
    }

    fn from_definition(definition: &SearchFieldDefinition, term: String) -> Self {
        Self {
            variables: definition.variables().to_vec(),
            filters: definition.filters().map(<[String]>::to_vec),
            term,
        }
    }
}

/// The values a facet is restricted to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundValue {
    Single(String),
    Multiple(Vec<String>),
}

/// A facet that is restricted to specific values.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundFacet {
    /// The facet field, used to bind the facet variable.
    pub field: FieldDefinition,
    pub value: BoundValue,
}

impl BoundFacet {
    pub fn new(field: FieldDefinition, value: BoundValue) -> Self {
        Self { field, value }
    }

    pub fn variable(&self) -> &Variable {
        self.field.variable()
    }
}

/// A request to aggregate the values of a facet.
#[derive(Clone, Debug, PartialEq)]
pub struct FacetRequest {
    /// The name of the facet, used as key in the response.
    pub name: String,
    /// The facet field, used to bind the facet variable.
    pub field: FieldDefinition,
    pub sort: FacetSort,
    /// The `LIMIT` of the aggregation query.
    pub limit: Option<u64>,
    /// The `OFFSET` of the aggregation query.
    pub offset: Option<u64>,
    /// Only values starting with this prefix are counted.
    pub prefix: Option<String>,
    /// The number of values that are shown. The query fetches one more value to detect whether
    /// there are more values.
    pub page_size: Option<u64>,
}

impl FacetRequest {
    pub fn new(field: FieldDefinition) -> Self {
        Self {
            name: field.name().to_owned(),
            field,
            sort: FacetSort::default(),
            limit: None,
            offset: None,
            prefix: None,
            page_size: None,
        }
    }

    fn from_definition(definition: &FacetDefinition) -> Self {
        Self {
            sort: definition.sort(),
            limit: definition.limit().map(|limit| limit.saturating_add(1)),
            page_size: definition.limit(),
            ..Self::new(definition.field().clone())
        }
    }

    pub fn variable(&self) -> &Variable {
        self.field.variable()
    }
}

/// Selects which fields are fetched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum View {
    /// The fields of the result list.
    #[default]
    Index,
    /// The fields of a single entity.
    Show,
}

#[derive(Clone, Debug)]
struct FacetPaging {
    name: String,
    page: u64,
    sort: Option<FacetSort>,
    prefix: Option<String>,
}

/// Resolves user parameters (names of facets, search fields, and sort options) against a
/// [`SearchConfig`].
#[derive(Clone, Debug)]
pub struct SearchRequestBuilder<'config> {
    config: &'config SearchConfig,
    view: View,
    query: Option<String>,
    search_field: Option<String>,
    facet_filters: Vec<(String, Vec<String>)>,
    rows: Option<u64>,
    start: Option<u64>,
    page: Option<u64>,
    sort: Option<String>,
    language: Option<String>,
    id: Option<String>,
    facet_paging: Option<FacetPaging>,
}

impl<'config> SearchRequestBuilder<'config> {
    fn new(config: &'config SearchConfig) -> Self {
        Self {
            config,
            view: View::Index,
            query: None,
            search_field: None,
            facet_filters: Vec::new(),
            rows: None,
            start: None,
            page: None,
            sort: None,
            language: None,
            id: None,
            facet_paging: None,
        }
    }

    /// Sets the free-text query. An empty query does not restrict the results.
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Selects the search field by name. Defaults to the configured default search field.
    #[must_use]
    pub fn search_field(mut self, name: impl Into<String>) -> Self {
        self.search_field = Some(name.into());
        self
    }

    /// Restricts the facet `name` to the given values. Empty values are ignored.
    #[must_use]
    pub fn facet_filter<V: Into<String>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let name = name.into();
        let values = values.into_iter().map(Into::into);
        match self.facet_filters.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => existing.extend(values),
            None => self.facet_filters.push((name, values.collect())),
        }
        self
    }

    /// Sets the number of entities per page. The value is capped at the configured maximum.
    #[must_use]
    pub fn rows(mut self, rows: u64) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Sets the offset of the first entity. Takes precedence over [`Self::page`].
    #[must_use]
    pub fn start(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    /// Selects a page (starting at 1). Offsets that do not fit into a `u64` saturate, which
    /// yields an empty page.
    #[must_use]
    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    /// Selects a sort option by name. Defaults to the first configured sort option.
    #[must_use]
    pub fn sort(mut self, name: impl Into<String>) -> Self {
        self.sort = Some(name.into());
        self
    }

    /// Sets the active language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn view(mut self, view: View) -> Self {
        self.view = view;
        self
    }

    /// Requests a single entity. Implies [`View::Show`].
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self.view = View::Show;
        self
    }

    /// Pages through the values of a single facet. No entities are fetched.
    #[must_use]
    pub fn facet_page(
        mut self,
        name: impl Into<String>,
        page: u64,
        sort: Option<FacetSort>,
        prefix: Option<String>,
    ) -> Self {
        self.facet_paging = Some(FacetPaging {
            name: name.into(),
            page,
            sort,
            prefix,
        });
        self
    }

    pub fn build(self) -> Result<SearchRequest, ConfigError> {
        let config = self.config;
        let mut request = SearchRequest::new(config.entity_class.clone(), config.prefixes.clone());
        request.frame = config.frame.clone();
        request.language = self
            .language
            .unwrap_or_else(|| config.default_language.clone());
        request.fields = match self.view {
            View::Index => config.index_fields.clone(),
            View::Show => config.show_fields.clone(),
        };

        if let Some(query) = self.query.filter(|q| !q.trim().is_empty()) {
            let definition = match &self.search_field {
                Some(name) => config
                    .search_field(name)
                    .ok_or_else(|| ConfigError::UnknownSearchField(name.clone()))?,
                None => config.default_search_field().ok_or_else(|| {
                    ConfigError::InvalidSearchField {
                        field: "default".to_owned(),
                        reason: "no search field is configured".to_owned(),
                    }
                })?,
            };
            request.free_text = Some(FreeText::from_definition(definition, query));
        }

        for (name, values) in self.facet_filters {
            let facet = config
                .facet(&name)
                .ok_or_else(|| ConfigError::UnknownFacet(name.clone()))?;
            let mut values = values
                .into_iter()
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>();
            let value = match values.len() {
                0 => continue,
                1 => BoundValue::Single(values.remove(0)),
                _ => BoundValue::Multiple(values),
            };
            request
                .bound_facets
                .push(BoundFacet::new(facet.field().clone(), value));
        }

        request.sort = match &self.sort {
            Some(name) => config
                .sort_field(name)
                .ok_or_else(|| ConfigError::UnknownSort(name.clone()))?
                .conditions()
                .to_vec(),
            None => config
                .sort_fields
                .first()
                .map(|s| s.conditions().to_vec())
                .unwrap_or_default(),
        };

        if let Some(paging) = self.facet_paging {
            let facet = config
                .facet(&paging.name)
                .ok_or_else(|| ConfigError::UnknownFacet(paging.name.clone()))?;
            let limit = config.facet_page_limit;
            request.facets.push(FacetRequest {
                sort: paging.sort.unwrap_or(facet.sort()),
                limit: Some(limit.saturating_add(1)),
                offset: Some(paging.page.saturating_sub(1).saturating_mul(limit)),
                prefix: paging.prefix.filter(|p| !p.is_empty()),
                page_size: Some(limit),
                ..FacetRequest::new(facet.field().clone())
            });
            request.page = Page::new(0, 0);
            return Ok(request);
        }

        request.facets = config
            .facets
            .iter()
            .filter(|f| f.include_in_request())
            .map(FacetRequest::from_definition)
            .collect();

        if let Some(id) = self.id {
            request.id = Some(NamedNode::new(id.as_str()).map_err(|error| {
                ConfigError::InvalidIri { iri: id, error }
            })?);
            request.page = Page::new(1, 0);
            return Ok(request);
        }

        let rows = self.rows.unwrap_or(config.default_rows).min(config.max_rows);
        let start = self
            .start
            .or_else(|| self.page.map(|page| page.saturating_sub(1).saturating_mul(rows)))
            .unwrap_or_default();
        request.page = Page::new(rows, start);
        Ok(request)
    }
}
