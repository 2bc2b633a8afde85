use crate::facet::RawFacetDefinition;
use crate::field::RawFieldDefinition;
use crate::search::RawSearchFieldDefinition;
use crate::sort::RawSortField;
use crate::{
    ConfigError, FacetDefinition, FieldDefinition, FormatterRegistry, Frame, Prefixes,
    SearchFieldDefinition, SortField,
};
use oxrdf::NamedNode;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// The number of entities per page if a request does not specify one.
pub const DEFAULT_ROWS: u64 = 10;
/// The maximum number of entities per page.
pub const DEFAULT_MAX_ROWS: u64 = 100;
/// The number of facet values per page when paging through the values of a single facet.
pub const DEFAULT_FACET_PAGE_LIMIT: u64 = 20;
/// The language used for language filters if a request does not specify one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Holds the search configuration for one entity class.
///
/// The configuration is validated when it is loaded and immutable afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    /// The class of the entities that are searched.
    pub entity_class: NamedNode,
    /// The prefixes declared in every query.
    pub prefixes: Prefixes,
    /// The frame used to nest the documents.
    pub frame: Option<Frame>,
    /// The fields shown in the result list.
    pub index_fields: Vec<FieldDefinition>,
    /// The fields shown for a single entity.
    pub show_fields: Vec<FieldDefinition>,
    /// The facets, in display order.
    pub facets: Vec<FacetDefinition>,
    /// The free-text search options.
    pub search_fields: Vec<SearchFieldDefinition>,
    /// The sort options. The first one is the default.
    pub sort_fields: Vec<SortField>,
    /// The number of entities per page if a request does not specify one.
    pub default_rows: u64,
    /// The maximum number of entities per page.
    pub max_rows: u64,
    /// The number of facet values per page when paging through a single facet.
    pub facet_page_limit: u64,
    /// The language used for language filters if a request does not specify one.
    pub default_language: String,
}

impl SearchConfig {
    /// Creates a configuration without any fields.
    pub fn new(entity_class: NamedNode, prefixes: Prefixes) -> Self {
        Self {
            entity_class,
            prefixes,
            frame: None,
            index_fields: Vec::new(),
            show_fields: Vec::new(),
            facets: Vec::new(),
            search_fields: Vec::new(),
            sort_fields: Vec::new(),
            default_rows: DEFAULT_ROWS,
            max_rows: DEFAULT_MAX_ROWS,
            facet_page_limit: DEFAULT_FACET_PAGE_LIMIT,
            default_language: DEFAULT_LANGUAGE.to_owned(),
        }
    }

    /// Loads a configuration from a JSON document using the built-in formatters.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::from_json_str_with_formatters(json, &FormatterRegistry::builtin())
    }

    /// Loads a configuration from a JSON document, resolving formatters in `formatters`.
    pub fn from_json_str_with_formatters(
        json: &str,
        formatters: &FormatterRegistry,
    ) -> Result<Self, ConfigError> {
        let raw: RawSearchConfig = serde_json::from_str(json)?;
        raw.validate(formatters)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn facet(&self, name: &str) -> Option<&FacetDefinition> {
        self.facets.iter().find(|f| f.name() == name)
    }

    pub fn search_field(&self, name: &str) -> Option<&SearchFieldDefinition> {
        self.search_fields.iter().find(|f| f.name() == name)
    }

    /// The search field that is used if a request does not name one: the one marked as default,
    /// or the first one.
    pub fn default_search_field(&self) -> Option<&SearchFieldDefinition> {
        self.search_fields
            .iter()
            .find(|f| f.is_default())
            .or_else(|| self.search_fields.first())
    }

    pub fn sort_field(&self, name: &str) -> Option<&SortField> {
        self.sort_fields.iter().find(|f| f.name() == name)
    }
}

#[derive(Debug, Deserialize)]
struct RawSearchConfig {
    entity_class: String,
    #[serde(default)]
    prefixes: BTreeMap<String, String>,
    frame: Option<serde_json::Value>,
    #[serde(default)]
    index_fields: Vec<RawFieldDefinition>,
    #[serde(default)]
    show_fields: Vec<RawFieldDefinition>,
    #[serde(default)]
    facets: Vec<RawFacetDefinition>,
    #[serde(default)]
    search_fields: Vec<RawSearchFieldDefinition>,
    #[serde(default)]
    sort_fields: Vec<RawSortField>,
    default_rows: Option<u64>,
    max_rows: Option<u64>,
    facet_page_limit: Option<u64>,
    default_language: Option<String>,
}

impl RawSearchConfig {
    fn validate(self, formatters: &FormatterRegistry) -> Result<SearchConfig, ConfigError> {
        let mut prefixes = Prefixes::new();
        for (prefix, namespace) in self.prefixes {
            prefixes.insert(prefix, namespace)?;
        }
        let entity_class = prefixes.expand(&self.entity_class)?;

        let frame = self
            .frame
            .map(|frame| Frame::from_json(&frame, &prefixes, &entity_class))
            .transpose()?;
        let keys = frame.as_ref().map_or(&prefixes, Frame::prefixes);

        let fields = |raw: Vec<RawFieldDefinition>| {
            let fields = raw
                .into_iter()
                .map(|f| f.validate_keyed(&prefixes, keys, formatters))
                .collect::<Result<Vec<_>, _>>()?;
            ensure_unique(fields.iter().map(FieldDefinition::name))?;
            Ok::<_, ConfigError>(fields)
        };
        let index_fields = fields(self.index_fields)?;
        let show_fields = fields(self.show_fields)?;

        let facets = self
            .facets
            .into_iter()
            .map(|f| f.validate(&prefixes, formatters))
            .collect::<Result<Vec<_>, _>>()?;
        ensure_unique(facets.iter().map(FacetDefinition::name))?;

        let search_fields = self
            .search_fields
            .into_iter()
            .map(RawSearchFieldDefinition::validate)
            .collect::<Result<Vec<_>, _>>()?;
        ensure_unique(search_fields.iter().map(SearchFieldDefinition::name))?;

        let sort_fields = self
            .sort_fields
            .into_iter()
            .map(RawSortField::validate)
            .collect::<Result<Vec<_>, _>>()?;
        ensure_unique(sort_fields.iter().map(SortField::name))?;

        let default_rows = self.default_rows.unwrap_or(DEFAULT_ROWS);
        Ok(SearchConfig {
            entity_class,
            prefixes,
            frame,
            index_fields,
            show_fields,
            facets,
            search_fields,
            sort_fields,
            default_rows,
            max_rows: self.max_rows.unwrap_or(DEFAULT_MAX_ROWS).max(default_rows),
            facet_page_limit: self.facet_page_limit.unwrap_or(DEFAULT_FACET_PAGE_LIMIT),
            default_language: self
                .default_language
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()),
        })
    }
}

fn ensure_unique<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::Duplicate(name.to_owned()));
        }
    }
    Ok(())
}
