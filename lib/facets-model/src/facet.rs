use crate::field::RawFieldDefinition;
use crate::{ConfigError, FieldDefinition, FormatterRegistry, Prefixes};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The order of the values of a facet aggregation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetSort {
    /// Most frequent values first. The order of values with equal counts is unspecified.
    #[default]
    Count,
    /// Values in lexical order.
    Index,
}

impl fmt::Display for FacetSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FacetSort::Count => "count",
            FacetSort::Index => "index",
        })
    }
}

impl FromStr for FacetSort {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(FacetSort::Count),
            "index" => Ok(FacetSort::Index),
            _ => Err(ConfigError::InvalidSort(s.to_owned())),
        }
    }
}

/// A field whose distinct values are aggregated with counts.
#[derive(Clone, Debug, PartialEq)]
pub struct FacetDefinition {
    field: FieldDefinition,
    sort: FacetSort,
    limit: Option<u64>,
    include_in_request: bool,
}

impl FacetDefinition {
    pub fn new(field: FieldDefinition) -> Self {
        Self {
            field,
            sort: FacetSort::default(),
            limit: None,
            include_in_request: true,
        }
    }

    #[must_use]
    pub fn with_sort(mut self, sort: FacetSort) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_include_in_request(mut self, include_in_request: bool) -> Self {
        self.include_in_request = include_in_request;
        self
    }

    pub fn name(&self) -> &str {
        self.field.name()
    }

    pub fn field(&self) -> &FieldDefinition {
        &self.field
    }

    /// The configured default sort of the facet values.
    pub fn sort(&self) -> FacetSort {
        self.sort
    }

    /// The number of values that are shown for this facet in a search result.
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Whether the facet is aggregated for every search.
    pub fn include_in_request(&self) -> bool {
        self.include_in_request
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RawFacetDefinition {
    #[serde(flatten)]
    pub field: RawFieldDefinition,
    #[serde(default)]
    pub sort: FacetSort,
    pub limit: Option<u64>,
    #[serde(default = "default_include_in_request")]
    pub include_in_request: bool,
}

fn default_include_in_request() -> bool {
    true
}

impl RawFacetDefinition {
    pub fn validate(
        self,
        prefixes: &Prefixes,
        formatters: &FormatterRegistry,
    ) -> Result<FacetDefinition, ConfigError> {
        Ok(FacetDefinition::new(self.field.validate(prefixes, formatters)?)
            .with_sort(self.sort)
            .with_limit(self.limit)
            .with_include_in_request(self.include_in_request))
    }
}
