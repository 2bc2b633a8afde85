use crate::field::parse_variable;
use crate::ConfigError;
use oxrdf::Variable;
use serde::Deserialize;

/// The placeholder in custom search filters. It is replaced with the search term as a quoted and
/// escaped string literal, e.g., `FILTER(CONTAINS(LCASE(?lab), {q}))`.
pub const QUERY_PLACEHOLDER: &str = "{q}";

/// A free-text search option.
///
/// By default, the search term must be contained in the string value of the variable (or in the
/// concatenation of the variables). Custom filters can be provided as templates that contain
/// [`QUERY_PLACEHOLDER`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchFieldDefinition {
    name: String,
    label: String,
    variables: Vec<Variable>,
    filters: Option<Vec<String>>,
    default: bool,
}

impl SearchFieldDefinition {
    pub fn new(name: impl Into<String>, variables: Vec<Variable>) -> Result<Self, ConfigError> {
        let name = name.into();
        if variables.is_empty() {
            return Err(ConfigError::InvalidSearchField {
                field: name,
                reason: "requires filters or at least one variable".to_owned(),
            });
        }
        Ok(Self {
            label: name.clone(),
            name,
            variables,
            filters: None,
            default: false,
        })
    }

    /// Creates a search field that uses custom filter templates.
    pub fn with_filters(
        name: impl Into<String>,
        variables: Vec<Variable>,
        filters: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if filters.is_empty() {
            return Err(ConfigError::InvalidSearchField {
                field: name,
                reason: "the list of filters is empty".to_owned(),
            });
        }
        if let Some(filter) = filters.iter().find(|f| !f.contains(QUERY_PLACEHOLDER)) {
            return Err(ConfigError::InvalidSearchField {
                field: name,
                reason: format!("filter '{filter}' does not contain {QUERY_PLACEHOLDER}"),
            });
        }
        Ok(Self {
            label: name.clone(),
            name,
            variables,
            filters: Some(filters),
            default: false,
        })
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn filters(&self) -> Option<&[String]> {
        self.filters.as_deref()
    }

    /// Whether this search field is used if the user does not choose one.
    pub fn is_default(&self) -> bool {
        self.default
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum RawVariables {
    Single(String),
    Multiple(Vec<String>),
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RawSearchFieldDefinition {
    name: String,
    label: Option<String>,
    #[serde(alias = "variable")]
    variables: Option<RawVariables>,
    filters: Option<Vec<String>>,
    #[serde(default)]
    default: bool,
}

impl RawSearchFieldDefinition {
    pub fn validate(self) -> Result<SearchFieldDefinition, ConfigError> {
        let variables = match self.variables {
            None => Vec::new(),
            Some(RawVariables::Single(variable)) => vec![parse_variable(&variable, &self.name)?],
            Some(RawVariables::Multiple(variables)) => variables
                .iter()
                .map(|v| parse_variable(v, &self.name))
                .collect::<Result<_, _>>()?,
        };

        let field = match self.filters {
            Some(filters) => SearchFieldDefinition::with_filters(self.name, variables, filters)?,
            None => SearchFieldDefinition::new(self.name, variables)?,
        };
        let field = field.with_default(self.default);
        Ok(match self.label {
            Some(label) => field.with_label(label),
            None => field,
        })
    }
}
