use oxiri::IriParseError;
use std::io;

/// An error raised while loading a [`SearchConfig`](crate::SearchConfig) or while resolving user
/// parameters against it.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Could not read the configuration: {0}")]
    Io(#[from] io::Error),
    /// The configuration is not valid JSON or does not have the expected shape.
    #[error("Invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
    /// A variable name is not a valid SPARQL variable.
    #[error("'{variable}' is not a valid SPARQL variable (in '{context}')")]
    InvalidVariable {
        /// The offending variable.
        variable: String,
        /// The field or search definition that contains the variable.
        context: String,
    },
    /// An IRI could not be parsed.
    #[error("Invalid IRI '{iri}': {error}")]
    InvalidIri {
        /// The IRI itself.
        iri: String,
        /// The parsing error.
        #[source]
        error: IriParseError,
    },
    /// A compact IRI uses a prefix that has not been declared.
    #[error("The prefix of '{0}' is not declared")]
    UnknownPrefix(String),
    /// A field defines both a predicate and explicit patterns.
    #[error("Field '{0}' defines both a predicate and patterns")]
    AmbiguousField(String),
    /// The patterns of a field do not connect `?id` with the field variable.
    #[error("The patterns of field '{field}' are invalid: {reason}")]
    InvalidPatterns {
        /// The name of the field.
        field: String,
        /// Why the patterns were rejected.
        reason: String,
    },
    /// A field references a formatter that is not registered.
    #[error("Field '{field}' references the unknown formatter '{formatter}'")]
    UnknownFormatter {
        /// The name of the field.
        field: String,
        /// The name of the formatter.
        formatter: String,
    },
    /// The search field cannot be turned into a filter.
    #[error("Search field '{field}' is invalid: {reason}")]
    InvalidSearchField {
        /// The name of the search field.
        field: String,
        /// Why the search field was rejected.
        reason: String,
    },
    /// A sort clause could not be parsed.
    #[error("Invalid sort clause '{0}', expected a list of '?variable [asc|desc]'")]
    InvalidSort(String),
    /// The JSON-LD frame could not be interpreted.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
    /// Two definitions of the same kind share a name.
    #[error("Duplicate definition '{0}'")]
    Duplicate(String),
    /// A facet was requested that is not configured.
    #[error("Unknown facet '{0}'")]
    UnknownFacet(String),
    /// A search field was requested that is not configured.
    #[error("Unknown search field '{0}'")]
    UnknownSearchField(String),
    /// A sort option was requested that is not configured.
    #[error("Unknown sort option '{0}'")]
    UnknownSort(String),
}

impl ConfigError {
    pub(crate) fn invalid_patterns(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPatterns {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}
