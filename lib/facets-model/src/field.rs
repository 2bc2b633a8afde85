use crate::{ConfigError, Formatter, FormatterRegistry, Prefixes};
use oxrdf::{NamedNode, Variable};
use serde::Deserialize;
use std::fmt;

/// The variable that is bound to the entities of a search.
pub const ID_VARIABLE: &str = "id";

/// Keywords that start a graph pattern which is not a plain triple pattern. Such patterns cannot
/// be re-emitted in a `CONSTRUCT` template.
const NON_TRIPLE_KEYWORDS: [&str; 8] = [
    "FILTER", "OPTIONAL", "BIND", "VALUES", "MINUS", "SERVICE", "GRAPH", "UNION",
];

/// A single SPARQL triple pattern, e.g., `?work bf:subject ?topic`.
///
/// The pattern is kept as text (without the terminating `.`) as it is copied verbatim into the
/// `WHERE` clause and the `CONSTRUCT` template.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TriplePattern(String);

impl TriplePattern {
    /// Validates a configured pattern.
    pub fn parse(pattern: &str, field: &str) -> Result<Self, ConfigError> {
        let pattern = pattern.trim();
        let pattern = pattern.strip_suffix('.').unwrap_or(pattern).trim_end();
        if pattern.is_empty() {
            return Err(ConfigError::invalid_patterns(field, "empty pattern"));
        }
        if pattern.contains(['{', '}']) {
            return Err(ConfigError::invalid_patterns(
                field,
                format!("'{pattern}' contains a group"),
            ));
        }
        let keyword = pattern
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or_default();
        if NON_TRIPLE_KEYWORDS
            .iter()
            .any(|k| k.eq_ignore_ascii_case(keyword))
        {
            return Err(ConfigError::invalid_patterns(
                field,
                format!("'{pattern}' is not a triple pattern"),
            ));
        }
        Ok(Self(pattern.to_owned()))
    }

    /// Creates the pattern `?id <predicate> ?variable`.
    ///
    /// Absolute IRIs written without angle brackets are enclosed in brackets.
    pub fn connecting(predicate: &str, variable: &Variable) -> Self {
        if predicate.contains("://") && !predicate.starts_with('<') {
            Self(format!("?{ID_VARIABLE} <{predicate}> {variable}"))
        } else {
            Self(format!("?{ID_VARIABLE} {predicate} {variable}"))
        }
    }

    /// Creates the pattern `?id a <class>`.
    pub fn entity_type(class: &NamedNode) -> Self {
        Self(format!("?{ID_VARIABLE} a {class}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether the pattern mentions `variable`.
    pub fn mentions(&self, variable: &Variable) -> bool {
        mentions_variable(&self.0, variable.as_str())
    }

    /// If the pattern is a simple `subject predicate object` pattern whose object is `variable`,
    /// returns the predicate.
    pub fn predicate_of(&self, variable: &Variable) -> Option<&str> {
        let mut tokens = self.0.split_whitespace();
        let (_, predicate, object) = (tokens.next()?, tokens.next()?, tokens.next()?);
        if tokens.next().is_some() {
            return None;
        }
        (object.strip_prefix(['?', '$']) == Some(variable.as_str())).then_some(predicate)
    }
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns whether `text` contains the variable `name` (prefixed with `?` or `$`).
pub(crate) fn mentions_variable(text: &str, name: &str) -> bool {
    text.match_indices(['?', '$']).any(|(index, _)| {
        let rest = &text[index + 1..];
        rest.starts_with(name)
            && !rest[name.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_')
    })
}

/// Parses a SPARQL variable such as `?title`.
pub(crate) fn parse_variable(variable: &str, context: &str) -> Result<Variable, ConfigError> {
    let name = variable
        .trim()
        .strip_prefix(['?', '$'])
        .unwrap_or(variable.trim());
    Variable::new(name).map_err(|_| ConfigError::InvalidVariable {
        variable: variable.to_owned(),
        context: context.to_owned(),
    })
}

/// Describes how a field variable is connected to the entity variable `?id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldSource {
    /// The field is a direct property of the entity: `?id <predicate> ?variable`.
    Predicate(String),
    /// The field is reached via explicit triple patterns.
    Patterns(Vec<TriplePattern>),
}

/// A validated field definition.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDefinition {
    name: String,
    label: String,
    variable: Variable,
    source: FieldSource,
    language_filter: bool,
    document_key: String,
    formatter: Formatter,
}

impl FieldDefinition {
    /// Creates a field that connects `?id` with `variable` via `predicate`.
    pub fn predicate(
        name: impl Into<String>,
        variable: Variable,
        predicate: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let predicate = predicate.into();
        Self {
            label: name.clone(),
            name,
            variable,
            document_key: predicate.clone(),
            source: FieldSource::Predicate(predicate),
            language_filter: false,
            formatter: Formatter::default(),
        }
    }

    /// Creates a field that is reached via explicit triple patterns.
    pub fn patterns(
        name: impl Into<String>,
        variable: Variable,
        patterns: Vec<TriplePattern>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        validate_connection(&name, &variable, &patterns)?;
        Ok(Self {
            label: name.clone(),
            document_key: name.clone(),
            name,
            variable,
            source: FieldSource::Patterns(patterns),
            language_filter: false,
            formatter: Formatter::default(),
        })
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_language_filter(mut self, language_filter: bool) -> Self {
        self.language_filter = language_filter;
        self
    }

    #[must_use]
    pub fn with_document_key(mut self, key: impl Into<String>) -> Self {
        self.document_key = key.into();
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn source(&self) -> &FieldSource {
        &self.source
    }

    /// Whether only values in the active language should be returned for this field.
    pub fn language_filter(&self) -> bool {
        self.language_filter
    }

    /// The key under which the framed documents carry the values of this field.
    pub fn document_key(&self) -> &str {
        &self.document_key
    }

    pub fn formatter(&self) -> Formatter {
        self.formatter
    }

    /// Returns the predicate (as written in the configuration) that binds the field variable.
    ///
    /// For pattern fields, this is the predicate of the pattern whose object is the field
    /// variable, if there is such a simple pattern.
    pub fn value_predicate(&self) -> Option<&str> {
        match &self.source {
            FieldSource::Predicate(predicate) => Some(predicate),
            FieldSource::Patterns(patterns) => patterns
                .iter()
                .find_map(|pattern| pattern.predicate_of(&self.variable)),
        }
    }
}

fn validate_connection(
    name: &str,
    variable: &Variable,
    patterns: &[TriplePattern],
) -> Result<(), ConfigError> {
    if patterns.is_empty() {
        return Err(ConfigError::invalid_patterns(name, "no patterns given"));
    }
    if !patterns
        .iter()
        .any(|p| mentions_variable(p.as_str(), ID_VARIABLE))
    {
        return Err(ConfigError::invalid_patterns(
            name,
            format!("no pattern mentions ?{ID_VARIABLE}"),
        ));
    }
    if !patterns.iter().any(|p| p.mentions(variable)) {
        return Err(ConfigError::invalid_patterns(
            name,
            format!("no pattern mentions {variable}"),
        ));
    }
    Ok(())
}

/// Explicit patterns may be given as one string or as a list of strings.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawPatterns {
    Single(String),
    Multiple(Vec<String>),
}

impl RawPatterns {
    fn into_vec(self) -> Vec<String> {
        match self {
            RawPatterns::Single(pattern) => split_patterns(&pattern)
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .map(str::to_owned)
                .collect(),
            RawPatterns::Multiple(patterns) => patterns,
        }
    }
}

/// Splits a block of triple patterns at the dots that terminate a pattern.
///
/// A terminating dot is followed by whitespace or ends the block. Dots inside string literals
/// and IRIs are kept.
fn split_patterns(block: &str) -> Vec<&str> {
    let mut patterns = Vec::new();
    let mut start = 0;
    let mut quote = None;
    let mut in_iri = false;
    let mut escaped = false;
    let mut chars = block.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' if !in_iri => quote = Some(c),
            '<' if !in_iri => in_iri = true,
            '>' if in_iri => in_iri = false,
            '.' if !in_iri && !matches!(chars.peek(), Some((_, next)) if !next.is_whitespace()) => {
                patterns.push(&block[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    patterns.push(&block[start..]);
    patterns
}

/// The serialized form of a [`FieldDefinition`].
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RawFieldDefinition {
    pub name: String,
    pub label: Option<String>,
    pub variable: String,
    pub predicate: Option<String>,
    pub patterns: Option<RawPatterns>,
    #[serde(default)]
    pub filter_language: bool,
    pub key: Option<String>,
    pub formatter: Option<String>,
}

impl RawFieldDefinition {
    pub fn validate(
        self,
        prefixes: &Prefixes,
        formatters: &FormatterRegistry,
    ) -> Result<FieldDefinition, ConfigError> {
        self.validate_keyed(prefixes, prefixes, formatters)
    }

    /// Validates the field. The default document key of a predicate field is its expanded
    /// predicate compacted with `keys`, which must be the prefixes the documents are framed with.
    pub fn validate_keyed(
        self,
        prefixes: &Prefixes,
        keys: &Prefixes,
        formatters: &FormatterRegistry,
    ) -> Result<FieldDefinition, ConfigError> {
        let variable = parse_variable(&self.variable, &self.name)?;
        let field = match (self.predicate, self.patterns) {
            (Some(_), Some(_)) => return Err(ConfigError::AmbiguousField(self.name)),
            (Some(predicate), None) => {
                let key = keys.compact(prefixes.expand(&predicate)?.as_str());
                FieldDefinition::predicate(self.name.as_str(), variable, predicate)
                    .with_document_key(key)
            }
            (None, Some(patterns)) => {
                let patterns = patterns
                    .into_vec()
                    .iter()
                    .map(|p| TriplePattern::parse(p, &self.name))
                    .collect::<Result<Vec<_>, _>>()?;
                FieldDefinition::patterns(self.name.as_str(), variable, patterns)?
            }
            (None, None) => {
                let key = keys.compact(prefixes.expand(&self.name)?.as_str());
                FieldDefinition::predicate(self.name.as_str(), variable, self.name.as_str())
                    .with_document_key(key)
            }
        };

        let formatter = match self.formatter {
            None => Formatter::default(),
            Some(name) => {
                formatters
                    .get(&name)
                    .ok_or_else(|| ConfigError::UnknownFormatter {
                        field: self.name.clone(),
                        formatter: name,
                    })?
            }
        };

        let mut field = field
            .with_language_filter(self.filter_language)
            .with_formatter(formatter);
        if let Some(label) = self.label {
            field = field.with_label(label);
        }
        if let Some(key) = self.key {
            field = field.with_document_key(key);
        }
        Ok(field)
    }
}
