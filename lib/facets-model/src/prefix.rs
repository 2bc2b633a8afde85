use crate::ConfigError;
use oxiri::Iri;
use oxrdf::vocab::rdf;
use oxrdf::NamedNode;
use std::collections::BTreeMap;

/// Namespace prefixes shared by the generated queries and the framed documents.
///
/// Prefixes are kept sorted such that the rendered `PREFIX` declarations are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Prefixes {
    namespaces: BTreeMap<String, String>,
}

impl Prefixes {
    /// Creates an empty set of prefixes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `prefix` as an abbreviation of `namespace`.
    pub fn insert(
        &mut self,
        prefix: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let namespace = namespace.into();
        if let Err(error) = Iri::parse(namespace.as_str()) {
            return Err(ConfigError::InvalidIri {
                iri: namespace,
                error,
            });
        }
        self.namespaces.insert(prefix.into(), namespace);
        Ok(())
    }

    /// Adds all declarations of `other`. Declarations of `other` win on conflicts.
    pub fn extend(&mut self, other: &Prefixes) {
        for (prefix, namespace) in other.iter() {
            self.namespaces
                .insert(prefix.to_owned(), namespace.to_owned());
        }
    }

    /// Returns the namespace of `prefix`.
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Iterates over all `(prefix, namespace)` pairs, ordered by prefix.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.namespaces
            .iter()
            .map(|(prefix, namespace)| (prefix.as_str(), namespace.as_str()))
    }

    /// Expands a SPARQL-style IRI reference into a [`NamedNode`].
    ///
    /// Supported are the keyword `a`, full IRIs in angle brackets, compact IRIs using a declared
    /// prefix, and absolute IRIs without brackets (e.g., `http://example.com/x`).
    pub fn expand(&self, value: &str) -> Result<NamedNode, ConfigError> {
        let value = value.trim();
        if value == "a" {
            return Ok(rdf::TYPE.into_owned());
        }
        if let Some(iri) = value.strip_prefix('<').and_then(|v| v.strip_suffix('>')) {
            return parse_named_node(iri);
        }

        let Some((prefix, local)) = value.split_once(':') else {
            return Err(ConfigError::UnknownPrefix(value.to_owned()));
        };
        match self.namespaces.get(prefix) {
            Some(namespace) => parse_named_node(&format!("{namespace}{local}")),
            None if local.starts_with("//") => parse_named_node(value),
            None => Err(ConfigError::UnknownPrefix(value.to_owned())),
        }
    }

    /// Compacts `iri` using the longest matching namespace. IRIs without a matching namespace are
    /// returned unchanged.
    pub fn compact(&self, iri: &str) -> String {
        self.namespaces
            .iter()
            .filter(|(_, namespace)| iri.len() > namespace.len() && iri.starts_with(*namespace))
            .max_by_key(|(_, namespace)| namespace.len())
            .map_or_else(
                || iri.to_owned(),
                |(prefix, namespace)| format!("{prefix}:{}", &iri[namespace.len()..]),
            )
    }
}

fn parse_named_node(iri: &str) -> Result<NamedNode, ConfigError> {
    NamedNode::new(iri).map_err(|error| ConfigError::InvalidIri {
        iri: iri.to_owned(),
        error,
    })
}
