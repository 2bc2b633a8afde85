//! Turns the flat graph of an entity query into nested documents.

use crate::Document;
use serde_json::{Map, Number, Value};
use sparql_facets_model::vocab::{rdf, xsd};
use sparql_facets_model::{Frame, FrameNode, Literal, NamedNode, Subject, Term, Triple};
use std::collections::{HashMap, HashSet};

/// Frames graphs according to a [`Frame`].
///
/// Framing is deterministic: documents are emitted in the order in which their subjects first
/// appear in the graph and values keep the order of their statements.
#[derive(Clone, Debug)]
pub struct Framer<'frame> {
    frame: &'frame Frame,
    language: String,
    language_predicates: HashSet<NamedNode>,
}

/// The statements of a graph, grouped by subject.
struct Nodes<'graph> {
    order: Vec<&'graph Subject>,
    statements: HashMap<&'graph Subject, Vec<(&'graph NamedNode, &'graph Term)>>,
}

impl<'graph> Nodes<'graph> {
    fn new(triples: &'graph [Triple]) -> Self {
        let mut nodes = Self {
            order: Vec::new(),
            statements: HashMap::new(),
        };
        for triple in triples {
            nodes
                .statements
                .entry(&triple.subject)
                .or_insert_with(|| {
                    nodes.order.push(&triple.subject);
                    Vec::new()
                })
                .push((&triple.predicate, &triple.object));
        }
        nodes
    }

    fn types(&self, subject: &Subject) -> Vec<&'graph NamedNode> {
        self.statements
            .get(subject)
            .into_iter()
            .flatten()
            .filter(|(predicate, _)| **predicate == rdf::TYPE)
            .filter_map(|&(_, object)| match object {
                Term::NamedNode(node) => Some(node),
                _ => None,
            })
            .collect()
    }
}

impl<'frame> Framer<'frame> {
    /// Creates a framer for documents in `language`.
    ///
    /// Predicates declared with a language in the frame keep only literals in that language.
    pub fn new(frame: &'frame Frame, language: impl Into<String>) -> Self {
        Self {
            frame,
            language: language.into(),
            language_predicates: HashSet::new(),
        }
    }

    /// Filters the values of `predicates` by the active language. This takes precedence over a
    /// language declared in the frame.
    #[must_use]
    pub fn with_language_predicates(
        mut self,
        predicates: impl IntoIterator<Item = NamedNode>,
    ) -> Self {
        self.language_predicates.extend(predicates);
        self
    }

    /// Frames `triples` into one document per subject that matches the root of the frame.
    pub fn frame(&self, triples: &[Triple]) -> Vec<Document> {
        let nodes = Nodes::new(triples);
        let mut stack = Vec::new();
        nodes
            .order
            .iter()
            .copied()
            .filter(|subject| self.frame.root().matches(nodes.types(subject).into_iter()))
            .map(|subject| {
                Document::new(self.node(&nodes, subject, self.frame.root(), &mut stack))
            })
            .collect()
    }

    fn node<'graph>(
        &self,
        nodes: &Nodes<'graph>,
        subject: &'graph Subject,
        frame: &FrameNode,
        stack: &mut Vec<&'graph Subject>,
    ) -> Map<String, Value> {
        stack.push(subject);
        let mut object = Map::new();
        object.insert("@id".to_owned(), Value::String(subject_id(subject)));

        let types = nodes.types(subject);
        match types.as_slice() {
            [] => {}
            [single] => {
                object.insert("@type".to_owned(), Value::String(self.compact(single)));
            }
            types => {
                object.insert(
                    "@type".to_owned(),
                    Value::Array(
                        types
                            .iter()
                            .map(|t| Value::String(self.compact(t)))
                            .collect(),
                    ),
                );
            }
        }

        let mut properties: Vec<(&NamedNode, Vec<Value>)> = Vec::new();
        for &(predicate, value) in nodes.statements.get(subject).into_iter().flatten() {
            if *predicate == rdf::TYPE || !self.is_in_language(predicate, value) {
                continue;
            }
            let value = self.value(nodes, value, frame.embed_for(predicate), stack);
            match properties.iter_mut().find(|(p, _)| *p == predicate) {
                Some((_, values)) => values.push(value),
                None => properties.push((predicate, vec![value])),
            }
        }
        for (predicate, mut values) in properties {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            object.insert(self.compact(predicate), value);
        }

        stack.pop();
        object
    }

    fn value<'graph>(
        &self,
        nodes: &Nodes<'graph>,
        term: &'graph Term,
        embed: Option<&FrameNode>,
        stack: &mut Vec<&'graph Subject>,
    ) -> Value {
        let (id, subject) = match term {
            Term::Literal(literal) => return self.literal(literal),
            Term::NamedNode(node) => (node.as_str().to_owned(), Subject::from(node.clone())),
            Term::BlankNode(node) => (format!("_:{}", node.as_str()), Subject::from(node.clone())),
            #[allow(unreachable_patterns, reason = "Quoted triples only exist with rdf-star")]
            other => return Value::String(other.to_string()),
        };

        if let Some(embed) = embed {
            if let Some((&subject, _)) = nodes.statements.get_key_value(&subject) {
                if !stack.contains(&subject) && embed.matches(nodes.types(subject).into_iter()) {
                    return Value::Object(self.node(nodes, subject, embed, stack));
                }
            }
        }

        let mut reference = Map::new();
        reference.insert("@id".to_owned(), Value::String(id));
        Value::Object(reference)
    }

    fn literal(&self, literal: &Literal) -> Value {
        let value = literal.value();
        let datatype = literal.datatype();
        if literal.language().is_some() || datatype == xsd::STRING {
            return Value::String(value.to_owned());
        }
        let converted = if is_integer(datatype.as_str()) {
            value
                .parse::<i64>()
                .map(Number::from)
                .ok()
                .or_else(|| value.parse::<u64>().map(Number::from).ok())
                .map(Value::Number)
        } else if datatype == xsd::BOOLEAN {
            match value {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            }
        } else if datatype == xsd::DECIMAL || datatype == xsd::DOUBLE || datatype == xsd::FLOAT {
            value
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
        } else {
            None
        };

        converted.unwrap_or_else(|| {
            let mut typed = Map::new();
            typed.insert("@value".to_owned(), Value::String(value.to_owned()));
            typed.insert(
                "@type".to_owned(),
                Value::String(self.compact(&datatype.into_owned())),
            );
            Value::Object(typed)
        })
    }

    /// Literals of language-filtered predicates must match the language of the predicate.
    fn is_in_language(&self, predicate: &NamedNode, value: &Term) -> bool {
        let range = if self.language_predicates.contains(predicate) {
            self.language.as_str()
        } else if let Some(declared) = self.frame.language_of(predicate) {
            declared
        } else {
            return true;
        };
        match value {
            Term::Literal(literal) => literal
                .language()
                .is_some_and(|tag| language_matches(tag, range)),
            _ => true,
        }
    }

    fn compact(&self, iri: &NamedNode) -> String {
        self.frame.prefixes().compact(iri.as_str())
    }
}

fn subject_id(subject: &Subject) -> String {
    match subject {
        Subject::NamedNode(node) => node.as_str().to_owned(),
        Subject::BlankNode(node) => format!("_:{}", node.as_str()),
        #[allow(unreachable_patterns, reason = "Quoted triples only exist with rdf-star")]
        other => other.to_string(),
    }
}

fn is_integer(datatype: &str) -> bool {
    datatype
        .strip_prefix("http://www.w3.org/2001/XMLSchema#")
        .is_some_and(|local| {
            matches!(
                local,
                "integer"
                    | "int"
                    | "long"
                    | "short"
                    | "byte"
                    | "nonNegativeInteger"
                    | "nonPositiveInteger"
                    | "positiveInteger"
                    | "negativeInteger"
                    | "unsignedLong"
                    | "unsignedInt"
                    | "unsignedShort"
                    | "unsignedByte"
            )
        })
}

/// Basic filtering of `langMatches` (RFC 4647): `*` matches every tag, other ranges match the tag
/// itself and its sub-tags, case-insensitively.
pub fn language_matches(tag: &str, range: &str) -> bool {
    if range == "*" {
        return !tag.is_empty();
    }
    let tag = tag.to_ascii_lowercase();
    let range = range.to_ascii_lowercase();
    tag == range
        || tag
            .strip_prefix(range.as_str())
            .is_some_and(|rest| rest.starts_with('-'))
}
