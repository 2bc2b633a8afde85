//! JSON-LD style frames that describe how a flat RDF graph is nested into documents.
//!
//! Only the subset of JSON-LD framing that is needed for search documents is supported:
//!
//! ```json
//! {
//!   "@context": {
//!     "bf": "http://id.loc.gov/ontologies/bibframe/",
//!     "skos:prefLabel": {"@language": "en"}
//!   },
//!   "@type": "bf:Instance",
//!   "bf:instanceOf": {
//!     "@type": "bf:Work",
//!     "bf:subject": {}
//!   }
//! }
//! ```
//!
//! Keys that are not keywords introduce embedding rules: objects of the given predicate that match
//! the nested frame are inlined. A nested frame without `@type` matches any node.

use crate::{ConfigError, Prefixes};
use oxrdf::NamedNode;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A frame for the documents of one entity class.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    prefixes: Prefixes,
    languages: HashMap<NamedNode, String>,
    root: FrameNode,
}

/// One level of a [`Frame`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameNode {
    types: Vec<NamedNode>,
    embeds: Vec<(NamedNode, FrameNode)>,
}

impl Frame {
    /// Creates a frame that selects all nodes of `root_type` without embedding anything.
    pub fn new(root_type: NamedNode, prefixes: Prefixes) -> Self {
        Self {
            prefixes,
            languages: HashMap::new(),
            root: FrameNode::typed(vec![root_type]),
        }
    }

    /// Parses a JSON-LD frame.
    ///
    /// The `@context` of the frame is resolved on top of `prefixes`. If the frame has no `@type`,
    /// `default_type` is used for the root.
    pub fn from_json(
        frame: &Value,
        prefixes: &Prefixes,
        default_type: &NamedNode,
    ) -> Result<Self, ConfigError> {
        let Value::Object(frame) = frame else {
            return Err(ConfigError::InvalidFrame(
                "the frame must be a JSON object".to_owned(),
            ));
        };

        let mut result = Self::new(default_type.clone(), prefixes.clone());
        if let Some(context) = frame.get("@context") {
            result.parse_context(context)?;
        }
        result.root = FrameNode::parse(frame, &result.prefixes)?;
        if result.root.types.is_empty() {
            result.root.types.push(default_type.clone());
        }
        Ok(result)
    }

    /// Restricts the values of `predicate` to the given language.
    #[must_use]
    pub fn with_language(mut self, predicate: NamedNode, language: impl Into<String>) -> Self {
        self.languages.insert(predicate, language.into());
        self
    }

    #[must_use]
    pub fn with_root(mut self, root: FrameNode) -> Self {
        self.root = root;
        self
    }

    /// The prefixes used to compact the keys of the framed documents.
    pub fn prefixes(&self) -> &Prefixes {
        &self.prefixes
    }

    pub fn root(&self) -> &FrameNode {
        &self.root
    }

    /// Returns the language that the context of the frame declares for `predicate`.
    pub fn language_of(&self, predicate: &NamedNode) -> Option<&str> {
        self.languages.get(predicate).map(String::as_str)
    }

    fn parse_context(&mut self, context: &Value) -> Result<(), ConfigError> {
        let contexts: Vec<&Value> = match context {
            Value::Array(contexts) => contexts.iter().collect(),
            other => vec![other],
        };
        for context in contexts {
            let Value::Object(context) = context else {
                return Err(ConfigError::InvalidFrame(
                    "remote contexts are not supported".to_owned(),
                ));
            };

            // Namespaces first, such that term definitions can use them regardless of their
            // position in the context.
            for (term, definition) in context {
                if let Value::String(namespace) = definition {
                    if !term.starts_with('@') {
                        self.prefixes.insert(term.as_str(), namespace.as_str())?;
                    }
                }
            }
            for (term, definition) in context {
                let Value::Object(definition) = definition else {
                    continue;
                };
                let Some(language) = definition.get("@language").and_then(Value::as_str) else {
                    continue;
                };
                let predicate = match definition.get("@id").and_then(Value::as_str) {
                    Some(id) => self.prefixes.expand(id)?,
                    None => self.prefixes.expand(term)?,
                };
                self.languages.insert(predicate, language.to_owned());
            }
        }
        Ok(())
    }
}

impl FrameNode {
    /// A frame node that matches nodes with one of the given types.
    pub fn typed(types: Vec<NamedNode>) -> Self {
        Self {
            types,
            embeds: Vec::new(),
        }
    }

    /// Inlines objects of `predicate` that match `node`.
    #[must_use]
    pub fn with_embed(mut self, predicate: NamedNode, node: FrameNode) -> Self {
        self.embeds.push((predicate, node));
        self
    }

    pub fn types(&self) -> &[NamedNode] {
        &self.types
    }

    /// Returns the nested frame for objects of `predicate`.
    pub fn embed_for(&self, predicate: &NamedNode) -> Option<&FrameNode> {
        self.embeds
            .iter()
            .find(|(p, _)| p == predicate)
            .map(|(_, node)| node)
    }

    /// Returns whether a node with the given types matches this frame node.
    pub fn matches<'a>(&self, mut types: impl Iterator<Item = &'a NamedNode>) -> bool {
        self.types.is_empty() || types.any(|t| self.types.contains(t))
    }

    fn parse(frame: &Map<String, Value>, prefixes: &Prefixes) -> Result<Self, ConfigError> {
        let mut node = FrameNode::default();
        for (key, value) in frame {
            match key.as_str() {
                "@type" => node.types = parse_types(value, prefixes)?,
                keyword if keyword.starts_with('@') => {}
                predicate => {
                    let nested = match value {
                        Value::Object(nested) => nested,
                        Value::Array(values) => match values.as_slice() {
                            [Value::Object(nested)] => nested,
                            _ => {
                                return Err(ConfigError::InvalidFrame(format!(
                                    "the value of '{predicate}' must be a single frame object"
                                )))
                            }
                        },
                        _ => {
                            return Err(ConfigError::InvalidFrame(format!(
                                "the value of '{predicate}' must be a frame object"
                            )))
                        }
                    };
                    node.embeds.push((
                        prefixes.expand(predicate)?,
                        FrameNode::parse(nested, prefixes)?,
                    ));
                }
            }
        }
        Ok(node)
    }
}

fn parse_types(value: &Value, prefixes: &Prefixes) -> Result<Vec<NamedNode>, ConfigError> {
    match value {
        Value::String(t) => Ok(vec![prefixes.expand(t)?]),
        Value::Array(types) => types
            .iter()
            .map(|t| {
                t.as_str()
                    .ok_or_else(|| ConfigError::InvalidFrame("@type must be a string".to_owned()))
                    .and_then(|t| prefixes.expand(t))
            })
            .collect(),
        _ => Err(ConfigError::InvalidFrame(
            "@type must be a string or an array of strings".to_owned(),
        )),
    }
}
