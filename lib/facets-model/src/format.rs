use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Renders the values of a document field into a human-readable string.
pub type FormatFn = fn(&[&Value]) -> String;

/// Keys that are used as the label of a nested entity by [`labels`].
const LABEL_KEYS: [&str; 4] = [
    "rdfs:label",
    "skos:prefLabel",
    "mads:authoritativeLabel",
    "schema:name",
];

/// A named [`FormatFn`], resolved when the configuration is loaded.
#[derive(Clone, Copy)]
pub struct Formatter {
    name: &'static str,
    format: FormatFn,
}

impl Formatter {
    pub const fn new(name: &'static str, format: FormatFn) -> Self {
        Self { name, format }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn format(&self, values: &[&Value]) -> String {
        (self.format)(values)
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new("join", join)
    }
}

impl PartialEq for Formatter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Formatter").field(&self.name).finish()
    }
}

/// Maps formatter names, as used in the configuration, to formatters.
#[derive(Clone, Debug)]
pub struct FormatterRegistry {
    formatters: HashMap<&'static str, Formatter>,
}

impl FormatterRegistry {
    /// A registry with the built-in formatters `join` and `labels`.
    pub fn builtin() -> Self {
        let mut registry = Self {
            formatters: HashMap::new(),
        };
        registry.register("join", join);
        registry.register("labels", labels);
        registry
    }

    pub fn register(&mut self, name: &'static str, format: FormatFn) {
        self.formatters.insert(name, Formatter::new(name, format));
    }

    pub fn get(&self, name: &str) -> Option<Formatter> {
        self.formatters.get(name).copied()
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Joins all scalar values with `"; "`. Nested entities are represented by their `@id`.
pub fn join(values: &[&Value]) -> String {
    values
        .iter()
        .filter_map(|value| scalar_text(value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Joins the labels of nested entities with `"; "`, skipping duplicates.
pub fn labels(values: &[&Value]) -> String {
    let mut result: Vec<String> = Vec::new();
    for value in values {
        let label = match value {
            Value::Object(object) if !object.contains_key("@value") => LABEL_KEYS
                .iter()
                .find_map(|key| object.get(*key))
                .and_then(first_text),
            _ => scalar_text(value),
        };
        if let Some(label) = label {
            if !result.contains(&label) {
                result.push(label);
            }
        }
    }
    result.join("; ")
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(values) => values.iter().find_map(scalar_text),
        _ => scalar_text(value),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        Value::Object(object) => object
            .get("@value")
            .or_else(|| object.get("@id"))
            .and_then(scalar_text),
        Value::Array(_) | Value::Null => None,
    }
}
