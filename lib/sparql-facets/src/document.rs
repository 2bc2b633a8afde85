use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sparql_facets_model::FieldDefinition;

/// A framed entity.
///
/// Keys are compact IRIs (or the keywords `@id` and `@type`) in the order produced by the framer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new(properties: Map<String, Value>) -> Self {
        Self(properties)
    }

    /// The IRI (or blank node id) of the entity.
    pub fn id(&self) -> Option<&str> {
        self.0.get("@id").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// All values of `key`. Arrays are flattened.
    pub fn values(&self, key: &str) -> Vec<&Value> {
        match self.0.get(key) {
            None => Vec::new(),
            Some(Value::Array(values)) => values.iter().collect(),
            Some(value) => vec![value],
        }
    }

    /// Renders the values of `field` with its formatter. Returns `None` if the document has no
    /// value for the field.
    pub fn render(&self, field: &FieldDefinition) -> Option<String> {
        let values = self.values(field.document_key());
        if values.is_empty() {
            return None;
        }
        Some(field.formatter().format(&values))
    }

    /// Renders `fields` into an object that maps the field labels to the rendered values, in the
    /// order of `fields`. Fields without a value are left out.
    pub fn render_fields<'field>(
        &self,
        fields: impl IntoIterator<Item = &'field FieldDefinition>,
    ) -> Map<String, Value> {
        fields
            .into_iter()
            .filter_map(|field| {
                let rendered = self.render(field)?;
                Some((field.label().to_owned(), Value::String(rendered)))
            })
            .collect()
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Value::Object(document.0)
    }
}
